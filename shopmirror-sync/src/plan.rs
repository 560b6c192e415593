//! Plans and outcomes.
//!
//! A push is computed in full before anything is sent: the planner splits the
//! key space into three disjoint sets (local-only, both-but-different,
//! remote-only), so no key can appear in more than one batch of the same run.

/// What a push intends to do to one remote collection.
///
/// `T` is the payload needed to perform the write (a document, file content,
/// a CSV row's fields).
#[derive(Debug)]
pub struct SyncPlan<T> {
    /// Keys present locally but not remotely: `(key, payload)`.
    pub creations: Vec<(String, T)>,
    /// Keys present on both sides with differing content:
    /// `(key, remote id, payload)`.
    pub updates: Vec<(String, u64, T)>,
    /// Keys present remotely but not locally: `(key, remote id)`.
    pub deletions: Vec<(String, u64)>,
}

impl<T> Default for SyncPlan<T> {
    fn default() -> Self {
        Self {
            creations: Vec::new(),
            updates: Vec::new(),
            deletions: Vec::new(),
        }
    }
}

impl<T> SyncPlan<T> {
    pub fn is_empty(&self) -> bool {
        self.creations.is_empty() && self.updates.is_empty() && self.deletions.is_empty()
    }
}

/// What a pull did (or, under dry-run, would do) to the local tree.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PullOutcome {
    /// Files written because they were missing or differed.
    pub written: Vec<String>,
    /// Files left alone because the fingerprint matched.
    pub skipped: Vec<String>,
    /// Local files removed because the remote no longer has them.
    pub deleted: Vec<String>,
}

impl PullOutcome {
    pub fn changed(&self) -> usize {
        self.written.len() + self.deleted.len()
    }
}

/// What a push did (or, under dry-run, would do) to the remote.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PushOutcome {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
}

impl PushOutcome {
    pub fn changed(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }
}
