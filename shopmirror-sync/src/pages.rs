//! Page sync.
//!
//! Pages live under `pages/` (published) and `pages/drafts/` (unpublished),
//! one JSON-plus-HTML pair per handle. The remote collection is keyed by
//! handle; ids never appear in the files.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use shopmirror_remote::ShopClient;
use tracing::{debug, info};

use crate::content::{self, LocalDoc};
use crate::engine::run_batch;
use crate::error::SyncError;
use crate::plan::{PullOutcome, PushOutcome, SyncPlan};

pub const PAGES_DIR: &str = "pages";

/// Mirror the remote pages into the local tree.
pub async fn pull(
    client: &dyn ShopClient,
    base_dir: &Path,
    force: bool,
    dry_run: bool,
) -> Result<PullOutcome, SyncError> {
    let remote = client.list_pages().await?;
    let local = content::load_docs(base_dir, PAGES_DIR)?;
    let mut outcome = PullOutcome::default();
    let mut remote_handles = Vec::new();

    for page in remote {
        let published = page.published_at.is_some();
        let handle = page.handle.clone();
        let doc = serde_json::to_value(&page)?;
        remote_handles.push(handle.clone());

        if !force {
            if let Some(existing) = local.get(&handle) {
                if content::is_same_content(existing, &doc) {
                    outcome
                        .skipped
                        .push(content::doc_path(PAGES_DIR, &handle, existing.draft));
                    continue;
                }
            }
        }
        if dry_run {
            info!(%handle, "would write page");
            outcome
                .written
                .push(content::doc_path(PAGES_DIR, &handle, !published));
            continue;
        }
        let written = content::write_doc(base_dir, PAGES_DIR, &handle, published, &doc)?;
        info!(%handle, published, "wrote page");
        outcome.written.extend(written);
    }

    for handle in local.keys() {
        if !remote_handles.contains(handle) {
            let removed = content::delete_doc(base_dir, PAGES_DIR, handle, dry_run)?;
            info!(%handle, dry_run, "page gone remotely, deleting local copy");
            outcome.deleted.extend(removed);
        }
    }
    Ok(outcome)
}

fn plan_push(
    local: &BTreeMap<String, LocalDoc>,
    remote: &BTreeMap<String, (u64, Value)>,
) -> SyncPlan<Value> {
    let mut plan = SyncPlan::default();
    for (handle, item) in local {
        match remote.get(handle) {
            None => plan.creations.push((handle.clone(), content::push_payload(item))),
            Some((id, doc)) if !content::is_same_content(item, doc) => {
                plan.updates.push((handle.clone(), *id, content::push_payload(item)));
            }
            Some(_) => debug!(%handle, "unchanged"),
        }
    }
    for (handle, (id, _)) in remote {
        if !local.contains_key(handle) {
            plan.deletions.push((handle.clone(), *id));
        }
    }
    plan
}

/// Make the remote pages mirror the local tree.
pub async fn push(
    client: &Arc<dyn ShopClient>,
    base_dir: &Path,
    dry_run: bool,
) -> Result<PushOutcome, SyncError> {
    let local = content::load_docs(base_dir, PAGES_DIR)?;
    let mut remote = BTreeMap::new();
    for page in client.list_pages().await? {
        let id = page.id;
        let handle = page.handle.clone();
        remote.insert(handle, (id, serde_json::to_value(&page)?));
    }
    let plan = plan_push(&local, &remote);

    let mut outcome = PushOutcome::default();
    if dry_run {
        for (handle, _) in &plan.creations {
            info!(%handle, "would create page");
        }
        for (handle, ..) in &plan.updates {
            info!(%handle, "would update page");
        }
        for (handle, _) in &plan.deletions {
            info!(%handle, "would delete page");
        }
        outcome.created = plan.creations.into_iter().map(|(k, _)| k).collect();
        outcome.updated = plan.updates.into_iter().map(|(k, ..)| k).collect();
        outcome.deleted = plan.deletions.into_iter().map(|(k, _)| k).collect();
        return Ok(outcome);
    }

    let creates = plan
        .creations
        .into_iter()
        .map(|(handle, payload)| {
            let client = Arc::clone(client);
            async move {
                client.create_page(&payload).await?;
                info!(%handle, "created page");
                Ok(handle)
            }
        })
        .collect();
    outcome.created = run_batch(creates).await?;

    let updates = plan
        .updates
        .into_iter()
        .map(|(handle, id, payload)| {
            let client = Arc::clone(client);
            async move {
                client.update_page(id, &payload).await?;
                info!(%handle, "updated page");
                Ok(handle)
            }
        })
        .collect();
    outcome.updated = run_batch(updates).await?;

    let deletes = plan
        .deletions
        .into_iter()
        .map(|(handle, id)| {
            let client = Arc::clone(client);
            async move {
                client.delete_page(id).await?;
                info!(%handle, "deleted page");
                Ok(handle)
            }
        })
        .collect();
    outcome.deleted = run_batch(deletes).await?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn local(handle: &str, draft: bool, doc: Value) -> (String, LocalDoc) {
        (
            handle.to_owned(),
            LocalDoc {
                handle: handle.to_owned(),
                draft,
                doc,
            },
        )
    }

    #[test]
    fn plan_keys_are_disjoint() {
        let local: BTreeMap<_, _> = [
            local("same", false, json!({"title": "Same", "body_html": "x"})),
            local("changed", false, json!({"title": "New title", "body_html": "x"})),
            local("fresh", true, json!({"title": "Fresh"})),
        ]
        .into_iter()
        .collect();
        let remote: BTreeMap<_, _> = [
            (
                "same".to_owned(),
                (1, json!({"id": 1, "handle": "same", "title": "Same", "body_html": "x",
                           "published_at": "2024-01-01T00:00:00Z"})),
            ),
            (
                "changed".to_owned(),
                (2, json!({"id": 2, "handle": "changed", "title": "Old title", "body_html": "x",
                           "published_at": "2024-01-01T00:00:00Z"})),
            ),
            (
                "stale".to_owned(),
                (3, json!({"id": 3, "handle": "stale", "title": "Stale"})),
            ),
        ]
        .into_iter()
        .collect();

        let plan = plan_push(&local, &remote);
        let created: Vec<&str> = plan.creations.iter().map(|(k, _)| k.as_str()).collect();
        let updated: Vec<&str> = plan.updates.iter().map(|(k, ..)| k.as_str()).collect();
        let deleted: Vec<&str> = plan.deletions.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(created, ["fresh"]);
        assert_eq!(updated, ["changed"]);
        assert_eq!(deleted, ["stale"]);
    }

    #[test]
    fn unpublishing_counts_as_an_update() {
        // Identical fields, but the local copy moved into drafts.
        let local: BTreeMap<_, _> =
            [local("about", true, json!({"title": "About", "body_html": "x"}))]
                .into_iter()
                .collect();
        let remote: BTreeMap<_, _> = [(
            "about".to_owned(),
            (1, json!({"id": 1, "handle": "about", "title": "About", "body_html": "x",
                       "published_at": "2024-01-01T00:00:00Z"})),
        )]
        .into_iter()
        .collect();

        let plan = plan_push(&local, &remote);
        assert_eq!(plan.updates.len(), 1);
        let (_, _, payload) = &plan.updates[0];
        assert_eq!(payload["published"], json!(false));
        assert!(payload.get("published_at").is_none());
    }
}
