//! Shared reconciliation machinery.
//!
//! Every resource kind pushes through the same sequence: run the creation
//! batch, then the update batch, then the deletion batch. Tasks within a
//! batch run concurrently on the cooperative runtime; batches never overlap.
//! The planner guarantees the batches touch disjoint keys, so ordering
//! between batches is only about safety of partial failure: creations and
//! updates land before anything is deleted.

use std::future::Future;

use tokio::task::JoinSet;
use tracing::debug;

use crate::error::SyncError;

/// Fields that never round-trip through local files: server-assigned
/// identity, plus the handle which the file path already encodes.
pub const BASE_IGNORE_FIELDS: &[&str] = &["id", "handle", "shop_id", "admin_graphql_api_id"];

/// [`BASE_IGNORE_FIELDS`] plus the server-managed timestamps, for comparing
/// page and article documents across the two sides.
pub const VOLATILE_IGNORE_FIELDS: &[&str] = &[
    "id",
    "handle",
    "shop_id",
    "admin_graphql_api_id",
    "published_at",
    "created_at",
    "updated_at",
    "deleted_at",
];

/// Run one batch of tasks concurrently; each yields the key it handled.
///
/// Fail-stop: the first task error returns immediately, and dropping the set
/// aborts the tasks still in flight. Completed keys come back sorted so
/// outcomes are deterministic regardless of completion order.
pub async fn run_batch<F>(tasks: Vec<F>) -> Result<Vec<String>, SyncError>
where
    F: Future<Output = Result<String, SyncError>> + Send + 'static,
{
    let mut set = JoinSet::new();
    for task in tasks {
        set.spawn(task);
    }
    let mut done = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        done.push(joined??);
    }
    done.sort();
    debug!(completed = done.len(), "batch done");
    Ok(done)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn batch_returns_sorted_keys() {
        let tasks: Vec<_> = ["c", "a", "b"]
            .into_iter()
            .map(|key| {
                let key = key.to_owned();
                async move { Ok(key) }
            })
            .collect();
        let done = run_batch(tasks).await.expect("batch");
        assert_eq!(done, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn empty_batch_is_fine() {
        let tasks: Vec<std::future::Ready<Result<String, SyncError>>> = Vec::new();
        let done = run_batch(tasks).await.expect("batch");
        assert!(done.is_empty());
    }

    #[tokio::test]
    async fn first_error_stops_the_batch() {
        type BatchFuture = std::pin::Pin<Box<dyn Future<Output = Result<String, SyncError>> + Send>>;
        let ok = async { Ok("ok".to_owned()) };
        let err = async { Err(SyncError::ThemeNotFound { name: None }) };
        let result = run_batch(vec![Box::pin(ok) as BatchFuture, Box::pin(err)]).await;
        assert!(result.is_err());
    }
}
