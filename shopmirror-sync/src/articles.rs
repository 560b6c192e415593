//! Blog article sync.
//!
//! Articles follow the page layout one level down: the files for blog
//! `news` live under `blogs/news/` and `blogs/news/drafts/`. Blogs
//! themselves are not managed — a local blog directory with no matching
//! remote blog is skipped on push, and blogs are processed one at a time.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use shopmirror_remote::{Blog, ShopClient};
use tracing::{debug, info, warn};

use crate::content::{self, LocalDoc};
use crate::engine::run_batch;
use crate::error::SyncError;
use crate::plan::{PullOutcome, PushOutcome, SyncPlan};

pub const BLOGS_DIR: &str = "blogs";

/// Names of the immediate subdirectories of `blogs/`.
fn local_blog_dirs(base_dir: &Path) -> Result<Vec<String>, SyncError> {
    let root = base_dir.join(BLOGS_DIR);
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(&root)
        .map_err(|err| shopmirror_core::CoreError::Io {
            path: root.clone(),
            source: err,
        })?;
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| shopmirror_core::CoreError::Io {
            path: root.clone(),
            source: err,
        })?;
        if entry.path().is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                dirs.push(name.to_owned());
            }
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Mirror every remote blog's articles into the local tree, one blog at a
/// time. Articles of blogs that no longer exist remotely are removed.
pub async fn pull(
    client: &dyn ShopClient,
    base_dir: &Path,
    force: bool,
    dry_run: bool,
) -> Result<PullOutcome, SyncError> {
    let blogs = client.list_blogs().await?;
    let mut outcome = PullOutcome::default();
    let mut seen_blogs = Vec::new();

    for blog in &blogs {
        seen_blogs.push(blog.handle.clone());
        let dir = format!("{BLOGS_DIR}/{}", blog.handle);
        let local = content::load_docs(base_dir, &dir)?;
        let articles = client.list_articles(blog.id).await?;
        let mut remote_handles = Vec::new();

        for article in articles {
            let published = article.published_at.is_some();
            let handle = article.handle.clone();
            let doc = serde_json::to_value(&article)?;
            remote_handles.push(handle.clone());

            if !force {
                if let Some(existing) = local.get(&handle) {
                    if content::is_same_content(existing, &doc) {
                        outcome
                            .skipped
                            .push(content::doc_path(&dir, &handle, existing.draft));
                        continue;
                    }
                }
            }
            if dry_run {
                info!(blog = %blog.handle, %handle, "would write article");
                outcome
                    .written
                    .push(content::doc_path(&dir, &handle, !published));
                continue;
            }
            let written = content::write_doc(base_dir, &dir, &handle, published, &doc)?;
            info!(blog = %blog.handle, %handle, published, "wrote article");
            outcome.written.extend(written);
        }

        for handle in local.keys() {
            if !remote_handles.contains(handle) {
                let removed = content::delete_doc(base_dir, &dir, handle, dry_run)?;
                info!(blog = %blog.handle, %handle, dry_run, "article gone remotely, deleting local copy");
                outcome.deleted.extend(removed);
            }
        }
    }

    // Whole blogs that vanished remotely.
    for dir_name in local_blog_dirs(base_dir)? {
        if seen_blogs.contains(&dir_name) {
            continue;
        }
        let dir = format!("{BLOGS_DIR}/{dir_name}");
        let leftovers = content::load_docs(base_dir, &dir)?;
        for handle in leftovers.keys() {
            let removed = content::delete_doc(base_dir, &dir, handle, dry_run)?;
            info!(blog = %dir_name, %handle, dry_run, "blog gone remotely, deleting local article");
            outcome.deleted.extend(removed);
        }
    }
    Ok(outcome)
}

fn plan_blog_push(
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

async fn push_blog(
    client: &Arc<dyn ShopClient>,
    base_dir: &Path,
    blog: &Blog,
    dry_run: bool,
) -> Result<PushOutcome, SyncError> {
    let dir = format!("{BLOGS_DIR}/{}", blog.handle);
    let local = content::load_docs(base_dir, &dir)?;
    let mut remote = BTreeMap::new();
    for article in client.list_articles(blog.id).await? {
        let id = article.id;
        let handle = article.handle.clone();
        remote.insert(handle, (id, serde_json::to_value(&article)?));
    }
    let plan = plan_blog_push(&local, &remote);
    let label = |handle: &str| format!("{dir}/{handle}");

    let mut outcome = PushOutcome::default();
    if dry_run {
        for (handle, _) in &plan.creations {
            info!(blog = %blog.handle, %handle, "would create article");
        }
        for (handle, ..) in &plan.updates {
            info!(blog = %blog.handle, %handle, "would update article");
        }
        for (handle, _) in &plan.deletions {
            info!(blog = %blog.handle, %handle, "would delete article");
        }
        outcome.created = plan.creations.iter().map(|(k, _)| label(k)).collect();
        outcome.updated = plan.updates.iter().map(|(k, ..)| label(k)).collect();
        outcome.deleted = plan.deletions.iter().map(|(k, _)| label(k)).collect();
        return Ok(outcome);
    }

    let blog_id = blog.id;
    let creates = plan
        .creations
        .into_iter()
        .map(|(handle, payload)| {
            let client = Arc::clone(client);
            let label = label(&handle);
            async move {
                client.create_article(blog_id, &payload).await?;
                info!(%handle, "created article");
                Ok(label)
            }
        })
        .collect();
    outcome.created = run_batch(creates).await?;

    let updates = plan
        .updates
        .into_iter()
        .map(|(handle, id, payload)| {
            let client = Arc::clone(client);
            let label = label(&handle);
            async move {
                client.update_article(blog_id, id, &payload).await?;
                info!(%handle, "updated article");
                Ok(label)
            }
        })
        .collect();
    outcome.updated = run_batch(updates).await?;

    let deletes = plan
        .deletions
        .into_iter()
        .map(|(handle, id)| {
            let client = Arc::clone(client);
            let label = label(&handle);
            async move {
                client.delete_article(blog_id, id).await?;
                info!(%handle, "deleted article");
                Ok(label)
            }
        })
        .collect();
    outcome.deleted = run_batch(deletes).await?;
    Ok(outcome)
}

/// Push every local blog directory that has a matching remote blog.
pub async fn push(
    client: &Arc<dyn ShopClient>,
    base_dir: &Path,
    dry_run: bool,
) -> Result<PushOutcome, SyncError> {
    let blogs = client.list_blogs().await?;
    let mut outcome = PushOutcome::default();
    for dir_name in local_blog_dirs(base_dir)? {
        let Some(blog) = blogs.iter().find(|blog| blog.handle == dir_name) else {
            warn!(blog = %dir_name, "no remote blog with this handle, skipping");
            continue;
        };
        let one = push_blog(client, base_dir, blog, dry_run).await?;
        outcome.created.extend(one.created);
        outcome.updated.extend(one.updated);
        outcome.deleted.extend(one.deleted);
    }
    Ok(outcome)
}
