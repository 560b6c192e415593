//! URL redirect sync.
//!
//! The whole redirect collection maps onto one file, `redirects.csv`, with a
//! fixed header and one `from,to` row per redirect. Rows are keyed by the
//! source path, which always starts with `/` — that doubles as the row
//! filter, so the header and blank lines fall out of parsing naturally.

use std::path::Path;
use std::sync::Arc;

use shopmirror_core::{files, fingerprint};
use shopmirror_remote::{Redirect, ShopClient};
use tracing::{debug, info};

use crate::engine::run_batch;
use crate::error::SyncError;
use crate::plan::{PullOutcome, PushOutcome, SyncPlan};

pub const REDIRECTS_FILE: &str = "redirects.csv";
const HEADER: &str = "Redirect from,Redirect to";

fn render_csv(redirects: &[Redirect]) -> String {
    let mut rows: Vec<(&str, &str)> = redirects
        .iter()
        .map(|r| (r.path.as_str(), r.target.as_str()))
        .collect();
    rows.sort();
    let mut out = String::with_capacity(rows.len() * 32 + HEADER.len() + 1);
    out.push_str(HEADER);
    out.push('\n');
    for (path, target) in rows {
        out.push_str(path);
        out.push(',');
        out.push_str(target);
        out.push('\n');
    }
    out
}

/// Parse `(path, target)` rows. Anything not starting with `/` (the header
/// included) is skipped.
fn parse_csv(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if !line.starts_with('/') {
                return None;
            }
            let (path, target) = line.split_once(',')?;
            Some((path.trim().to_owned(), target.trim().to_owned()))
        })
        .collect()
}

/// Rewrite `redirects.csv` from the remote collection. The file is only
/// touched when its checksum differs from the fresh rendering.
pub async fn pull(
    client: &dyn ShopClient,
    base_dir: &Path,
    force: bool,
    dry_run: bool,
) -> Result<PullOutcome, SyncError> {
    let rendered = render_csv(&client.list_redirects().await?);
    let path = base_dir.join(REDIRECTS_FILE);
    let mut outcome = PullOutcome::default();

    let current = fingerprint::md5_file(&path)?;
    if !force && current.as_deref() == Some(fingerprint::md5_hex(rendered.as_bytes()).as_str()) {
        outcome.skipped.push(REDIRECTS_FILE.to_owned());
        return Ok(outcome);
    }
    if dry_run {
        info!(file = REDIRECTS_FILE, "would write");
    } else {
        files::save_file(&path, rendered.as_bytes())?;
        info!(file = REDIRECTS_FILE, "wrote");
    }
    outcome.written.push(REDIRECTS_FILE.to_owned());
    Ok(outcome)
}

fn plan_push(local: Vec<(String, String)>, remote: &[Redirect]) -> SyncPlan<String> {
    let mut plan = SyncPlan::default();
    for (path, target) in &local {
        match remote.iter().find(|r| r.path == *path) {
            None => plan.creations.push((path.clone(), target.clone())),
            Some(existing) if existing.target != *target => {
                plan.updates.push((path.clone(), existing.id, target.clone()));
            }
            Some(_) => debug!(%path, "unchanged"),
        }
    }
    for existing in remote {
        if !local.iter().any(|(path, _)| *path == existing.path) {
            plan.deletions.push((existing.path.clone(), existing.id));
        }
    }
    plan
}

/// Make the remote redirect collection mirror `redirects.csv`. A missing
/// file means "not managed locally" and pushes nothing.
pub async fn push(
    client: &Arc<dyn ShopClient>,
    base_dir: &Path,
    dry_run: bool,
) -> Result<PushOutcome, SyncError> {
    let Some(text) = files::read_file_text(&base_dir.join(REDIRECTS_FILE))? else {
        debug!(file = REDIRECTS_FILE, "absent, nothing to push");
        return Ok(PushOutcome::default());
    };
    let remote = client.list_redirects().await?;
    let plan = plan_push(parse_csv(&text), &remote);

    let mut outcome = PushOutcome::default();
    if dry_run {
        for (path, _) in &plan.creations {
            info!(%path, "would create");
        }
        for (path, ..) in &plan.updates {
            info!(%path, "would update");
        }
        for (path, _) in &plan.deletions {
            info!(%path, "would delete");
        }
        outcome.created = plan.creations.into_iter().map(|(k, _)| k).collect();
        outcome.updated = plan.updates.into_iter().map(|(k, ..)| k).collect();
        outcome.deleted = plan.deletions.into_iter().map(|(k, _)| k).collect();
        return Ok(outcome);
    }

    let creates = plan
        .creations
        .into_iter()
        .map(|(path, target)| {
            let client = Arc::clone(client);
            async move {
                client.create_redirect(&path, &target).await?;
                info!(%path, "created");
                Ok(path)
            }
        })
        .collect();
    outcome.created = run_batch(creates).await?;

    let updates = plan
        .updates
        .into_iter()
        .map(|(path, id, target)| {
            let client = Arc::clone(client);
            async move {
                client.update_redirect(id, &path, &target).await?;
                info!(%path, "updated");
                Ok(path)
            }
        })
        .collect();
    outcome.updated = run_batch(updates).await?;

    let deletes = plan
        .deletions
        .into_iter()
        .map(|(path, id)| {
            let client = Arc::clone(client);
            async move {
                client.delete_redirect(id).await?;
                info!(%path, "deleted");
                Ok(path)
            }
        })
        .collect();
    outcome.deleted = run_batch(deletes).await?;
    Ok(outcome)
}
