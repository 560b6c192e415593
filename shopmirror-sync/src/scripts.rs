//! Script tag sync.
//!
//! Script tags map onto `scripts.csv` with `src,event,scope` rows, keyed by
//! the script URL. The URL always contains `/`, so a `/` test filters out the
//! header and stray lines.

use std::path::Path;
use std::sync::Arc;

use shopmirror_core::{files, fingerprint};
use shopmirror_remote::{ScriptTag, ShopClient};
use tracing::{debug, info};

use crate::engine::run_batch;
use crate::error::SyncError;
use crate::plan::{PullOutcome, PushOutcome, SyncPlan};

pub const SCRIPTS_FILE: &str = "scripts.csv";
const HEADER: &str = "src,event,scope";
const DEFAULT_EVENT: &str = "onload";

/// One local row: event and optional display scope for a script URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRow {
    pub src: String,
    pub event: String,
    pub scope: Option<String>,
}

fn render_csv(tags: &[ScriptTag]) -> String {
    let mut rows: Vec<String> = tags
        .iter()
        .map(|tag| {
            format!(
                "{},{},{}",
                tag.src,
                tag.event,
                tag.display_scope.as_deref().unwrap_or_default()
            )
        })
        .collect();
    rows.sort();
    let mut out = String::with_capacity(rows.len() * 64 + HEADER.len() + 1);
    out.push_str(HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(&row);
        out.push('\n');
    }
    out
}

fn parse_csv(text: &str) -> Vec<ScriptRow> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if !line.contains('/') {
                return None;
            }
            let mut parts = line.splitn(3, ',').map(str::trim);
            let src = parts.next()?.to_owned();
            let event = match parts.next() {
                Some(event) if !event.is_empty() => event.to_owned(),
                _ => DEFAULT_EVENT.to_owned(),
            };
            let scope = parts
                .next()
                .filter(|scope| !scope.is_empty())
                .map(str::to_owned);
            Some(ScriptRow { src, event, scope })
        })
        .collect()
}

/// Rewrite `scripts.csv` from the remote collection, checksum-gated like the
/// redirect file.
pub async fn pull(
    client: &dyn ShopClient,
    base_dir: &Path,
    force: bool,
    dry_run: bool,
) -> Result<PullOutcome, SyncError> {
    let rendered = render_csv(&client.list_script_tags().await?);
    let path = base_dir.join(SCRIPTS_FILE);
    let mut outcome = PullOutcome::default();

    let current = fingerprint::md5_file(&path)?;
    if !force && current.as_deref() == Some(fingerprint::md5_hex(rendered.as_bytes()).as_str()) {
        outcome.skipped.push(SCRIPTS_FILE.to_owned());
        return Ok(outcome);
    }
    if dry_run {
        info!(file = SCRIPTS_FILE, "would write");
    } else {
        files::save_file(&path, rendered.as_bytes())?;
        info!(file = SCRIPTS_FILE, "wrote");
    }
    outcome.written.push(SCRIPTS_FILE.to_owned());
    Ok(outcome)
}

fn plan_push(local: Vec<ScriptRow>, remote: &[ScriptTag]) -> SyncPlan<ScriptRow> {
    let mut plan = SyncPlan::default();
    for row in &local {
        match remote.iter().find(|tag| tag.src == row.src) {
            None => plan.creations.push((row.src.clone(), row.clone())),
            Some(tag) if tag.event != row.event || tag.display_scope != row.scope => {
                plan.updates.push((row.src.clone(), tag.id, row.clone()));
            }
            Some(_) => debug!(src = %row.src, "unchanged"),
        }
    }
    for tag in remote {
        if !local.iter().any(|row| row.src == tag.src) {
            plan.deletions.push((tag.src.clone(), tag.id));
        }
    }
    plan
}

/// Make the remote script tags mirror `scripts.csv`. A missing file pushes
/// nothing.
pub async fn push(
    client: &Arc<dyn ShopClient>,
    base_dir: &Path,
    dry_run: bool,
) -> Result<PushOutcome, SyncError> {
    let Some(text) = files::read_file_text(&base_dir.join(SCRIPTS_FILE))? else {
        debug!(file = SCRIPTS_FILE, "absent, nothing to push");
        return Ok(PushOutcome::default());
    };
    let remote = client.list_script_tags().await?;
    let plan = plan_push(parse_csv(&text), &remote);

    let mut outcome = PushOutcome::default();
    if dry_run {
        for (src, _) in &plan.creations {
            info!(%src, "would create");
        }
        for (src, ..) in &plan.updates {
            info!(%src, "would update");
        }
        for (src, _) in &plan.deletions {
            info!(%src, "would delete");
        }
        outcome.created = plan.creations.into_iter().map(|(k, _)| k).collect();
        outcome.updated = plan.updates.into_iter().map(|(k, ..)| k).collect();
        outcome.deleted = plan.deletions.into_iter().map(|(k, _)| k).collect();
        return Ok(outcome);
    }

    let creates = plan
        .creations
        .into_iter()
        .map(|(src, row)| {
            let client = Arc::clone(client);
            async move {
                client
                    .create_script_tag(&row.src, &row.event, row.scope.as_deref())
                    .await?;
                info!(%src, "created");
                Ok(src)
            }
        })
        .collect();
    outcome.created = run_batch(creates).await?;

    let updates = plan
        .updates
        .into_iter()
        .map(|(src, id, row)| {
            let client = Arc::clone(client);
            async move {
                client
                    .update_script_tag(id, &row.src, &row.event, row.scope.as_deref())
                    .await?;
                info!(%src, "updated");
                Ok(src)
            }
        })
        .collect();
    outcome.updated = run_batch(updates).await?;

    let deletes = plan
        .deletions
        .into_iter()
        .map(|(src, id)| {
            let client = Arc::clone(client);
            async move {
                client.delete_script_tag(id).await?;
                info!(%src, "deleted");
                Ok(src)
            }
        })
        .collect();
    outcome.deleted = run_batch(deletes).await?;
    Ok(outcome)
}
