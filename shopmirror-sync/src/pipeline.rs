//! Top-level pull and push orchestration.
//!
//! Resource kinds run in a fixed order — assets, redirects, script tags,
//! pages, blog articles — each finishing before the next starts. Any kind
//! can be switched off per invocation.

use std::path::Path;
use std::sync::Arc;

use shopmirror_remote::ShopClient;
use tracing::info;

use crate::error::SyncError;
use crate::plan::{PullOutcome, PushOutcome};
use crate::{articles, assets, pages, redirects, scripts, theme};

/// Per-invocation switches shared by pull and push.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Theme name; `None` targets the published theme.
    pub theme: Option<String>,
    /// Transfer everything, bypassing the cheap-equality fingerprint.
    pub force: bool,
    /// Report what would change without touching either side.
    pub dry_run: bool,
    pub assets: bool,
    pub redirects: bool,
    pub script_tags: bool,
    pub pages: bool,
    pub blogs: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            theme: None,
            force: false,
            dry_run: false,
            assets: true,
            redirects: true,
            script_tags: true,
            pages: true,
            blogs: true,
        }
    }
}

/// Per-kind outcomes of one pull.
#[derive(Debug, Default)]
pub struct PullReport {
    pub assets: PullOutcome,
    pub redirects: PullOutcome,
    pub scripts: PullOutcome,
    pub pages: PullOutcome,
    pub articles: PullOutcome,
}

impl PullReport {
    pub fn changed(&self) -> usize {
        [&self.assets, &self.redirects, &self.scripts, &self.pages, &self.articles]
            .iter()
            .map(|outcome| outcome.changed())
            .sum()
    }
}

/// Per-kind outcomes of one push.
#[derive(Debug, Default)]
pub struct PushReport {
    pub assets: PushOutcome,
    pub redirects: PushOutcome,
    pub scripts: PushOutcome,
    pub pages: PushOutcome,
    pub articles: PushOutcome,
}

impl PushReport {
    pub fn changed(&self) -> usize {
        [&self.assets, &self.redirects, &self.scripts, &self.pages, &self.articles]
            .iter()
            .map(|outcome| outcome.changed())
            .sum()
    }
}

/// Make the local tree under `base_dir` mirror the remote store.
pub async fn pull(
    client: Arc<dyn ShopClient>,
    base_dir: &Path,
    options: &SyncOptions,
) -> Result<PullReport, SyncError> {
    let mut report = PullReport::default();
    if options.assets {
        let theme = theme::require_theme(client.as_ref(), options.theme.as_deref()).await?;
        info!(theme = %theme.name, id = theme.id, "pulling assets");
        report.assets =
            assets::pull(&client, theme.id, base_dir, options.force, options.dry_run).await?;
    }
    if options.redirects {
        report.redirects =
            redirects::pull(client.as_ref(), base_dir, options.force, options.dry_run).await?;
    }
    if options.script_tags {
        report.scripts =
            scripts::pull(client.as_ref(), base_dir, options.force, options.dry_run).await?;
    }
    if options.pages {
        report.pages =
            pages::pull(client.as_ref(), base_dir, options.force, options.dry_run).await?;
    }
    if options.blogs {
        report.articles =
            articles::pull(client.as_ref(), base_dir, options.force, options.dry_run).await?;
    }
    info!(changed = report.changed(), dry_run = options.dry_run, "pull finished");
    Ok(report)
}

/// Make the remote store mirror the local tree under `base_dir`.
pub async fn push(
    client: Arc<dyn ShopClient>,
    base_dir: &Path,
    options: &SyncOptions,
) -> Result<PushReport, SyncError> {
    let mut report = PushReport::default();
    if options.assets {
        let theme = theme::require_theme(client.as_ref(), options.theme.as_deref()).await?;
        info!(theme = %theme.name, id = theme.id, "pushing assets");
        report.assets =
            assets::push(&client, theme.id, base_dir, options.force, options.dry_run).await?;
    }
    if options.redirects {
        report.redirects = redirects::push(&client, base_dir, options.dry_run).await?;
    }
    if options.script_tags {
        report.scripts = scripts::push(&client, base_dir, options.dry_run).await?;
    }
    if options.pages {
        report.pages = pages::push(&client, base_dir, options.dry_run).await?;
    }
    if options.blogs {
        report.articles = articles::push(&client, base_dir, options.dry_run).await?;
    }
    info!(changed = report.changed(), dry_run = options.dry_run, "push finished");
    Ok(report)
}
