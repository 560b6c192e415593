//! Theme asset sync.
//!
//! Assets map one-to-one onto files under the theme directories
//! (`assets/logo.png` the asset is `assets/logo.png` the file). The remote
//! listing carries checksum/size/mtime metadata, so unchanged files are
//! skipped without transferring content.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;
use shopmirror_core::{
    files, fingerprint, to_canonical_string, FormatOptions, IgnoreCache, KeyOrder, RemoteStat,
};
use shopmirror_remote::{Asset, AssetUpload, ShopClient};
use tracing::{debug, info, warn};

use crate::engine::run_batch;
use crate::error::SyncError;
use crate::plan::{PullOutcome, PushOutcome};

/// Directories a theme always owns, even when the remote currently has no
/// asset in one of them.
const KNOWN_DIRS: &[&str] = &[
    "assets",
    "config",
    "layout",
    "locales",
    "sections",
    "snippets",
    "templates",
];

/// The directories this theme's files may live in: the fixed set plus any
/// top-level category the remote listing reports, so a new server-side
/// category is picked up without a code change.
fn asset_dirs(remote: &[Asset]) -> Vec<String> {
    let mut dirs: BTreeSet<String> = KNOWN_DIRS.iter().map(|d| (*d).to_owned()).collect();
    for asset in remote {
        if let Some((top, _)) = asset.key.split_once('/') {
            dirs.insert(top.to_owned());
        }
    }
    dirs.into_iter().collect()
}

/// Drop listing entries the server generated from a `.liquid` template: when
/// both `x` and `x.liquid` exist remotely, only the `.liquid` source is real.
fn drop_generated(remote: Vec<Asset>) -> Vec<Asset> {
    let keys: BTreeSet<String> = remote.iter().map(|asset| asset.key.clone()).collect();
    remote
        .into_iter()
        .filter(|asset| !keys.contains(&format!("{}.liquid", asset.key)))
        .collect()
}

/// Rendering options for a pulled JSON asset. Documents under `config/`
/// (settings schema and data) put `name`/`value`/`errors` first so the files
/// read the way the theme editor presents them.
fn render_options(key: &str) -> FormatOptions {
    if key.starts_with("config/") {
        FormatOptions {
            key_order: KeyOrder::config_priority(),
            ..FormatOptions::default()
        }
    } else {
        FormatOptions::default()
    }
}

fn stat_of(asset: &Asset) -> RemoteStat {
    RemoteStat {
        checksum: asset.checksum.clone(),
        size: asset.size,
        updated_at: asset.updated_at,
    }
}

/// Content bytes for one remote asset, preferring the CDN URL from the
/// listing over a per-asset API fetch. JSON values are re-rendered in
/// canonical form so pulled files are diff-stable.
async fn fetch_bytes(
    client: &dyn ShopClient,
    theme_id: u64,
    asset: &Asset,
) -> Result<Option<Vec<u8>>, SyncError> {
    if let Some(url) = &asset.public_url {
        return Ok(Some(client.download(url).await?));
    }
    let Some(detail) = client.get_asset(theme_id, &asset.key).await? else {
        warn!(key = %asset.key, "asset vanished between listing and fetch");
        return Ok(None);
    };
    if let Some(value) = detail.value {
        if asset.key.ends_with(".json") {
            if let Ok(doc) = serde_json::from_str::<Value>(&value) {
                let rendered = to_canonical_string(&doc, &render_options(&asset.key));
                return Ok(Some(rendered.into_bytes()));
            }
        }
        return Ok(Some(value.into_bytes()));
    }
    if let Some(attachment) = detail.attachment {
        let bytes = BASE64
            .decode(attachment.replace(['\n', '\r'], ""))
            .map_err(|source| SyncError::Attachment {
                key: asset.key.clone(),
                source,
            })?;
        return Ok(Some(bytes));
    }
    warn!(key = %asset.key, "asset fetch returned no content");
    Ok(None)
}

/// Mirror the remote theme's assets into `base_dir`.
pub async fn pull(
    client: &Arc<dyn ShopClient>,
    theme_id: u64,
    base_dir: &Path,
    force: bool,
    dry_run: bool,
) -> Result<PullOutcome, SyncError> {
    let remote = drop_generated(client.list_assets(theme_id).await?);
    let dirs = asset_dirs(&remote);
    let mut ignore = IgnoreCache::new();
    let mut outcome = PullOutcome::default();
    let mut remote_keys = BTreeSet::new();
    let mut tasks = Vec::new();

    for asset in remote {
        if ignore.matches(base_dir, &asset.key)? {
            debug!(key = %asset.key, "ignored");
            continue;
        }
        remote_keys.insert(asset.key.clone());
        let path = base_dir.join(&asset.key);
        if !force && fingerprint::is_probably_same(&path, &stat_of(&asset))? {
            outcome.skipped.push(asset.key);
            continue;
        }
        if dry_run {
            info!(key = %asset.key, "would write");
            outcome.written.push(asset.key);
            continue;
        }
        let client = Arc::clone(client);
        let base = base_dir.to_path_buf();
        tasks.push(async move {
            if let Some(bytes) = fetch_bytes(client.as_ref(), theme_id, &asset).await? {
                files::save_file(&base.join(&asset.key), &bytes)?;
                info!(key = %asset.key, bytes = bytes.len(), "wrote");
            }
            Ok(asset.key)
        });
    }
    outcome.written.extend(run_batch(tasks).await?);
    outcome.written.sort();

    // Local leftovers go last, after every write has landed.
    let local = files::scan_tree(base_dir, &dirs, &mut ignore)?;
    for key in local.difference(&remote_keys) {
        if dry_run {
            info!(%key, "would delete");
        } else {
            files::remove_file(&base_dir.join(key))?;
            info!(%key, "deleted");
        }
        outcome.deleted.push(key.clone());
    }
    Ok(outcome)
}

fn upload_for(key: &str, bytes: Vec<u8>) -> AssetUpload {
    match String::from_utf8(bytes) {
        Ok(text) => AssetUpload::text(key, text),
        Err(err) => AssetUpload::binary_base64(key, BASE64.encode(err.into_bytes())),
    }
}

/// Make the remote theme mirror the files under `base_dir`.
pub async fn push(
    client: &Arc<dyn ShopClient>,
    theme_id: u64,
    base_dir: &Path,
    force: bool,
    dry_run: bool,
) -> Result<PushOutcome, SyncError> {
    let remote = drop_generated(client.list_assets(theme_id).await?);
    let dirs = asset_dirs(&remote);
    let mut ignore = IgnoreCache::new();

    let mut remote_by_key: BTreeMap<String, Asset> = BTreeMap::new();
    for asset in remote {
        if !ignore.matches(base_dir, &asset.key)? {
            remote_by_key.insert(asset.key.clone(), asset);
        }
    }
    let local = files::scan_tree(base_dir, &dirs, &mut ignore)?;

    let mut outcome = PushOutcome::default();
    let mut creations = Vec::new();
    let mut updates = Vec::new();
    for key in &local {
        let path = base_dir.join(key);
        match remote_by_key.get(key) {
            Some(asset) if !force && fingerprint::is_probably_same(&path, &stat_of(asset))? => {
                debug!(%key, "unchanged");
            }
            Some(_) => updates.push(key.clone()),
            None => creations.push(key.clone()),
        }
    }
    let deletions: Vec<String> = remote_by_key
        .keys()
        .filter(|key| !local.contains(*key))
        .cloned()
        .collect();

    if dry_run {
        for key in &creations {
            info!(%key, "would create");
        }
        for key in &updates {
            info!(%key, "would update");
        }
        for key in &deletions {
            info!(%key, "would delete");
        }
        outcome.created = creations;
        outcome.updated = updates;
        outcome.deleted = deletions;
        return Ok(outcome);
    }

    let upload_task = |key: String| {
        let client = Arc::clone(client);
        let path = base_dir.join(&key);
        async move {
            let Some(bytes) = files::read_file_bytes(&path)? else {
                warn!(%key, "file vanished before upload");
                return Ok(key);
            };
            client.put_asset(theme_id, &upload_for(&key, bytes)).await?;
            info!(%key, "uploaded");
            Ok(key)
        }
    };
    outcome.created = run_batch(creations.into_iter().map(&upload_task).collect()).await?;
    outcome.updated = run_batch(updates.into_iter().map(&upload_task).collect()).await?;

    let delete_tasks = deletions
        .into_iter()
        .map(|key| {
            let client = Arc::clone(client);
            async move {
                client.delete_asset(theme_id, &key).await?;
                info!(%key, "deleted");
                Ok(key)
            }
        })
        .collect();
    outcome.deleted = run_batch(delete_tasks).await?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(key: &str) -> Asset {
        Asset {
            key: key.to_owned(),
            ..Asset::default()
        }
    }

    #[test]
    fn generated_siblings_are_dropped() {
        let remote = vec![
            asset("assets/style.css"),
            asset("assets/style.css.liquid"),
            asset("assets/logo.png"),
        ];
        let kept: Vec<String> = drop_generated(remote)
            .into_iter()
            .map(|a| a.key)
            .collect();
        assert_eq!(kept, ["assets/style.css.liquid", "assets/logo.png"]);
    }

    #[test]
    fn asset_dirs_extend_the_known_set() {
        let remote = vec![asset("frontend/app.js"), asset("assets/logo.png")];
        let dirs = asset_dirs(&remote);
        assert!(dirs.contains(&"frontend".to_owned()));
        assert!(dirs.contains(&"templates".to_owned()));
    }

    #[test]
    fn uploads_pick_text_or_attachment_by_content() {
        let text = upload_for("assets/app.js", b"console.log(1)".to_vec());
        assert!(text.value.is_some() && text.attachment.is_none());

        let binary = upload_for("assets/logo.png", vec![0x89, 0x50, 0x4e, 0x47, 0xff]);
        assert!(binary.value.is_none());
        let decoded = BASE64
            .decode(binary.attachment.expect("attachment"))
            .expect("decode");
        assert_eq!(decoded, vec![0x89, 0x50, 0x4e, 0x47, 0xff]);
    }

    #[test]
    fn config_documents_render_with_priority_keys() {
        assert_eq!(
            render_options("config/settings_schema.json").key_order,
            KeyOrder::config_priority()
        );
        assert_eq!(
            render_options("locales/en.default.json").key_order,
            KeyOrder::Lexicographic
        );
    }

    #[test]
    fn stat_carries_listing_metadata() {
        let mut a = asset("assets/x.js");
        a.checksum = Some("abc".to_owned());
        a.size = Some(3);
        let stat = stat_of(&a);
        assert_eq!(stat.checksum.as_deref(), Some("abc"));
        assert_eq!(stat.size, Some(3));
        assert_eq!(stat.updated_at, None);
    }
}
