//! Theme selection and lifecycle.

use shopmirror_remote::{ShopClient, Theme};
use tracing::info;

use crate::error::SyncError;

/// Resolve the theme a pull or push should target: by exact name when one is
/// given, otherwise the published (`main`) theme.
pub async fn find_theme(
    client: &dyn ShopClient,
    name: Option<&str>,
) -> Result<Option<Theme>, SyncError> {
    let themes = client.list_themes().await?;
    Ok(match name {
        Some(name) => themes.into_iter().find(|theme| theme.name == name),
        None => themes.into_iter().find(Theme::is_published),
    })
}

/// Like [`find_theme`] but a miss is an error.
pub async fn require_theme(client: &dyn ShopClient, name: Option<&str>) -> Result<Theme, SyncError> {
    find_theme(client, name)
        .await?
        .ok_or_else(|| SyncError::ThemeNotFound {
            name: name.map(str::to_owned),
        })
}

pub async fn list(client: &dyn ShopClient) -> Result<Vec<Theme>, SyncError> {
    Ok(client.list_themes().await?)
}

/// Make the named theme the published one. Publishing the already-published
/// theme is a no-op.
pub async fn publish(client: &dyn ShopClient, name: &str) -> Result<Theme, SyncError> {
    let theme = require_theme(client, Some(name)).await?;
    if theme.is_published() {
        info!(theme = %theme.name, "already published");
        return Ok(theme);
    }
    info!(theme = %theme.name, id = theme.id, "publishing");
    Ok(client.publish_theme(theme.id).await?)
}

/// Ensure a theme with the given name exists, creating it unpublished
/// (optionally seeded from a zip at `src`) when absent.
pub async fn init(
    client: &dyn ShopClient,
    name: &str,
    src: Option<&str>,
) -> Result<Theme, SyncError> {
    if let Some(existing) = find_theme(client, Some(name)).await? {
        info!(theme = %existing.name, id = existing.id, "theme already exists");
        return Ok(existing);
    }
    info!(theme = name, src = src.unwrap_or("<blank>"), "creating theme");
    Ok(client.create_theme(name, src).await?)
}
