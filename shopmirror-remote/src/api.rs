//! The client surface the sync engine is written against.
//!
//! One logical operation per method; pagination, envelopes and retries are
//! implementation concerns. Tests substitute an in-memory store for the HTTP
//! client through this trait.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::RemoteError;
use crate::types::{Article, Asset, Blog, Page, Redirect, ScriptTag, Theme};

/// Payload for an asset upsert. Exactly one of `value`/`attachment` is set.
#[derive(Debug, Clone, Serialize)]
pub struct AssetUpload {
    pub key: String,
    /// UTF-8 content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Base64-encoded binary content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
}

impl AssetUpload {
    pub fn text(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            attachment: None,
        }
    }

    pub fn binary_base64(key: impl Into<String>, attachment: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            attachment: Some(attachment.into()),
        }
    }
}

/// Remote store operations, one method per admin-API action.
///
/// Lookups that can miss return `Ok(None)`; listings of absent collections
/// return empty vectors. Only transport and protocol failures are errors.
#[async_trait]
pub trait ShopClient: Send + Sync {
    // ---- themes ----

    async fn list_themes(&self) -> Result<Vec<Theme>, RemoteError>;

    /// Create an unpublished theme, optionally seeded from a zip at `src`.
    async fn create_theme(&self, name: &str, src: Option<&str>) -> Result<Theme, RemoteError>;

    /// Make the theme the published (`main`) one.
    async fn publish_theme(&self, theme_id: u64) -> Result<Theme, RemoteError>;

    // ---- theme assets ----

    /// List all assets of a theme. Listing entries carry metadata only.
    async fn list_assets(&self, theme_id: u64) -> Result<Vec<Asset>, RemoteError>;

    /// Fetch a single asset with its content (`value` or `attachment`).
    async fn get_asset(&self, theme_id: u64, key: &str) -> Result<Option<Asset>, RemoteError>;

    /// Create or replace an asset.
    async fn put_asset(&self, theme_id: u64, upload: &AssetUpload) -> Result<(), RemoteError>;

    async fn delete_asset(&self, theme_id: u64, key: &str) -> Result<(), RemoteError>;

    /// Fetch raw bytes from a public URL (asset CDN downloads).
    async fn download(&self, url: &str) -> Result<Vec<u8>, RemoteError>;

    // ---- redirects ----

    async fn list_redirects(&self) -> Result<Vec<Redirect>, RemoteError>;

    async fn create_redirect(&self, path: &str, target: &str) -> Result<Redirect, RemoteError>;

    async fn update_redirect(
        &self,
        redirect_id: u64,
        path: &str,
        target: &str,
    ) -> Result<Redirect, RemoteError>;

    async fn delete_redirect(&self, redirect_id: u64) -> Result<(), RemoteError>;

    // ---- script tags ----

    async fn list_script_tags(&self) -> Result<Vec<ScriptTag>, RemoteError>;

    async fn create_script_tag(
        &self,
        src: &str,
        event: &str,
        display_scope: Option<&str>,
    ) -> Result<ScriptTag, RemoteError>;

    async fn update_script_tag(
        &self,
        script_tag_id: u64,
        src: &str,
        event: &str,
        display_scope: Option<&str>,
    ) -> Result<ScriptTag, RemoteError>;

    async fn delete_script_tag(&self, script_tag_id: u64) -> Result<(), RemoteError>;

    // ---- pages ----

    async fn list_pages(&self) -> Result<Vec<Page>, RemoteError>;

    /// Create a page from a full document (handle, body_html, published, ...).
    async fn create_page(&self, page: &Value) -> Result<Page, RemoteError>;

    async fn update_page(&self, page_id: u64, page: &Value) -> Result<Page, RemoteError>;

    async fn delete_page(&self, page_id: u64) -> Result<(), RemoteError>;

    // ---- blogs and articles ----

    async fn list_blogs(&self) -> Result<Vec<Blog>, RemoteError>;

    async fn list_articles(&self, blog_id: u64) -> Result<Vec<Article>, RemoteError>;

    async fn create_article(&self, blog_id: u64, article: &Value) -> Result<Article, RemoteError>;

    async fn update_article(
        &self,
        blog_id: u64,
        article_id: u64,
        article: &Value,
    ) -> Result<Article, RemoteError>;

    async fn delete_article(&self, blog_id: u64, article_id: u64) -> Result<(), RemoteError>;
}
