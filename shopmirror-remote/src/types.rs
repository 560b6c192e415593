//! Wire models for the admin REST resources.
//!
//! Pages, blogs and articles carry an open-ended field set beyond the handful
//! the sync engine inspects, so those models keep the remainder in a flattened
//! `extra` map and round-trip it untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::paging::HasId;

/// A theme as listed by the themes endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub id: u64,
    pub name: String,
    /// `main` for the published theme, `unpublished` or `demo` otherwise.
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Theme {
    pub fn is_published(&self) -> bool {
        self.role == "main"
    }
}

/// A theme file as reported by asset listings.
///
/// Listings omit `value`/`attachment`; only a single-asset fetch fills them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Asset {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// UTF-8 content, present on single-asset fetches of text assets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Base64 content, present on single-asset fetches of binary assets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
}

/// A URL redirect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redirect {
    pub id: u64,
    /// Source path, always beginning with `/`.
    pub path: String,
    pub target: String,
}

/// A script tag injected into the storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptTag {
    pub id: u64,
    pub src: String,
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_scope: Option<String>,
}

/// A content page. Identified locally by `handle`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: u64,
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A blog, the container articles live under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blog {
    pub id: u64,
    pub handle: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A blog article. Identified locally by `handle` within its blog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: u64,
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blog_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HasId for Redirect {
    fn id(&self) -> u64 {
        self.id
    }
}

impl HasId for ScriptTag {
    fn id(&self) -> u64 {
        self.id
    }
}

impl HasId for Page {
    fn id(&self) -> u64 {
        self.id
    }
}

impl HasId for Blog {
    fn id(&self) -> u64 {
        self.id
    }
}

impl HasId for Article {
    fn id(&self) -> u64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn page_round_trips_unknown_fields() {
        let wire = json!({
            "id": 7,
            "handle": "about",
            "body_html": "<p>hi</p>",
            "author": "someone",
            "template_suffix": null
        });
        let page: Page = serde_json::from_value(wire.clone()).expect("decode");
        assert_eq!(page.handle, "about");
        assert_eq!(page.extra["author"], json!("someone"));
        let back = serde_json::to_value(&page).expect("encode");
        assert_eq!(back, wire);
    }

    #[test]
    fn asset_listing_fields_are_optional() {
        let asset: Asset =
            serde_json::from_value(json!({"key": "assets/logo.png"})).expect("decode");
        assert_eq!(asset.key, "assets/logo.png");
        assert!(asset.value.is_none() && asset.attachment.is_none());
    }

    #[test]
    fn theme_role_decides_published() {
        let main: Theme =
            serde_json::from_value(json!({"id": 1, "name": "Live", "role": "main"}))
                .expect("decode");
        let dev: Theme =
            serde_json::from_value(json!({"id": 2, "name": "Dev", "role": "unpublished"}))
                .expect("decode");
        assert!(main.is_published());
        assert!(!dev.is_published());
    }
}
