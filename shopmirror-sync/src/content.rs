//! Shared handling for handle-keyed content documents (pages and articles).
//!
//! Each item is a pair of files named after its handle: `<handle>.json` holds
//! the document with `"body_html": {"file": "<handle>.html"}` pointing at the
//! HTML sidecar next to it. Published items live directly in the content
//! directory, unpublished ones under its `drafts/` subdirectory. The pair is
//! all-or-nothing: a JSON file whose sidecar is missing counts as absent.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{json, Value};
use shopmirror_core::{files, strip_fields, to_canonical_string, FormatOptions, IgnoreCache};
use tracing::warn;

use crate::engine::{BASE_IGNORE_FIELDS, VOLATILE_IGNORE_FIELDS};
use crate::error::SyncError;

pub const DRAFTS_DIR: &str = "drafts";

/// One content item as found on disk, with the sidecar already inlined.
#[derive(Debug, Clone)]
pub struct LocalDoc {
    pub handle: String,
    pub draft: bool,
    pub doc: Value,
}

fn handle_of(file_name: &str) -> Option<&str> {
    file_name.strip_suffix(".json")
}

/// Relative path of a handle's JSON document in its current location. Every
/// pull outcome labels items with this path, written and skipped alike.
pub fn doc_path(dir: &str, handle: &str, draft: bool) -> String {
    if draft {
        format!("{dir}/{DRAFTS_DIR}/{handle}.json")
    } else {
        format!("{dir}/{handle}.json")
    }
}

/// Load every item under `dir` (e.g. `pages` or `blogs/news`), drafts
/// included. When a handle exists both published and as a draft, the
/// published copy wins and the draft is ignored.
pub fn load_docs(base_dir: &Path, dir: &str) -> Result<BTreeMap<String, LocalDoc>, SyncError> {
    let mut ignore = IgnoreCache::new();
    let keys = files::scan_tree(base_dir, &[dir.to_owned()], &mut ignore)?;
    let published_prefix = format!("{dir}/");
    let drafts_prefix = format!("{dir}/{DRAFTS_DIR}/");

    let mut docs: BTreeMap<String, LocalDoc> = BTreeMap::new();
    for key in &keys {
        let (file_name, draft) = if let Some(rest) = key.strip_prefix(&drafts_prefix) {
            (rest, true)
        } else if let Some(rest) = key.strip_prefix(&published_prefix) {
            (rest, false)
        } else {
            continue;
        };
        // Nested directories other than drafts/ are not items.
        if file_name.contains('/') {
            continue;
        }
        let Some(handle) = handle_of(file_name) else {
            continue;
        };
        let Some(doc) = load_doc(base_dir, key)? else {
            continue;
        };
        let item = LocalDoc {
            handle: handle.to_owned(),
            draft,
            doc,
        };
        match docs.entry(handle.to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(item);
            }
            Entry::Occupied(mut slot) => {
                if slot.get().draft && !draft {
                    slot.insert(item);
                } else {
                    warn!(handle, "both published and draft copies exist, using published");
                }
            }
        }
    }
    Ok(docs)
}

fn load_doc(base_dir: &Path, key: &str) -> Result<Option<Value>, SyncError> {
    let path = base_dir.join(key);
    let Some(text) = files::read_file_text(&path)? else {
        return Ok(None);
    };
    let mut doc: Value =
        serde_json::from_str(&text).map_err(|source| SyncError::Parse { path, source })?;

    let sidecar_name = doc
        .get("body_html")
        .and_then(|b| b.get("file"))
        .and_then(Value::as_str)
        .map(str::to_owned);
    if let Some(name) = sidecar_name {
        let dir_of_key = match key.rsplit_once('/') {
            Some((dir, _)) => base_dir.join(dir),
            None => base_dir.to_path_buf(),
        };
        match files::read_file_text(&dir_of_key.join(&name))? {
            Some(html) => doc["body_html"] = Value::String(html),
            None => {
                warn!(key, sidecar = %name, "sidecar missing, treating item as absent");
                return Ok(None);
            }
        }
    }
    Ok(Some(doc))
}

/// Write one item's file pair from a remote document, placing it published or
/// drafted and clearing any stale copy at the other location. Returns the
/// relative paths written.
pub fn write_doc(
    base_dir: &Path,
    dir: &str,
    handle: &str,
    published: bool,
    remote_doc: &Value,
) -> Result<Vec<String>, SyncError> {
    let mut doc = strip_fields(remote_doc, BASE_IGNORE_FIELDS);
    if let Some(map) = doc.as_object_mut() {
        map.remove("published");
    }

    let html = match doc.get("body_html") {
        Some(Value::String(html)) => Some(html.clone()),
        _ => None,
    };
    let html_name = format!("{handle}.html");
    if html.is_some() {
        doc["body_html"] = json!({ "file": html_name.clone() });
    }

    let (target, stale) = if published {
        (dir.to_owned(), format!("{dir}/{DRAFTS_DIR}"))
    } else {
        (format!("{dir}/{DRAFTS_DIR}"), dir.to_owned())
    };

    let rendered = to_canonical_string(&doc, &FormatOptions::default());
    let json_rel = format!("{target}/{handle}.json");
    files::save_file(&base_dir.join(&json_rel), rendered.as_bytes())?;
    let mut written = vec![json_rel];
    if let Some(html) = html {
        let html_rel = format!("{target}/{html_name}");
        files::save_file(&base_dir.join(&html_rel), html.as_bytes())?;
        written.push(html_rel);
    }

    files::remove_file(&base_dir.join(format!("{stale}/{handle}.json")))?;
    files::remove_file(&base_dir.join(format!("{stale}/{handle}.html")))?;
    Ok(written)
}

/// Remove an item's file pair from both the published and drafts locations.
/// Returns the relative paths that were (or would be) removed.
pub fn delete_doc(base_dir: &Path, dir: &str, handle: &str, dry_run: bool) -> Result<Vec<String>, SyncError> {
    let mut removed = Vec::new();
    for location in [dir.to_owned(), format!("{dir}/{DRAFTS_DIR}")] {
        for ext in ["json", "html"] {
            let rel = format!("{location}/{handle}.{ext}");
            if base_dir.join(&rel).is_file() {
                if !dry_run {
                    files::remove_file(&base_dir.join(&rel))?;
                }
                removed.push(rel);
            }
        }
    }
    Ok(removed)
}

/// The local side of a comparison: the draft location supplies the published
/// flag the file itself does not carry.
pub fn local_compare_doc(local: &LocalDoc) -> Value {
    let mut doc = local.doc.clone();
    if let Some(map) = doc.as_object_mut() {
        map.insert("published".to_owned(), Value::Bool(!local.draft));
    }
    doc
}

/// The remote side of a comparison: `published_at` gets folded into an
/// explicit flag before the volatile timestamps are ignored.
pub fn remote_compare_doc(remote_doc: &Value) -> Value {
    let published = remote_doc
        .get("published_at")
        .is_some_and(|at| !at.is_null());
    let mut doc = remote_doc.clone();
    if let Some(map) = doc.as_object_mut() {
        map.insert("published".to_owned(), Value::Bool(published));
    }
    doc
}

/// Are a local item and a remote document the same content?
pub fn is_same_content(local: &LocalDoc, remote_doc: &Value) -> bool {
    shopmirror_core::is_same(
        &local_compare_doc(local),
        &remote_compare_doc(remote_doc),
        VOLATILE_IGNORE_FIELDS,
    )
}

/// The document to send on create or update: the file content plus the
/// handle (encoded in the file name) and the published flag (encoded in the
/// location). Draft items never carry a `published_at`.
pub fn push_payload(local: &LocalDoc) -> Value {
    let mut doc = local.doc.clone();
    if let Some(map) = doc.as_object_mut() {
        map.insert("handle".to_owned(), Value::String(local.handle.clone()));
        map.insert("published".to_owned(), Value::Bool(!local.draft));
        if local.draft {
            map.remove("published_at");
        }
    }
    doc
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn write(home: &TempDir, rel: &str, content: &str) {
        let path = home.path().join(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, content).expect("write");
    }

    #[test]
    fn load_inlines_the_sidecar() {
        let home = TempDir::new().expect("tempdir");
        write(
            &home,
            "pages/about.json",
            r#"{"title": "About", "body_html": {"file": "about.html"}}"#,
        );
        write(&home, "pages/about.html", "<p>hello</p>");

        let docs = load_docs(home.path(), "pages").expect("load");
        let about = &docs["about"];
        assert!(!about.draft);
        assert_eq!(about.doc["body_html"], Value::String("<p>hello</p>".into()));
        assert_eq!(about.doc["title"], "About");
    }

    #[test]
    fn missing_sidecar_means_item_absent() {
        let home = TempDir::new().expect("tempdir");
        write(
            &home,
            "pages/broken.json",
            r#"{"body_html": {"file": "broken.html"}}"#,
        );
        let docs = load_docs(home.path(), "pages").expect("load");
        assert!(docs.is_empty());
    }

    #[test]
    fn published_copy_wins_over_draft() {
        let home = TempDir::new().expect("tempdir");
        write(&home, "pages/about.json", r#"{"title": "live"}"#);
        write(&home, "pages/drafts/about.json", r#"{"title": "draft"}"#);

        let docs = load_docs(home.path(), "pages").expect("load");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs["about"].doc["title"], "live");
        assert!(!docs["about"].draft);
    }

    #[test]
    fn draft_location_sets_the_flag() {
        let home = TempDir::new().expect("tempdir");
        write(&home, "pages/drafts/wip.json", r#"{"title": "wip"}"#);
        let docs = load_docs(home.path(), "pages").expect("load");
        assert!(docs["wip"].draft);
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let home = TempDir::new().expect("tempdir");
        write(&home, "pages/bad.json", "{nope");
        let err = load_docs(home.path(), "pages").expect_err("should fail");
        assert!(matches!(err, SyncError::Parse { .. }));
    }

    #[test]
    fn write_doc_splits_body_and_clears_stale_draft() {
        let home = TempDir::new().expect("tempdir");
        write(&home, "pages/drafts/about.json", r#"{"title": "old"}"#);
        write(&home, "pages/drafts/about.html", "<p>old</p>");

        let remote = serde_json::json!({
            "id": 9,
            "handle": "about",
            "title": "About",
            "body_html": "<p>new</p>"
        });
        let written =
            write_doc(home.path(), "pages", "about", true, &remote).expect("write");
        assert_eq!(written, ["pages/about.json", "pages/about.html"]);

        let saved = std::fs::read_to_string(home.path().join("pages/about.json")).expect("read");
        let saved: Value = serde_json::from_str(&saved).expect("parse");
        assert_eq!(saved["body_html"], serde_json::json!({"file": "about.html"}));
        assert!(saved.get("id").is_none(), "server identity must not persist");
        assert!(!home.path().join("pages/drafts/about.json").exists());
        assert!(!home.path().join("pages/drafts/about.html").exists());
    }

    #[test]
    fn delete_doc_removes_both_locations() {
        let home = TempDir::new().expect("tempdir");
        write(&home, "pages/gone.json", "{}");
        write(&home, "pages/gone.html", "x");
        let removed = delete_doc(home.path(), "pages", "gone", false).expect("delete");
        assert_eq!(removed, ["pages/gone.json", "pages/gone.html"]);
        assert!(!home.path().join("pages/gone.json").exists());
    }

    #[test]
    fn dry_run_delete_reports_without_removing() {
        let home = TempDir::new().expect("tempdir");
        write(&home, "pages/keep.json", "{}");
        let removed = delete_doc(home.path(), "pages", "keep", true).expect("delete");
        assert_eq!(removed, ["pages/keep.json"]);
        assert!(home.path().join("pages/keep.json").exists());
    }

    #[test]
    fn same_content_ignores_timestamps_but_not_published_state() {
        let local = LocalDoc {
            handle: "about".to_owned(),
            draft: false,
            doc: serde_json::json!({"title": "About", "body_html": "<p>x</p>"}),
        };
        let remote = serde_json::json!({
            "id": 1,
            "handle": "about",
            "title": "About",
            "body_html": "<p>x</p>",
            "published_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-06-01T00:00:00Z"
        });
        assert!(is_same_content(&local, &remote));

        // Same fields, but remote is unpublished while the local copy is not.
        let mut unpublished = remote.clone();
        unpublished["published_at"] = Value::Null;
        assert!(!is_same_content(&local, &unpublished));
    }

    #[test]
    fn push_payload_encodes_location_as_published_flag() {
        let draft = LocalDoc {
            handle: "wip".to_owned(),
            draft: true,
            doc: serde_json::json!({"title": "WIP", "published_at": "2024-01-01T00:00:00Z"}),
        };
        let payload = push_payload(&draft);
        assert_eq!(payload["published"], Value::Bool(false));
        assert_eq!(payload["handle"], "wip");
        assert!(payload.get("published_at").is_none());

        let live = LocalDoc {
            handle: "about".to_owned(),
            draft: false,
            doc: serde_json::json!({"title": "About"}),
        };
        assert_eq!(push_payload(&live)["published"], Value::Bool(true));
    }
}
