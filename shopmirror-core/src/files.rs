//! Local tree access.
//!
//! Scanning is tolerant: directories that do not exist yet contribute nothing.
//! Writes go through a temp-file-and-rename dance so a crash mid-write never
//! leaves a truncated file behind for the next fingerprint pass to trust.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::trace;

use crate::error::{io_err, CoreError};
use crate::ignore::IgnoreCache;

/// Collect the relative paths of all files under `base_dir` that sit inside
/// one of `sub_dirs`, skipping anything the ignore rules match.
///
/// Keys use forward slashes on every platform, e.g. `templates/index.liquid`.
pub fn scan_tree(
    base_dir: &Path,
    sub_dirs: &[String],
    ignore: &mut IgnoreCache,
) -> Result<BTreeSet<String>, CoreError> {
    let mut keys = BTreeSet::new();
    for sub in sub_dirs {
        let dir = base_dir.join(sub);
        if !dir.is_dir() {
            continue;
        }
        collect(base_dir, &dir, sub, ignore, &mut keys)?;
    }
    Ok(keys)
}

fn collect(
    base_dir: &Path,
    dir: &Path,
    prefix: &str,
    ignore: &mut IgnoreCache,
    keys: &mut BTreeSet<String>,
) -> Result<(), CoreError> {
    let entries = std::fs::read_dir(dir).map_err(|err| io_err(dir, err))?;
    for entry in entries {
        let entry = entry.map_err(|err| io_err(dir, err))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            // Non-UTF-8 names cannot round-trip through remote keys.
            trace!(dir = %dir.display(), "skipping non-unicode entry");
            continue;
        };
        let key = format!("{prefix}/{name}");
        if ignore.matches(base_dir, &key)? {
            trace!(%key, "ignored");
            continue;
        }
        let file_type = entry.file_type().map_err(|err| io_err(entry.path(), err))?;
        if file_type.is_dir() {
            collect(base_dir, &entry.path(), &key, ignore, keys)?;
        } else if file_type.is_file() {
            keys.insert(key);
        }
    }
    Ok(())
}

/// Write `bytes` to `path` atomically, creating parent directories as needed.
pub fn save_file(path: &Path, bytes: &[u8]) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| io_err(parent, err))?;
    }
    let tmp = path.with_extension(match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{ext}.tmp"),
        None => "tmp".to_owned(),
    });
    std::fs::write(&tmp, bytes).map_err(|err| io_err(&tmp, err))?;
    if let Err(err) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, err));
    }
    Ok(())
}

/// Read a file as UTF-8 text; `None` if it does not exist.
pub fn read_file_text(path: &Path) -> Result<Option<String>, CoreError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Read a file as raw bytes; `None` if it does not exist.
pub fn read_file_bytes(path: &Path) -> Result<Option<Vec<u8>>, CoreError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Delete a file if it exists. Missing files are not an error.
pub fn remove_file(path: &Path) -> Result<(), CoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(path, err)),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::ignore::IGNORE_FILE;

    fn touch(home: &TempDir, relative: &str) {
        let path = home.path().join(relative);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, b"x").expect("write");
    }

    #[test]
    fn scan_collects_only_requested_sub_dirs() {
        let home = TempDir::new().expect("tempdir");
        touch(&home, "assets/logo.png");
        touch(&home, "templates/index.liquid");
        touch(&home, "unrelated/readme.md");

        let mut ignore = IgnoreCache::new();
        let keys = scan_tree(
            home.path(),
            &["assets".to_owned(), "templates".to_owned()],
            &mut ignore,
        )
        .expect("scan");
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        assert_eq!(keys, ["assets/logo.png", "templates/index.liquid"]);
    }

    #[test]
    fn scan_recurses_into_nested_dirs() {
        let home = TempDir::new().expect("tempdir");
        touch(&home, "pages/drafts/wip.json");
        touch(&home, "pages/about.json");

        let mut ignore = IgnoreCache::new();
        let keys =
            scan_tree(home.path(), &["pages".to_owned()], &mut ignore).expect("scan");
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        assert_eq!(keys, ["pages/about.json", "pages/drafts/wip.json"]);
    }

    #[test]
    fn missing_sub_dir_contributes_nothing() {
        let home = TempDir::new().expect("tempdir");
        let mut ignore = IgnoreCache::new();
        let keys =
            scan_tree(home.path(), &["assets".to_owned()], &mut ignore).expect("scan");
        assert!(keys.is_empty());
    }

    #[test]
    fn scan_honours_ignore_rules() {
        let home = TempDir::new().expect("tempdir");
        touch(&home, "assets/logo.png");
        touch(&home, "assets/scratch.bak");
        touch(&home, "assets/tmp/cache.txt");
        std::fs::write(home.path().join(IGNORE_FILE), "*.bak\nassets/tmp/\n").expect("rules");

        let mut ignore = IgnoreCache::new();
        let keys =
            scan_tree(home.path(), &["assets".to_owned()], &mut ignore).expect("scan");
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        assert_eq!(keys, ["assets/logo.png"]);
    }

    #[test]
    fn save_file_creates_parents_and_replaces() {
        let home = TempDir::new().expect("tempdir");
        let path = home.path().join("config/settings_data.json");
        save_file(&path, b"{}").expect("save");
        assert_eq!(std::fs::read(&path).expect("read"), b"{}");
        save_file(&path, b"{\"a\": 1}").expect("save again");
        assert_eq!(std::fs::read(&path).expect("read"), b"{\"a\": 1}");
        // No temp residue.
        let names: Vec<_> = std::fs::read_dir(path.parent().expect("parent"))
            .expect("dir")
            .map(|e| e.expect("entry").file_name())
            .collect();
        assert_eq!(names, ["settings_data.json"]);
    }

    #[test]
    fn read_and_remove_tolerate_missing_files() {
        let home = TempDir::new().expect("tempdir");
        let path = home.path().join("absent.txt");
        assert_eq!(read_file_text(&path).expect("read"), None);
        assert_eq!(read_file_bytes(&path).expect("read"), None);
        remove_file(&path).expect("remove");
    }
}
