//! Cheap content-equality heuristic.
//!
//! Deciding whether a local file already matches a remote asset should not
//! require downloading the asset. The remote side reports a checksum, a byte
//! size and an update timestamp; this module turns those into a conservative
//! "probably unchanged" verdict. A `false` verdict is always safe — it only
//! costs a re-download.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use md5::{Digest, Md5};
use serde_json::Value;

use crate::error::{io_err, CoreError};

/// Clock skew tolerated between local mtime and the remote update stamp.
const MTIME_GRACE_SECS: i64 = 5 * 60;

/// What the remote side knows about one asset, as reported by listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteStat {
    /// MD5 of the remote content, when the remote reports one.
    pub checksum: Option<String>,
    /// Remote content size in bytes.
    pub size: Option<u64>,
    /// Last remote modification time.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Hex-encoded MD5 of a byte slice.
pub fn md5_hex(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

/// Hex-encoded MD5 of a file, or `None` if the file does not exist.
pub fn md5_file(path: &Path) -> Result<Option<String>, CoreError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(md5_hex(&bytes))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Is the file at `path` probably the same content the remote reports?
///
/// Decided in order:
/// 1. missing file — `false`;
/// 2. checksum match — `true`;
/// 3. size match (logical size for `.json`, see [`logical_size`]) *and* the
///    local file is at least as new as the remote stamp, minus clock grace —
///    `true`;
/// 4. otherwise `false`.
pub fn is_probably_same(path: &Path, remote: &RemoteStat) -> Result<bool, CoreError> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(io_err(path, err)),
    };

    if let Some(checksum) = &remote.checksum {
        if let Some(local) = md5_file(path)? {
            if local == *checksum {
                return Ok(true);
            }
        }
    }

    let (Some(remote_size), Some(updated_at)) = (remote.size, remote.updated_at) else {
        return Ok(false);
    };

    let local_size = if path.extension().is_some_and(|ext| ext == "json") {
        match logical_size(path)? {
            Some(size) => size,
            // Unparsable local JSON never counts as unchanged.
            None => return Ok(false),
        }
    } else {
        meta.len()
    };
    if local_size != remote_size {
        return Ok(false);
    }

    let mtime = meta.modified().map_err(|err| io_err(path, err))?;
    let mtime: DateTime<Utc> = mtime.into();
    Ok(mtime + Duration::seconds(MTIME_GRACE_SECS) >= updated_at)
}

/// Size the remote would report for a locally stored JSON document.
///
/// The remote stores JSON in compact form with forward slashes escaped as
/// `\/`, so the reported size is the compact length plus one byte per slash.
/// Returns `None` when the local file is not valid JSON.
fn logical_size(path: &Path) -> Result<Option<u64>, CoreError> {
    let text = std::fs::read_to_string(path).map_err(|err| io_err(path, err))?;
    let Ok(doc) = serde_json::from_str::<Value>(&text) else {
        return Ok(None);
    };
    let compact = doc.to_string();
    let slashes = compact.matches('/').count();
    Ok(Some((compact.len() + slashes) as u64))
}

#[cfg(test)]
mod tests {
    use filetime::FileTime;
    use tempfile::TempDir;

    use super::*;

    fn write(home: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = home.path().join(name);
        std::fs::write(&path, content).expect("write");
        path
    }

    #[test]
    fn missing_file_is_never_same() {
        let home = TempDir::new().expect("tempdir");
        let remote = RemoteStat {
            checksum: Some(md5_hex(b"x")),
            ..RemoteStat::default()
        };
        let verdict = is_probably_same(&home.path().join("absent.txt"), &remote);
        assert!(!verdict.expect("verdict"));
    }

    #[test]
    fn checksum_match_wins_regardless_of_mtime() {
        let home = TempDir::new().expect("tempdir");
        let path = write(&home, "style.css", "body { color: red }");
        let remote = RemoteStat {
            checksum: Some(md5_hex(b"body { color: red }")),
            size: Some(0),
            updated_at: Some(Utc::now() + Duration::days(365)),
        };
        assert!(is_probably_same(&path, &remote).expect("verdict"));
    }

    #[test]
    fn size_and_fresh_mtime_count_as_same() {
        let home = TempDir::new().expect("tempdir");
        let content = "hello world";
        let path = write(&home, "greeting.txt", content);
        let remote = RemoteStat {
            checksum: None,
            size: Some(content.len() as u64),
            updated_at: Some(Utc::now() - Duration::hours(1)),
        };
        assert!(is_probably_same(&path, &remote).expect("verdict"));
    }

    #[test]
    fn stale_mtime_is_not_same() {
        let home = TempDir::new().expect("tempdir");
        let content = "hello world";
        let path = write(&home, "greeting.txt", content);
        filetime::set_file_mtime(&path, FileTime::from_unix_time(1_000_000, 0)).expect("mtime");
        let remote = RemoteStat {
            checksum: None,
            size: Some(content.len() as u64),
            updated_at: Some(Utc::now()),
        };
        assert!(!is_probably_same(&path, &remote).expect("verdict"));
    }

    #[test]
    fn mtime_grace_tolerates_small_skew() {
        let home = TempDir::new().expect("tempdir");
        let content = "hello world";
        let path = write(&home, "greeting.txt", content);
        let remote = RemoteStat {
            checksum: None,
            size: Some(content.len() as u64),
            updated_at: Some(Utc::now() + Duration::minutes(4)),
        };
        assert!(is_probably_same(&path, &remote).expect("verdict"));
    }

    #[test]
    fn json_size_uses_compact_form_with_escaped_slashes() {
        let home = TempDir::new().expect("tempdir");
        // Pretty-printed locally; remote counts {"url":"a/b"} plus one escape.
        let path = write(&home, "settings.json", "{\n  \"url\": \"a/b\"\n}\n");
        let remote = RemoteStat {
            checksum: None,
            size: Some("{\"url\":\"a/b\"}".len() as u64 + 1),
            updated_at: Some(Utc::now() - Duration::hours(1)),
        };
        assert!(is_probably_same(&path, &remote).expect("verdict"));
    }

    #[test]
    fn unparsable_local_json_is_not_same() {
        let home = TempDir::new().expect("tempdir");
        let path = write(&home, "broken.json", "{not json");
        let remote = RemoteStat {
            checksum: None,
            size: Some(9),
            updated_at: Some(Utc::now() - Duration::hours(1)),
        };
        assert!(!is_probably_same(&path, &remote).expect("verdict"));
    }

    #[test]
    fn size_mismatch_is_not_same() {
        let home = TempDir::new().expect("tempdir");
        let path = write(&home, "greeting.txt", "hello world");
        let remote = RemoteStat {
            checksum: None,
            size: Some(999),
            updated_at: Some(Utc::now() - Duration::hours(1)),
        };
        assert!(!is_probably_same(&path, &remote).expect("verdict"));
    }
}
