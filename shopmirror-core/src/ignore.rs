//! `.shopifyignore` handling.
//!
//! Ignore rules are shell-style globs, one per line, compiled to anchored
//! case-insensitive regexes. Rule files are read lazily and cached for the
//! lifetime of an [`IgnoreCache`], so a single pull or push sees one
//! consistent rule set per directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::error::CoreError;

/// Name of the per-tree ignore rule file.
pub const IGNORE_FILE: &str = ".shopifyignore";

/// Compile one glob pattern to a matching regex.
///
/// Supported syntax: `*` (within a path segment), `**` (across segments),
/// `{a,b}` alternation. A trailing `/` is stripped, and every pattern also
/// matches any path below it. Patterns containing `/` anchor at the start of
/// the path; bare patterns like `*.json` anchor at any segment boundary, so
/// they match at every depth.
pub fn glob_to_regex(pattern: &str) -> Result<Regex, CoreError> {
    let trimmed = pattern.strip_suffix('/').unwrap_or(pattern);
    let anchor = if trimmed.contains('/') { "^" } else { "(?:^|/)" };

    let mut expr = String::with_capacity(trimmed.len() + 16);
    expr.push_str(anchor);
    // `{` opens an alternation group only when a closer follows, and `,`
    // alternates only inside a group; stray braces and commas are literals.
    let mut depth = 0usize;
    let mut chars = trimmed.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '*' => {
                if chars.peek().map(|(_, next)| *next) == Some('*') {
                    chars.next();
                    expr.push_str(".*");
                } else {
                    expr.push_str("[^/]*");
                }
            }
            '{' if trimmed[i + 1..].contains('}') => {
                depth += 1;
                expr.push_str("(?:");
            }
            ',' if depth > 0 => expr.push('|'),
            '}' if depth > 0 => {
                depth -= 1;
                expr.push(')');
            }
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push_str("(?:$|/)");

    RegexBuilder::new(&expr)
        .case_insensitive(true)
        .build()
        .map_err(|source| CoreError::Pattern {
            pattern: pattern.to_owned(),
            source,
        })
}

/// Lazily loaded, per-directory ignore rules.
///
/// Constructed fresh for each pull/push invocation; never shared across
/// invocations, so edits to a rule file take effect on the next run.
#[derive(Debug, Default)]
pub struct IgnoreCache {
    rules: HashMap<PathBuf, Vec<Regex>>,
}

impl IgnoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Does any rule under `base_dir` match the forward-slash `relative` path?
    pub fn matches(&mut self, base_dir: &Path, relative: &str) -> Result<bool, CoreError> {
        if !self.rules.contains_key(base_dir) {
            let rules = load_rules(base_dir)?;
            self.rules.insert(base_dir.to_path_buf(), rules);
        }
        let rules = &self.rules[base_dir];
        Ok(rules.iter().any(|rule| rule.is_match(relative)))
    }
}

fn load_rules(base_dir: &Path) -> Result<Vec<Regex>, CoreError> {
    let path = base_dir.join(IGNORE_FILE);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(crate::error::io_err(path, err)),
    };

    let mut rules = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        rules.push(glob_to_regex(line)?);
    }
    debug!(dir = %base_dir.display(), rules = rules.len(), "loaded ignore rules");
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn matches(pattern: &str, path: &str) -> bool {
        glob_to_regex(pattern).expect("compile").is_match(path)
    }

    #[test]
    fn bare_star_pattern_matches_at_any_depth() {
        assert!(matches("*.json", "a.json"));
        assert!(matches("*.json", "templates/a.json"));
        assert!(!matches("*.json", "a.json.bak"));
        assert!(!matches("*.json", "a.jsonx"));
    }

    #[test]
    fn star_does_not_cross_segments() {
        assert!(matches("assets/*.png", "assets/logo.png"));
        assert!(!matches("assets/*.png", "assets/sub/logo.png"));
    }

    #[test]
    fn double_star_crosses_segments() {
        assert!(matches("assets/**.png", "assets/sub/logo.png"));
        assert!(matches("**", "anything/at/all"));
    }

    #[test]
    fn alternation_expands_to_group() {
        assert!(matches("{a,b}/*", "a/x"));
        assert!(matches("{a,b}/*", "b/y"));
        assert!(!matches("{a,b}/*", "c/x"));
    }

    #[test]
    fn comma_outside_braces_is_a_literal() {
        assert!(matches("a,b", "a,b"));
        assert!(!matches("a,b", "a"));
        assert!(!matches("a,b", "b"));
        assert!(matches("{a,b}/x,y", "a/x,y"));
        assert!(!matches("{a,b}/x,y", "a/x"));
    }

    #[test]
    fn unbalanced_braces_are_literals() {
        assert!(matches("weird}name", "weird}name"));
        assert!(!matches("weird}name", "weirdname"));
        assert!(matches("open{only", "open{only"));
    }

    #[test]
    fn trailing_slash_matches_directory_subtree() {
        assert!(matches("drafts/", "drafts"));
        assert!(matches("drafts/", "drafts/page.json"));
        assert!(!matches("drafts/", "drafts-old/page.json"));
    }

    #[test]
    fn slashed_pattern_anchors_at_start() {
        assert!(matches("config/settings*", "config/settings_data.json"));
        assert!(!matches("config/settings*", "backup/config/settings_data.json"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(matches("*.PNG", "assets/logo.png"));
    }

    #[test]
    fn regex_specials_in_literals_are_escaped() {
        assert!(matches("a.b", "a.b"));
        assert!(!matches("a.b", "axb"));
        assert!(matches("file (1).txt", "file (1).txt"));
    }

    #[test]
    fn cache_reads_rule_file_once_and_skips_comments() {
        let home = TempDir::new().expect("tempdir");
        std::fs::write(
            home.path().join(IGNORE_FILE),
            "# local-only files\n*.bak\n\nnotes/\n",
        )
        .expect("write rules");

        let mut cache = IgnoreCache::new();
        assert!(cache.matches(home.path(), "templates/index.bak").expect("match"));
        assert!(cache.matches(home.path(), "notes/todo.txt").expect("match"));
        assert!(!cache.matches(home.path(), "templates/index.liquid").expect("match"));

        // Later edits are invisible to the same cache instance.
        std::fs::write(home.path().join(IGNORE_FILE), "*.liquid\n").expect("rewrite");
        assert!(!cache.matches(home.path(), "templates/index.liquid").expect("match"));
    }

    #[test]
    fn missing_rule_file_ignores_nothing() {
        let home = TempDir::new().expect("tempdir");
        let mut cache = IgnoreCache::new();
        assert!(!cache.matches(home.path(), "anything.json").expect("match"));
    }
}
