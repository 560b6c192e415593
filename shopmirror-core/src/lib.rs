//! # shopmirror-core
//!
//! Leaf building blocks for the shopmirror sync engine:
//! - [`canon`] — deterministic, key-sorted canonical JSON rendering, used for
//!   stable on-disk formatting and for structural equality tests
//! - [`fingerprint`] — checksum/size/mtime cheap-equality heuristic
//! - [`ignore`] — `.shopifyignore` glob compilation and the per-invocation
//!   ignore-rule cache
//! - [`files`] — tolerant local tree scanning and atomic file writes

pub mod canon;
pub mod error;
pub mod files;
pub mod fingerprint;
pub mod ignore;

pub use canon::{is_same, strip_fields, to_canonical_string, FormatOptions, KeyOrder};
pub use error::CoreError;
pub use fingerprint::RemoteStat;
pub use ignore::IgnoreCache;
