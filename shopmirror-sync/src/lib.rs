//! # shopmirror-sync
//!
//! The reconciliation engine: compares the remote store (authoritative
//! collections of theme assets, redirects, script tags, pages and blog
//! articles) against a local file tree and drives one side to mirror the
//! other.
//!
//! - `pull` makes the local tree mirror the remote, deleting local leftovers;
//! - `push` makes the remote mirror the local tree (create / update / delete);
//! - both honour `--dry-run` (report, touch nothing) and `--force` (skip the
//!   cheap-equality fingerprint and transfer everything).
//!
//! Entry points live in [`pipeline`]; the per-resource modules each own one
//! remote collection's mapping to files.

pub mod articles;
pub mod assets;
pub mod content;
pub mod engine;
pub mod error;
pub mod pages;
pub mod pipeline;
pub mod plan;
pub mod redirects;
pub mod scripts;
pub mod theme;

pub use error::SyncError;
pub use pipeline::{pull, push, PullReport, PushReport, SyncOptions};
pub use plan::{PullOutcome, PushOutcome};
