//! # shopmirror-remote
//!
//! The remote half of shopmirror: typed models for the store's admin REST
//! resources, the [`ShopClient`] trait the sync engine is written against,
//! and the HTTP implementation ([`rest::RestClient`]) with its peek-then-count
//! pagination.

pub mod api;
pub mod error;
pub mod paging;
pub mod rest;
pub mod types;

pub use api::{AssetUpload, ShopClient};
pub use error::RemoteError;
pub use rest::RestClient;
pub use types::{Article, Asset, Blog, Page, Redirect, ScriptTag, Theme};
