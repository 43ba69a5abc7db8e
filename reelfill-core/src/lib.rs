//! # reelfill core
//!
//! Enriches a personal movie database with metadata from external providers,
//! using each row's film-review link as the join key.
//!
//! ## Architecture
//!
//! - [`resolver`]: turns a review-site URL into a best-effort
//!   [`MovieIdentity`](reelfill_model::MovieIdentity)
//! - [`providers`]: OMDb (primary) and TMDb (secondary) clients behind the
//!   [`MetadataProvider`](providers::MetadataProvider) trait
//! - [`notion`]: the target database, behind the
//!   [`MovieStore`](notion::MovieStore) trait
//! - [`sync`]: the sequential driver that ties them together
//!
//! Every outbound call goes through one [`http::HttpClients`] built per run.
#![allow(missing_docs)]

/// Top-level error type
pub mod error;

/// Shared HTTP clients and credential dispatch
pub mod http;

/// Target database client and row decoding
pub mod notion;

/// External metadata providers
pub mod providers;

/// Review-site identity resolution
pub mod resolver;

/// Row-by-row synchronization driver
pub mod sync;

pub use error::{Result, SyncError};
