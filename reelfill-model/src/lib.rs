//! Core data model definitions shared across reelfill crates.
#![allow(missing_docs)]

pub mod identity;
pub mod image;
pub mod merge;
pub mod record;

// Intentionally curated re-exports for downstream consumers.
pub use identity::MovieIdentity;
pub use image::{BackdropSize, PosterSize};
pub use merge::merge;
pub use record::{
    FieldValue, MetadataField, MovieRecord, leading_year, split_names,
};
