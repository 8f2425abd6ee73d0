//! # mediacat-core
//!
//! Core types, traits, and the search query language for the mediacat
//! media-library catalog.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the database and API crates depend on. Nothing in here talks to
//! PostgreSQL directly.

pub mod context;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod query;
pub mod search;
pub mod traits;

// Re-export commonly used types at crate root
pub use context::RequestContext;
pub use error::{Error, Result};
pub use models::*;
pub use query::{
    classify_terms, parse_metadata_key, split_metadata_values, ClassifiedTerms, MetadataKey,
    MetadataValues,
};
pub use search::{MetadataMatch, SearchConfig};
pub use traits::*;
