//! Core traits for mediacat abstractions.
//!
//! These traits define the interfaces the PostgreSQL layer implements and the
//! API layer consumes, so handlers can be exercised without a database.

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::Result;
use crate::models::{MetadataTypeMap, RankedMovie, SearchQuery};

// =============================================================================
// SEARCH
// =============================================================================

/// Fuzzy, multi-criteria movie search.
#[async_trait]
pub trait MovieSearchRepository: Send + Sync {
    /// Rank movies against `query`, most relevant first, at most
    /// `query.limit` rows.
    ///
    /// Fails with `Error::InvalidMetadataType` when a metadata key is not in
    /// the catalog; no movie rows are read in that case.
    async fn fuzzy_search(
        &self,
        ctx: &RequestContext,
        query: &SearchQuery,
    ) -> Result<Vec<RankedMovie>>;
}

// =============================================================================
// METADATA TYPE CATALOG
// =============================================================================

/// Lookup of metadata type names to catalog identifiers.
#[async_trait]
pub trait MetadataTypeRepository: Send + Sync {
    /// Fetch the current mapping. Never cached.
    async fn fetch_all(&self) -> Result<MetadataTypeMap>;
}
