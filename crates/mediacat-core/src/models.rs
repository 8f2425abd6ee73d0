//! Catalog models shared by the database and API layers.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

/// Metadata type name (e.g. `"genre"`) to its catalog identifier.
pub type MetadataTypeMap = HashMap<String, i32>;

// =============================================================================
// SEARCH QUERY
// =============================================================================

/// A fuzzy movie search request.
///
/// `terms` use a small prefix language: `-batman` excludes movies titled
/// "batman", `+batman` or plain `batman` ranks titles by similarity.
/// `metadata` maps a metadata type name to values using the same `-` prefix
/// for exclusion; a key may itself be `-`-prefixed to negate its whole
/// constraint.
///
/// Metadata keys are iterated in sorted order, which fixes the order of the
/// bound parameters and keeps repeated searches identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub terms: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Vec<String>>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    defaults::SEARCH_LIMIT
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            terms: Vec::new(),
            metadata: BTreeMap::new(),
            limit: defaults::SEARCH_LIMIT,
        }
    }
}

impl SearchQuery {
    /// Create an empty query with the default limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the free-text terms.
    pub fn with_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms = terms.into_iter().map(Into::into).collect();
        self
    }

    /// Add (or replace) the values constraining one metadata type.
    pub fn with_metadata<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata
            .insert(key.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Set the maximum number of ranked candidates.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Total number of metadata values across every key.
    pub fn metadata_value_count(&self) -> usize {
        self.metadata.values().map(Vec::len).sum()
    }

    /// Reject requests that can never be served.
    pub fn validate(&self, max_limit: i64) -> Result<()> {
        if self.limit < 1 {
            return Err(Error::InvalidInput(format!(
                "limit must be at least 1, got {}",
                self.limit
            )));
        }
        if self.limit > max_limit {
            return Err(Error::InvalidInput(format!(
                "limit must be at most {}, got {}",
                max_limit, self.limit
            )));
        }
        let values = self.metadata_value_count();
        if values > defaults::MAX_METADATA_VALUES {
            return Err(Error::InvalidInput(format!(
                "too many metadata values: {} (maximum {})",
                values,
                defaults::MAX_METADATA_VALUES
            )));
        }
        Ok(())
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// One movie row from a fuzzy search, most relevant first.
///
/// `similarity` is in `[0, 1]`, or exactly `1.0` when the query carried no
/// ranking words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMovie {
    pub movie_id: i64,
    pub movie_title: String,
    pub release_year: Option<i32>,
    pub similarity: f64,
}

/// A metadata type from the catalog, as listed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataType {
    pub name: String,
    pub id: i32,
}

// =============================================================================
// MEDIA KIND
// =============================================================================

/// Kind of catalog item a search request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    All,
    Movie,
    Podcast,
    Song,
    TvShow,
}

impl MediaKind {
    /// Whether a search of this kind includes movies.
    pub fn includes_movies(self) -> bool {
        matches!(self, MediaKind::All | MediaKind::Movie)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::All => "all",
            MediaKind::Movie => "movie",
            MediaKind::Podcast => "podcast",
            MediaKind::Song => "song",
            MediaKind::TvShow => "tvshow",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(MediaKind::All),
            "movie" => Ok(MediaKind::Movie),
            "podcast" => Ok(MediaKind::Podcast),
            "song" => Ok(MediaKind::Song),
            "tvshow" => Ok(MediaKind::TvShow),
            other => Err(Error::InvalidInput(format!("unknown media type: {}", other))),
        }
    }
}
