//! Request and response bodies of the JSON API.
//!
//! Every response is wrapped in an [`ApiEnvelope`]:
//!
//! ```json
//! { "code": 0, "errmsg": "success", "payload": { "items": [ ... ] } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mediacat_core::defaults;
use mediacat_core::{MediaKind, SearchQuery};

/// Request handled successfully.
pub const CODE_SUCCESS: i32 = 0;
/// The request was well formed but cannot be served (e.g. unknown metadata type).
pub const CODE_USER_ERROR: i32 = 1;
/// Server-side failure.
pub const CODE_SYSTEM_ERROR: i32 = 2;
/// The request body did not have the expected shape.
pub const CODE_INVALID_REQUEST: i32 = 1000;

/// `POST /api/search` and `POST /api/gethint` body, generic over the
/// route's `query` object.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaRequest<Q> {
    #[serde(rename = "type")]
    pub media_type: MediaKind,
    pub query: Q,
}

pub type SearchRequest = MediaRequest<SearchParams>;
pub type HintRequest = MediaRequest<HintParams>;

/// The `query` object of `/api/search`. Everything but `offset` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    #[serde(alias = "term")]
    pub terms: Vec<String>,
    pub metadata: BTreeMap<String, Vec<String>>,
    pub limit: i64,
    /// Accepted for compatibility; results are not paged.
    #[serde(default)]
    pub offset: Option<i64>,
}

impl SearchParams {
    pub fn into_search_query(self) -> SearchQuery {
        SearchQuery {
            terms: self.terms,
            metadata: self.metadata,
            limit: self.limit,
        }
    }
}

/// The `query` object of `/api/gethint`. Any `metadata` sent is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct HintParams {
    #[serde(alias = "term")]
    pub terms: Vec<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl HintParams {
    pub fn into_hint_query(self) -> SearchQuery {
        SearchQuery::new()
            .with_terms(self.terms)
            .with_limit(self.limit.unwrap_or(defaults::HINT_LIMIT))
    }
}

/// A list payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Items<T> {
    pub items: Vec<T>,
}

impl<T> Items<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

/// Uniform response wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i32,
    pub errmsg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn success(payload: T) -> Self {
        Self {
            code: CODE_SUCCESS,
            errmsg: "success".to_string(),
            payload: Some(payload),
        }
    }
}

impl ApiEnvelope<()> {
    pub fn failure(code: i32, errmsg: impl Into<String>) -> Self {
        Self {
            code,
            errmsg: errmsg.into(),
            payload: None,
        }
    }
}
