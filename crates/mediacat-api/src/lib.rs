//! # mediacat-api
//!
//! JSON HTTP API for the mediacat movie search.
//!
//! | Route                     | Purpose                                   |
//! |---------------------------|-------------------------------------------|
//! | `POST /api/search`        | fuzzy search with terms and metadata      |
//! | `POST /api/gethint`       | type-ahead search on title terms          |
//! | `GET /api/metadata-types` | metadata type catalog                     |
//! | `GET /health`             | liveness                                  |

pub mod api_types;
pub mod config;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use mediacat_core::{MetadataTypeRepository, MovieSearchRepository};
use mediacat_db::Database;

pub use api_types::{
    ApiEnvelope, HintParams, HintRequest, Items, MediaRequest, SearchParams, SearchRequest,
};
pub use config::{LogConfig, LogFormat, ServerConfig};
pub use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub movies: Arc<dyn MovieSearchRepository>,
    pub metadata_types: Arc<dyn MetadataTypeRepository>,
}

impl AppState {
    pub fn new(
        movies: Arc<dyn MovieSearchRepository>,
        metadata_types: Arc<dyn MetadataTypeRepository>,
    ) -> Self {
        Self {
            movies,
            metadata_types,
        }
    }

    pub fn from_database(db: &Database) -> Self {
        Self::new(
            Arc::new(db.movies.clone()),
            Arc::new(db.metadata_types.clone()),
        )
    }
}

/// Request ID generator producing UUIDv7 for time-ordered tracing.
#[derive(Clone, Copy)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/search", post(handlers::search))
        .route("/api/gethint", post(handlers::get_hint))
        .route("/api/metadata-types", get(handlers::list_metadata_types))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}
