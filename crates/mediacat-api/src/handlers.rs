//! HTTP handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use tracing::debug;
use uuid::Uuid;

use mediacat_core::{MediaKind, MetadataType, RankedMovie, RequestContext, SearchQuery};

use crate::api_types::{ApiEnvelope, HintRequest, Items, SearchRequest};
use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = Result<Json<ApiEnvelope<T>>, ApiError>;

/// Request context carrying the `x-request-id` assigned by the middleware.
fn request_context(headers: &HeaderMap) -> RequestContext {
    let ctx = RequestContext::new();
    match headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
    {
        Some(id) => ctx.with_request_id(id),
        None => ctx,
    }
}

async fn run_movie_search(
    state: &AppState,
    ctx: &RequestContext,
    media_type: MediaKind,
    query: SearchQuery,
    op: &'static str,
) -> ApiResult<Items<RankedMovie>> {
    debug!(
        subsystem = "api",
        component = "search",
        op,
        request_id = %ctx.request_id,
        %media_type,
        "Search request"
    );

    // Only movies are searchable; other kinds have nothing to return
    if !media_type.includes_movies() {
        return Ok(Json(ApiEnvelope::success(Items::new(Vec::new()))));
    }

    let movies = state.movies.fuzzy_search(ctx, &query).await?;
    Ok(Json(ApiEnvelope::success(Items::new(movies))))
}

/// `POST /api/search`
pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Items<RankedMovie>> {
    let Json(request) = body?;
    let ctx = request_context(&headers);
    let query = request.query.into_search_query();
    run_movie_search(&state, &ctx, request.media_type, query, "search").await
}

/// `POST /api/gethint`: title terms only, for type-ahead.
pub async fn get_hint(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<HintRequest>, JsonRejection>,
) -> ApiResult<Items<RankedMovie>> {
    let Json(request) = body?;
    let ctx = request_context(&headers);
    let query = request.query.into_hint_query();
    run_movie_search(&state, &ctx, request.media_type, query, "gethint").await
}

/// `GET /api/metadata-types`, sorted by name.
pub async fn list_metadata_types(State(state): State<AppState>) -> ApiResult<Items<MetadataType>> {
    let catalog = state.metadata_types.fetch_all().await?;
    let mut types: Vec<MetadataType> = catalog
        .into_iter()
        .map(|(name, id)| MetadataType { name, id })
        .collect();
    types.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(ApiEnvelope::success(Items::new(types))))
}

/// `GET /health`
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
