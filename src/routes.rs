use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, post};
use axum::{Json, Router};

use crate::engine::Aggregator;
use crate::error::AppError;
use crate::models::listing::{SearchQuery, SearchResponse};

pub fn router(aggregator: Arc<Aggregator>) -> Router {
    Router::new()
        .route("/search", post(search))
        .route("/cache", delete(clear_cache))
        .route("/quota/reset", post(reset_quota))
        .with_state(aggregator)
}

/// POST /api/v1/search
///
/// Run one aggregation request: cache lookup, quota-gated parallel
/// fetches, dedup, scoring. Returns the scored listings plus metadata.
async fn search(
    State(aggregator): State<Arc<Aggregator>>,
    Json(query): Json<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    if query.skills.is_empty() && query.role.as_deref().unwrap_or("").trim().is_empty() {
        return Err(AppError::BadRequest(
            "Provide at least one skill or a role".to_string(),
        ));
    }
    let response = aggregator.search(query).await?;
    Ok(Json(response))
}

/// DELETE /api/v1/cache — explicit cache clear.
async fn clear_cache(State(aggregator): State<Arc<Aggregator>>) -> impl IntoResponse {
    aggregator.cache().clear().await;
    StatusCode::NO_CONTENT
}

/// POST /api/v1/quota/reset
///
/// Entry point for the external daily scheduler.
async fn reset_quota(State(aggregator): State<Arc<Aggregator>>) -> impl IntoResponse {
    aggregator.quota().reset();
    StatusCode::NO_CONTENT
}
