use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::models::Story;
use crate::service::TopStories;

#[derive(Serialize)]
struct TopStoriesResponse<'a> {
    count: usize,
    stories: &'a [Story],
    built_at: DateTime<Utc>,
    build_ms: u64,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match self {
            ServiceError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": "Failed to load top stories" }))).into_response()
    }
}

pub fn router(service: Arc<TopStories>) -> Router {
    Router::new()
        .route("/", get(top_stories))
        .route("/top", get(top_stories))
        .route("/healthz", get(health))
        .with_state(service)
}

async fn top_stories(State(service): State<Arc<TopStories>>) -> Result<Response, ServiceError> {
    let list = service.top_stories().await?;
    let body = TopStoriesResponse {
        count: list.stories.len(),
        stories: &list.stories,
        built_at: list.built_at,
        build_ms: list.build_ms,
    };
    Ok(Json(body).into_response())
}

async fn health(State(service): State<Arc<TopStories>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "cache_warm": service.cache().is_warm(),
    }))
}
