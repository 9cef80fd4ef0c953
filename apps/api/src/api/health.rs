//! Health check endpoints

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    database: String,
    mongodb: bool,
    response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Create a health check router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(state)
}

/// Readiness check: probes the MongoDB connection and reports timing
async fn readiness_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let mongo = database::mongodb::check_health_detailed(&state.mongo_client).await;

    Json(HealthResponse {
        status: if mongo.healthy { "ready" } else { "unhealthy" }.to_string(),
        database: state.db.name().to_string(),
        mongodb: mongo.healthy,
        response_time_ms: mongo.response_time_ms,
        error: mongo.message,
    })
}
