//! HTTP handlers for the Stats API

use axum::{extract::State, routing::get, Json, Router};
use axum_helpers::errors::responses::{
    ForbiddenResponse, InternalServerErrorResponse, UnauthorizedResponse,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::StatsResult;
use crate::models::{Dashboard, MonthlyRevenue, StatusCount, TopProduct, TopSupplier, UserCounts};
use crate::repository::StatsRepository;
use crate::service::StatsService;

/// OpenAPI documentation for Stats API
#[derive(OpenApi)]
#[openapi(
    paths(dashboard),
    components(
        schemas(Dashboard, StatusCount, UserCounts, TopProduct, TopSupplier, MonthlyRevenue),
        responses(
            UnauthorizedResponse,
            ForbiddenResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Stats", description = "Admin dashboard aggregation endpoints")
    )
)]
pub struct ApiDoc;

/// Create the stats router (admin only; role is enforced by the route layer)
pub fn router<S: StatsRepository + 'static>(service: StatsService<S>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/dashboard", get(dashboard))
        .with_state(shared_service)
}

/// Recompute and return the admin dashboard
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "Stats",
    responses(
        (status = 200, description = "Dashboard figures", body = Dashboard),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn dashboard<S: StatsRepository>(
    State(service): State<Arc<StatsService<S>>>,
) -> StatsResult<Json<Dashboard>> {
    let dashboard = service.dashboard().await?;
    Ok(Json(dashboard))
}
