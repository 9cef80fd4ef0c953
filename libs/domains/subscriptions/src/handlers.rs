//! HTTP handlers for the Subscriptions API (admin only; role is enforced by
//! the route layer in the API app)

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use axum_helpers::{
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    CurrentUser, UuidPath, ValidatedJson,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{SubscriptionError, SubscriptionResult};
use crate::models::{
    CreateSubscription, CurrentSubscription, Subscription, SubscriptionStatus, UpdateSubscription,
};
use crate::repository::SubscriptionRepository;
use crate::service::SubscriptionService;

/// OpenAPI documentation for Subscriptions API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_subscriptions,
        grant_subscription,
        get_subscription,
        update_subscription,
        revoke_subscription,
        my_subscription,
    ),
    components(
        schemas(
            Subscription, SubscriptionStatus, CurrentSubscription, CreateSubscription,
            UpdateSubscription
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Subscriptions", description = "Subscription window management endpoints")
    )
)]
pub struct ApiDoc;

/// Create the subscriptions router with all HTTP endpoints
pub fn router<R: SubscriptionRepository + 'static>(service: SubscriptionService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_subscriptions).post(grant_subscription))
        .route(
            "/{id}",
            get(get_subscription)
                .put(update_subscription)
                .delete(revoke_subscription),
        )
        .with_state(shared_service)
}

/// Create the user-facing router; merged into the same mount as the admin
/// router but carrying a different role policy
pub fn me_router<R: SubscriptionRepository + 'static>(service: SubscriptionService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/me", get(my_subscription))
        .with_state(shared_service)
}

/// Pagination query parameters
#[derive(Debug, serde::Deserialize, utoipa::IntoParams)]
pub struct PageQuery {
    /// Maximum number of results
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Number of results to skip
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> i64 {
    50
}

/// List subscriptions
#[utoipa::path(
    get,
    path = "",
    tag = "Subscriptions",
    params(PageQuery),
    responses(
        (status = 200, description = "List of subscriptions", body = Vec<Subscription>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_subscriptions<R: SubscriptionRepository>(
    State(service): State<Arc<SubscriptionService<R>>>,
    Query(page): Query<PageQuery>,
) -> SubscriptionResult<Json<Vec<Subscription>>> {
    let subscriptions = service.list(page.limit, page.offset).await?;
    Ok(Json(subscriptions))
}

/// Grant a new subscription window to a user
#[utoipa::path(
    post,
    path = "",
    tag = "Subscriptions",
    request_body = CreateSubscription,
    responses(
        (status = 201, description = "Subscription granted", body = Subscription),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn grant_subscription<R: SubscriptionRepository>(
    State(service): State<Arc<SubscriptionService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateSubscription>,
) -> SubscriptionResult<impl IntoResponse> {
    let subscription = service.grant(input).await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

/// Get a subscription by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Subscriptions",
    params(
        ("id" = Uuid, Path, description = "Subscription ID")
    ),
    responses(
        (status = 200, description = "Subscription found", body = Subscription),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_subscription<R: SubscriptionRepository>(
    State(service): State<Arc<SubscriptionService<R>>>,
    UuidPath(id): UuidPath,
) -> SubscriptionResult<Json<Subscription>> {
    let subscription = service.get(id).await?;
    Ok(Json(subscription))
}

/// Update a subscription window
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Subscriptions",
    params(
        ("id" = Uuid, Path, description = "Subscription ID")
    ),
    request_body = UpdateSubscription,
    responses(
        (status = 200, description = "Subscription updated", body = Subscription),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_subscription<R: SubscriptionRepository>(
    State(service): State<Arc<SubscriptionService<R>>>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateSubscription>,
) -> SubscriptionResult<Json<Subscription>> {
    let subscription = service.update(id, input).await?;
    Ok(Json(subscription))
}

/// Revoke (delete) a subscription
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Subscriptions",
    params(
        ("id" = Uuid, Path, description = "Subscription ID")
    ),
    responses(
        (status = 204, description = "Subscription revoked"),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn revoke_subscription<R: SubscriptionRepository>(
    State(service): State<Arc<SubscriptionService<R>>>,
    UuidPath(id): UuidPath,
) -> SubscriptionResult<impl IntoResponse> {
    service.revoke(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get the caller's current subscription with the days remaining
#[utoipa::path(
    get,
    path = "/me",
    tag = "Subscriptions",
    responses(
        (status = 200, description = "Current subscription", body = CurrentSubscription),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn my_subscription<R: SubscriptionRepository>(
    State(service): State<Arc<SubscriptionService<R>>>,
    user: CurrentUser,
) -> SubscriptionResult<Json<CurrentSubscription>> {
    let user_id = user
        .0
        .user_id()
        .map_err(|e| SubscriptionError::Internal(format!("Invalid token subject: {e}")))?;
    let summary = service.current_summary_for(user_id).await?;
    Ok(Json(summary))
}
