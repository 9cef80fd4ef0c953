//! HTTP handlers for the Notifications API

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use axum_helpers::{
    errors::responses::{
        BadRequestUuidResponse, InternalServerErrorResponse, NotFoundResponse,
        UnauthorizedResponse,
    },
    CurrentUser, UuidPath,
};
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::{NotificationError, NotificationResult};
use crate::models::Notification;
use crate::repository::NotificationRepository;
use crate::service::NotificationService;

/// OpenAPI documentation for Notifications API
#[derive(OpenApi)]
#[openapi(
    paths(list_notifications, unread_count, mark_read, mark_all_read),
    components(
        schemas(
            Notification,
            crate::models::NotificationKind,
            NotificationFeed,
            NotificationFeedData
        ),
        responses(
            NotFoundResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Notifications", description = "Per-user notification feed endpoints")
    )
)]
pub struct ApiDoc;

/// Create the notifications router with all HTTP endpoints
pub fn router<R: NotificationRepository + 'static>(service: NotificationService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/read-all", put(mark_all_read))
        .route("/{id}/read", put(mark_read))
        .with_state(shared_service)
}

/// Feed query parameters
#[derive(Debug, serde::Deserialize, utoipa::IntoParams)]
pub struct FeedQuery {
    /// Hide already-acknowledged notifications (the default)
    #[serde(default = "default_unread_only", rename = "unreadOnly")]
    pub unread_only: bool,
}

fn default_unread_only() -> bool {
    true
}

/// Feed response envelope
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct NotificationFeed {
    pub success: bool,
    pub data: NotificationFeedData,
}

/// Feed payload: the page plus the badge count
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct NotificationFeedData {
    pub notifications: Vec<Notification>,
    #[serde(rename = "unreadCount")]
    pub unread_count: u64,
}

fn caller_id(user: &CurrentUser) -> NotificationResult<Uuid> {
    user.0
        .user_id()
        .map_err(|e| NotificationError::Internal(format!("Invalid token subject: {e}")))
}

/// List the caller's notifications, newest first (unread only by default)
#[utoipa::path(
    get,
    path = "",
    tag = "Notifications",
    params(FeedQuery),
    responses(
        (status = 200, description = "Notification feed", body = NotificationFeed),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_notifications<R: NotificationRepository>(
    State(service): State<Arc<NotificationService<R>>>,
    user: CurrentUser,
    Query(query): Query<FeedQuery>,
) -> NotificationResult<Json<NotificationFeed>> {
    let receiver_id = caller_id(&user)?;
    let notifications = service.feed(receiver_id, query.unread_only).await?;
    let unread_count = service.unread_count(receiver_id).await?;
    Ok(Json(NotificationFeed {
        success: true,
        data: NotificationFeedData {
            notifications,
            unread_count,
        },
    }))
}

/// Count the caller's unread notifications
#[utoipa::path(
    get,
    path = "/unread-count",
    tag = "Notifications",
    responses(
        (status = 200, description = "Unread notification count", body = u64),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn unread_count<R: NotificationRepository>(
    State(service): State<Arc<NotificationService<R>>>,
    user: CurrentUser,
) -> NotificationResult<Json<u64>> {
    let receiver_id = caller_id(&user)?;
    let count = service.unread_count(receiver_id).await?;
    Ok(Json(count))
}

/// Mark one of the caller's notifications as read
#[utoipa::path(
    put,
    path = "/{id}/read",
    tag = "Notifications",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 204, description = "Notification marked read"),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn mark_read<R: NotificationRepository>(
    State(service): State<Arc<NotificationService<R>>>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
) -> NotificationResult<impl IntoResponse> {
    let receiver_id = caller_id(&user)?;
    service.mark_read(receiver_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark all of the caller's notifications as read
#[utoipa::path(
    put,
    path = "/read-all",
    tag = "Notifications",
    responses(
        (status = 200, description = "Number of notifications marked read", body = u64),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn mark_all_read<R: NotificationRepository>(
    State(service): State<Arc<NotificationService<R>>>,
    user: CurrentUser,
) -> NotificationResult<Json<u64>> {
    let receiver_id = caller_id(&user)?;
    let changed = service.mark_all_read(receiver_id).await?;
    Ok(Json(changed))
}
