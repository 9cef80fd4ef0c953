//! HTTP handlers for profile self-service and admin account management

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
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
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{
    ChangePassword, UpdateProfile, UpdateUserStatus, UserFilter, UserResponse, UserStatus,
};
use crate::repository::{TokenStore, UserRepository};
use crate::service::UserService;
use domain_subscriptions::repository::SubscriptionRepository;

/// OpenAPI documentation for profile and account management endpoints
#[derive(OpenApi)]
#[openapi(
    paths(
        get_profile,
        update_profile,
        change_password,
        list_users,
        get_user,
        update_user_status,
        delete_user,
    ),
    components(
        schemas(
            UserResponse, UserStatus, UpdateProfile, ChangePassword, UpdateUserStatus, UserFilter
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
        (name = "Users", description = "Profile and account management endpoints")
    )
)]
pub struct ApiDoc;

/// Create the authenticated profile router (any role)
pub fn profile_router<R, T, S>(service: UserService<R, T, S>) -> Router
where
    R: UserRepository + 'static,
    T: TokenStore + 'static,
    S: SubscriptionRepository + 'static,
{
    let shared_service = Arc::new(service);

    Router::new()
        .route("/me", get(get_profile).put(update_profile))
        .route("/me/password", put(change_password))
        .with_state(shared_service)
}

/// Create the admin account-management router
pub fn admin_router<R, T, S>(service: UserService<R, T, S>) -> Router
where
    R: UserRepository + 'static,
    T: TokenStore + 'static,
    S: SubscriptionRepository + 'static,
{
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user).delete(delete_user))
        .route("/{id}/status", put(update_user_status))
        .with_state(shared_service)
}

fn caller_id(user: &CurrentUser) -> UserResult<Uuid> {
    user.0
        .user_id()
        .map_err(|e| UserError::Internal(format!("Invalid token subject: {e}")))
}

/// Get the caller's profile
#[utoipa::path(
    get,
    path = "/me",
    tag = "Users",
    responses(
        (status = 200, description = "Caller profile", body = UserResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_profile<R, T, S>(
    State(service): State<Arc<UserService<R, T, S>>>,
    user: CurrentUser,
) -> UserResult<Json<UserResponse>>
where
    R: UserRepository,
    T: TokenStore,
    S: SubscriptionRepository,
{
    let id = caller_id(&user)?;
    let profile = service.profile(id).await?;
    Ok(Json(profile))
}

/// Update the caller's profile
#[utoipa::path(
    put,
    path = "/me",
    tag = "Users",
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_profile<R, T, S>(
    State(service): State<Arc<UserService<R, T, S>>>,
    user: CurrentUser,
    ValidatedJson(input): ValidatedJson<UpdateProfile>,
) -> UserResult<Json<UserResponse>>
where
    R: UserRepository,
    T: TokenStore,
    S: SubscriptionRepository,
{
    let id = caller_id(&user)?;
    let profile = service.update_profile(id, input).await?;
    Ok(Json(profile))
}

/// Change the caller's password
#[utoipa::path(
    put,
    path = "/me/password",
    tag = "Users",
    request_body = ChangePassword,
    responses(
        (status = 204, description = "Password changed, refresh tokens revoked"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn change_password<R, T, S>(
    State(service): State<Arc<UserService<R, T, S>>>,
    user: CurrentUser,
    ValidatedJson(input): ValidatedJson<ChangePassword>,
) -> UserResult<impl IntoResponse>
where
    R: UserRepository,
    T: TokenStore,
    S: SubscriptionRepository,
{
    let id = caller_id(&user)?;
    service
        .change_password(id, &input.current_password, &input.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List accounts (admin)
#[utoipa::path(
    get,
    path = "",
    tag = "Users",
    params(UserFilter),
    responses(
        (status = 200, description = "List of accounts", body = Vec<UserResponse>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<R, T, S>(
    State(service): State<Arc<UserService<R, T, S>>>,
    Query(filter): Query<UserFilter>,
) -> UserResult<Json<Vec<UserResponse>>>
where
    R: UserRepository,
    T: TokenStore,
    S: SubscriptionRepository,
{
    let users = service.list_users(filter).await?;
    Ok(Json(users))
}

/// Get one account (admin)
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Account found", body = UserResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_user<R, T, S>(
    State(service): State<Arc<UserService<R, T, S>>>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<UserResponse>>
where
    R: UserRepository,
    T: TokenStore,
    S: SubscriptionRepository,
{
    let user = service.get_user(id).await?;
    Ok(Json(user))
}

/// Activate or deactivate an account (admin)
#[utoipa::path(
    put,
    path = "/{id}/status",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserStatus,
    responses(
        (status = 200, description = "Status updated", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_user_status<R, T, S>(
    State(service): State<Arc<UserService<R, T, S>>>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateUserStatus>,
) -> UserResult<Json<UserResponse>>
where
    R: UserRepository,
    T: TokenStore,
    S: SubscriptionRepository,
{
    let user = service.set_user_status(id, input.status).await?;
    Ok(Json(user))
}

/// Delete an account (admin)
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<R, T, S>(
    State(service): State<Arc<UserService<R, T, S>>>,
    UuidPath(id): UuidPath,
) -> UserResult<impl IntoResponse>
where
    R: UserRepository,
    T: TokenStore,
    S: SubscriptionRepository,
{
    service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
