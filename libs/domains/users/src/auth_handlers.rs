//! HTTP handlers for registration, login, token rotation, and password reset.
//! These routes are public; the login gate itself decides who gets in.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use axum_helpers::{
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, ForbiddenResponse,
        InternalServerErrorResponse, UnauthorizedResponse,
    },
    ValidatedJson,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::UserResult;
use crate::models::{
    AuthResponse, LoginRequest, RefreshRequest, RegisterUser, RequestPasswordReset, ResetPassword,
    UserResponse, UserStatus,
};
use crate::repository::{TokenStore, UserRepository};
use crate::service::UserService;
use domain_subscriptions::repository::SubscriptionRepository;

/// OpenAPI documentation for the authentication endpoints
#[derive(OpenApi)]
#[openapi(
    paths(register, login, refresh, logout, request_password_reset, reset_password),
    components(
        schemas(
            RegisterUser, LoginRequest, RefreshRequest, RequestPasswordReset, ResetPassword,
            AuthResponse, UserResponse, UserStatus
        ),
        responses(
            BadRequestValidationResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Auth", description = "Registration and authentication endpoints")
    )
)]
pub struct AuthApiDoc;

/// Create the public authentication router
pub fn auth_router<R, T, S>(service: UserService<R, T, S>) -> Router
where
    R: UserRepository + 'static,
    T: TokenStore + 'static,
    S: SubscriptionRepository + 'static,
{
    let shared_service = Arc::new(service);

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/password-reset/request", post(request_password_reset))
        .route("/password-reset/confirm", post(reset_password))
        .with_state(shared_service)
}

/// Register a new client or supplier account
#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "Account created, awaiting admin activation", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn register<R, T, S>(
    State(service): State<Arc<UserService<R, T, S>>>,
    ValidatedJson(input): ValidatedJson<RegisterUser>,
) -> UserResult<impl IntoResponse>
where
    R: UserRepository,
    T: TokenStore,
    S: SubscriptionRepository,
{
    let user = service.register(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in and receive an access/refresh token pair
#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn login<R, T, S>(
    State(service): State<Arc<UserService<R, T, S>>>,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> UserResult<Json<AuthResponse>>
where
    R: UserRepository,
    T: TokenStore,
    S: SubscriptionRepository,
{
    let auth = service.login(input).await?;
    Ok(Json(auth))
}

/// Rotate a refresh token for a fresh pair
#[utoipa::path(
    post,
    path = "/refresh",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = AuthResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn refresh<R, T, S>(
    State(service): State<Arc<UserService<R, T, S>>>,
    ValidatedJson(input): ValidatedJson<RefreshRequest>,
) -> UserResult<Json<AuthResponse>>
where
    R: UserRepository,
    T: TokenStore,
    S: SubscriptionRepository,
{
    let auth = service.refresh(&input.refresh_token).await?;
    Ok(Json(auth))
}

/// Invalidate a refresh token
#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 204, description = "Refresh token invalidated"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn logout<R, T, S>(
    State(service): State<Arc<UserService<R, T, S>>>,
    ValidatedJson(input): ValidatedJson<RefreshRequest>,
) -> UserResult<impl IntoResponse>
where
    R: UserRepository,
    T: TokenStore,
    S: SubscriptionRepository,
{
    service.logout(&input.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Ask for a password reset email
#[utoipa::path(
    post,
    path = "/password-reset/request",
    tag = "Auth",
    request_body = RequestPasswordReset,
    responses(
        (status = 204, description = "Reset email sent if the address exists"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn request_password_reset<R, T, S>(
    State(service): State<Arc<UserService<R, T, S>>>,
    ValidatedJson(input): ValidatedJson<RequestPasswordReset>,
) -> UserResult<impl IntoResponse>
where
    R: UserRepository,
    T: TokenStore,
    S: SubscriptionRepository,
{
    service.request_password_reset(&input.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Complete a password reset with an emailed token
#[utoipa::path(
    post,
    path = "/password-reset/confirm",
    tag = "Auth",
    request_body = ResetPassword,
    responses(
        (status = 204, description = "Password updated"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn reset_password<R, T, S>(
    State(service): State<Arc<UserService<R, T, S>>>,
    ValidatedJson(input): ValidatedJson<ResetPassword>,
) -> UserResult<impl IntoResponse>
where
    R: UserRepository,
    T: TokenStore,
    S: SubscriptionRepository,
{
    service.reset_password(&input.token, &input.new_password).await?;
    Ok(StatusCode::NO_CONTENT)
}
