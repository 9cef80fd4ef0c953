//! HTTP handlers for the Problems API

use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use axum_helpers::{
    auth::{require_role, Role},
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    CurrentUser, UuidPath, ValidatedJson,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{ProblemError, ProblemResult};
use crate::models::{CreateProblem, Problem, ProblemStatus};
use crate::repository::ProblemRepository;
use crate::service::ProblemService;
use domain_notifications::repository::NotificationRepository;
use domain_users::repository::UserRepository;

/// OpenAPI documentation for Problems API
#[derive(OpenApi)]
#[openapi(
    paths(report_problem, list_problems, get_problem, resolve_problem),
    components(
        schemas(Problem, ProblemStatus, CreateProblem),
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
        (name = "Problems", description = "Support ticket endpoints")
    )
)]
pub struct ApiDoc;

/// Create the problems router. Any authenticated caller can open a ticket;
/// triage routes carry the admin role policy.
pub fn router<P, U, N>(service: ProblemService<P, U, N>) -> Router
where
    P: ProblemRepository + 'static,
    U: UserRepository + 'static,
    N: NotificationRepository + 'static,
{
    let shared_service = Arc::new(service);
    let admin_only = || from_fn_with_state(Role::Admin, require_role);

    Router::new()
        .route(
            "/",
            post(report_problem).merge(get(list_problems).route_layer(admin_only())),
        )
        .route("/{id}", get(get_problem).route_layer(admin_only()))
        .route(
            "/{id}/resolve",
            put(resolve_problem).route_layer(admin_only()),
        )
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

/// Report a problem
#[utoipa::path(
    post,
    path = "",
    tag = "Problems",
    request_body = CreateProblem,
    responses(
        (status = 201, description = "Problem reported", body = Problem),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn report_problem<P, U, N>(
    State(service): State<Arc<ProblemService<P, U, N>>>,
    user: CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateProblem>,
) -> ProblemResult<impl IntoResponse>
where
    P: ProblemRepository,
    U: UserRepository,
    N: NotificationRepository,
{
    let user_id = user
        .0
        .user_id()
        .map_err(|e| ProblemError::Internal(format!("Invalid token subject: {e}")))?;
    let problem = service.report(user_id, user.0.email.clone(), input).await?;
    Ok((StatusCode::CREATED, Json(problem)))
}

/// List tickets (admin)
#[utoipa::path(
    get,
    path = "",
    tag = "Problems",
    params(PageQuery),
    responses(
        (status = 200, description = "List of problems", body = Vec<Problem>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_problems<P, U, N>(
    State(service): State<Arc<ProblemService<P, U, N>>>,
    Query(page): Query<PageQuery>,
) -> ProblemResult<Json<Vec<Problem>>>
where
    P: ProblemRepository,
    U: UserRepository,
    N: NotificationRepository,
{
    let problems = service.list(page.limit, page.offset).await?;
    Ok(Json(problems))
}

/// Get one ticket (admin)
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Problems",
    params(
        ("id" = Uuid, Path, description = "Problem ID")
    ),
    responses(
        (status = 200, description = "Problem found", body = Problem),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_problem<P, U, N>(
    State(service): State<Arc<ProblemService<P, U, N>>>,
    UuidPath(id): UuidPath,
) -> ProblemResult<Json<Problem>>
where
    P: ProblemRepository,
    U: UserRepository,
    N: NotificationRepository,
{
    let problem = service.get(id).await?;
    Ok(Json(problem))
}

/// Close a ticket (admin)
#[utoipa::path(
    put,
    path = "/{id}/resolve",
    tag = "Problems",
    params(
        ("id" = Uuid, Path, description = "Problem ID")
    ),
    responses(
        (status = 200, description = "Problem resolved", body = Problem),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn resolve_problem<P, U, N>(
    State(service): State<Arc<ProblemService<P, U, N>>>,
    UuidPath(id): UuidPath,
) -> ProblemResult<Json<Problem>>
where
    P: ProblemRepository,
    U: UserRepository,
    N: NotificationRepository,
{
    let problem = service.resolve(id).await?;
    Ok(Json(problem))
}
