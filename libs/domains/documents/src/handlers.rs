//! HTTP handlers for the paperwork ("papiers") API

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use axum_helpers::{
    auth::{require_role, Role},
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ConflictResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, PayloadTooLargeResponse,
        UnauthorizedResponse,
    },
    uploads::{save_field, DOCUMENT_UPLOAD},
    AppError, CurrentUser, UuidPath,
};
use std::path::PathBuf;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::{DocumentError, DocumentResult};
use crate::models::{BundleStatus, DocumentBundle};
use crate::repository::DocumentRepository;
use crate::service::DocumentService;
use domain_users::repository::UserRepository;

/// OpenAPI documentation for the paperwork API
#[derive(OpenApi)]
#[openapi(
    paths(submit_bundle, my_bundle, list_bundles, get_bundle, approve_bundle, reject_bundle),
    components(
        schemas(DocumentBundle, BundleStatus),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            ConflictResponse,
            PayloadTooLargeResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Papiers", description = "Identity paperwork submission and review endpoints")
    )
)]
pub struct ApiDoc;

/// Shared state for paperwork handlers
pub struct DocumentsState<D, U>
where
    D: DocumentRepository,
    U: UserRepository,
{
    pub service: DocumentService<D, U>,
    pub docs_dir: PathBuf,
}

/// Create the paperwork router. Submission and self-lookup are open to any
/// authenticated caller; review routes carry the admin role policy.
pub fn router<D, U>(service: DocumentService<D, U>, docs_dir: PathBuf) -> Router
where
    D: DocumentRepository + 'static,
    U: UserRepository + 'static,
{
    let state = Arc::new(DocumentsState { service, docs_dir });
    let admin_only = || from_fn_with_state(Role::Admin, require_role);

    Router::new()
        .route(
            "/",
            post(submit_bundle).merge(get(list_bundles).route_layer(admin_only())),
        )
        .route("/me", get(my_bundle))
        .route("/{id}", get(get_bundle).route_layer(admin_only()))
        .route("/{id}/approve", put(approve_bundle).route_layer(admin_only()))
        .route("/{id}/reject", put(reject_bundle).route_layer(admin_only()))
        .with_state(state)
}

fn caller_id(user: &CurrentUser) -> DocumentResult<Uuid> {
    user.0
        .user_id()
        .map_err(|e| DocumentError::Internal(format!("Invalid token subject: {e}")))
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

/// Submit the caller's paperwork bundle (1 document for clients, 3 for suppliers)
#[utoipa::path(
    post,
    path = "",
    tag = "Papiers",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Paperwork submitted", body = DocumentBundle),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 409, response = ConflictResponse),
        (status = 413, response = PayloadTooLargeResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn submit_bundle<D, U>(
    State(state): State<Arc<DocumentsState<D, U>>>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError>
where
    D: DocumentRepository,
    U: UserRepository,
{
    let user_id = caller_id(&user)?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {e}")))?
    {
        let stored = save_field(field, &state.docs_dir, &DOCUMENT_UPLOAD).await?;
        files.push(stored.stored_name);
    }

    let bundle = state.service.submit(user_id, user.0.role, files).await?;
    Ok((StatusCode::CREATED, Json(bundle)))
}

/// Get the caller's own paperwork bundle
#[utoipa::path(
    get,
    path = "/me",
    tag = "Papiers",
    responses(
        (status = 200, description = "Caller's paperwork", body = DocumentBundle),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn my_bundle<D, U>(
    State(state): State<Arc<DocumentsState<D, U>>>,
    user: CurrentUser,
) -> DocumentResult<Json<DocumentBundle>>
where
    D: DocumentRepository,
    U: UserRepository,
{
    let user_id = caller_id(&user)?;
    let bundle = state.service.my_bundle(user_id).await?;
    Ok(Json(bundle))
}

/// List submitted bundles (admin)
#[utoipa::path(
    get,
    path = "",
    tag = "Papiers",
    params(PageQuery),
    responses(
        (status = 200, description = "List of bundles", body = Vec<DocumentBundle>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_bundles<D, U>(
    State(state): State<Arc<DocumentsState<D, U>>>,
    Query(page): Query<PageQuery>,
) -> DocumentResult<Json<Vec<DocumentBundle>>>
where
    D: DocumentRepository,
    U: UserRepository,
{
    let bundles = state.service.list(page.limit, page.offset).await?;
    Ok(Json(bundles))
}

/// Get one bundle (admin)
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Papiers",
    params(
        ("id" = Uuid, Path, description = "Bundle ID")
    ),
    responses(
        (status = 200, description = "Bundle found", body = DocumentBundle),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_bundle<D, U>(
    State(state): State<Arc<DocumentsState<D, U>>>,
    UuidPath(id): UuidPath,
) -> DocumentResult<Json<DocumentBundle>>
where
    D: DocumentRepository,
    U: UserRepository,
{
    let bundle = state.service.get(id).await?;
    Ok(Json(bundle))
}

/// Approve a bundle, activating the owning account (admin)
#[utoipa::path(
    put,
    path = "/{id}/approve",
    tag = "Papiers",
    params(
        ("id" = Uuid, Path, description = "Bundle ID")
    ),
    responses(
        (status = 200, description = "Bundle approved, account activated", body = DocumentBundle),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn approve_bundle<D, U>(
    State(state): State<Arc<DocumentsState<D, U>>>,
    UuidPath(id): UuidPath,
) -> DocumentResult<Json<DocumentBundle>>
where
    D: DocumentRepository,
    U: UserRepository,
{
    let bundle = state.service.approve(id).await?;
    Ok(Json(bundle))
}

/// Reject a bundle (admin)
#[utoipa::path(
    put,
    path = "/{id}/reject",
    tag = "Papiers",
    params(
        ("id" = Uuid, Path, description = "Bundle ID")
    ),
    responses(
        (status = 200, description = "Bundle rejected", body = DocumentBundle),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn reject_bundle<D, U>(
    State(state): State<Arc<DocumentsState<D, U>>>,
    UuidPath(id): UuidPath,
) -> DocumentResult<Json<DocumentBundle>>
where
    D: DocumentRepository,
    U: UserRepository,
{
    let bundle = state.service.reject(id).await?;
    Ok(Json(bundle))
}
