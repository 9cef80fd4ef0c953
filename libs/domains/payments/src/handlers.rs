//! HTTP handlers for the Payments API
//!
//! Capture (declared amount + proof document in one multipart request) lives
//! under the orders mount; the read-side records live under `/payments`.

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_helpers::{
    auth::{require_role, Role},
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ConflictResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, PayloadTooLargeResponse,
        UnauthorizedResponse,
    },
    uploads::{save_field, PAYMENT_PROOF_UPLOAD},
    AppError, CurrentUser, UuidPath,
};
use std::path::PathBuf;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::{PaymentError, PaymentResult};
use crate::models::{CreatePayment, Payment};
use crate::repository::PaymentRepository;
use crate::service::PaymentService;
use domain_orders::repository::OrderRepository;

/// OpenAPI documentation for payment records
#[derive(OpenApi)]
#[openapi(
    paths(list_payments, get_payment),
    components(
        schemas(Payment),
        responses(
            NotFoundResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Payments", description = "Payment record endpoints")
    )
)]
pub struct ApiDoc;

/// OpenAPI documentation for the capture endpoint, mounted with the orders
#[derive(OpenApi)]
#[openapi(
    paths(pay_order),
    components(
        schemas(Payment),
        responses(
            BadRequestValidationResponse,
            PayloadTooLargeResponse,
            ConflictResponse
        )
    )
)]
pub struct CaptureApiDoc;

/// Shared state for the capture handler
pub struct PaymentsState<P, O>
where
    P: PaymentRepository,
    O: OrderRepository,
{
    pub service: PaymentService<P, O>,
    pub proof_dir: PathBuf,
}

/// Create the capture router, merged into the orders mount
pub fn capture_router<P, O>(service: PaymentService<P, O>, proof_dir: PathBuf) -> Router
where
    P: PaymentRepository + 'static,
    O: OrderRepository + 'static,
{
    let state = Arc::new(PaymentsState { service, proof_dir });

    Router::new()
        .route(
            "/{id}/payment",
            post(pay_order).route_layer(from_fn_with_state(Role::Client, require_role)),
        )
        .with_state(state)
}

/// Create the read-side payments router
pub fn router<P, O>(service: PaymentService<P, O>) -> Router
where
    P: PaymentRepository + 'static,
    O: OrderRepository + 'static,
{
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_payments))
        .route("/{id}", get(get_payment))
        .with_state(shared_service)
}

fn caller_id(user: &CurrentUser) -> PaymentResult<Uuid> {
    user.0
        .user_id()
        .map_err(|e| PaymentError::Internal(format!("Invalid token subject: {e}")))
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

/// Pay an order: declared amount plus the proof document in one multipart
/// request. The declared amount must match the order total within a cent.
#[utoipa::path(
    post,
    path = "/commandes/{id}/payment",
    tag = "Payments",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Payment recorded", body = Payment),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 413, response = PayloadTooLargeResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn pay_order<P, O>(
    State(state): State<Arc<PaymentsState<P, O>>>,
    user: CurrentUser,
    UuidPath(order_id): UuidPath,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError>
where
    P: PaymentRepository,
    O: OrderRepository,
{
    let client_id = caller_id(&user)?;

    let mut amount: Option<f64> = None;
    let mut proof: Option<String> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {e}")))?
    {
        if field.name() == Some("amount") {
            let raw = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid amount field: {e}")))?;
            amount = Some(
                raw.parse()
                    .map_err(|_| AppError::BadRequest(format!("Invalid amount: {raw}")))?,
            );
        } else {
            let stored = save_field(field, &state.proof_dir, &PAYMENT_PROOF_UPLOAD).await?;
            proof = Some(stored.stored_name);
        }
    }

    let amount = amount.ok_or_else(|| AppError::BadRequest("Missing amount field".to_string()))?;
    let proof = proof.ok_or_else(|| AppError::BadRequest("No proof file provided".to_string()))?;

    let payment = state
        .service
        .create_payment(client_id, CreatePayment { order_id, amount })
        .await?;
    let payment = state
        .service
        .attach_proof(client_id, payment.id, &proof)
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

/// List payments visible to the caller
#[utoipa::path(
    get,
    path = "",
    tag = "Payments",
    params(PageQuery),
    responses(
        (status = 200, description = "List of payments", body = Vec<Payment>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_payments<P, O>(
    State(service): State<Arc<PaymentService<P, O>>>,
    user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> PaymentResult<Json<Vec<Payment>>>
where
    P: PaymentRepository,
    O: OrderRepository,
{
    let user_id = caller_id(&user)?;
    let payments = service
        .list_payments_for(user.0.role, user_id, page.limit, page.offset)
        .await?;
    Ok(Json(payments))
}

/// Get a payment by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Payments",
    params(
        ("id" = Uuid, Path, description = "Payment ID")
    ),
    responses(
        (status = 200, description = "Payment found", body = Payment),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_payment<P, O>(
    State(service): State<Arc<PaymentService<P, O>>>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
) -> PaymentResult<Json<Payment>>
where
    P: PaymentRepository,
    O: OrderRepository,
{
    let user_id = caller_id(&user)?;
    let payment = service.get_payment_for(user.0.role, user_id, id).await?;
    Ok(Json(payment))
}
