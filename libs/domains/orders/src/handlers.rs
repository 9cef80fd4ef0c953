//! HTTP handlers for the Orders API

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
        BadRequestUuidResponse, BadRequestValidationResponse, ConflictResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    CurrentUser, UuidPath, ValidatedJson,
};
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::{OrderError, OrderResult};
use crate::models::{CreateOrder, CreateOrderLine, Order, OrderLine, OrderStatus, UpdateOrderStatus};
use crate::repository::OrderRepository;
use crate::service::OrderService;
use domain_notifications::repository::NotificationRepository;
use domain_products::repository::ProductRepository;

/// OpenAPI documentation for Orders API
#[derive(OpenApi)]
#[openapi(
    paths(create_order, list_orders, get_order, update_order_status),
    components(
        schemas(
            Order, OrderLine, OrderStatus, CreateOrder, CreateOrderLine, UpdateOrderStatus,
            OrderCreated
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Orders", description = "Order creation and delivery tracking endpoints")
    )
)]
pub struct ApiDoc;

/// Create the orders router with all HTTP endpoints
pub fn router<O, P, N>(service: OrderService<O, P, N>) -> Router
where
    O: OrderRepository + 'static,
    P: ProductRepository + 'static,
    N: NotificationRepository + 'static,
{
    let shared_service = Arc::new(service);

    // Only clients place orders and only suppliers advance them; reads are
    // scoped inside the service per caller role.
    Router::new()
        .route(
            "/",
            get(list_orders).merge(
                post(create_order).route_layer(from_fn_with_state(Role::Client, require_role)),
            ),
        )
        .route("/{id}", get(get_order))
        .route(
            "/{id}/status",
            put(update_order_status).route_layer(from_fn_with_state(Role::Supplier, require_role)),
        )
        .with_state(shared_service)
}

fn caller_id(user: &CurrentUser) -> OrderResult<Uuid> {
    user.0
        .user_id()
        .map_err(|e| OrderError::Internal(format!("Invalid token subject: {e}")))
}

/// Creation response envelope; the ids are lifted next to the order so the
/// buyer UI can route to it without digging into `data`.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct OrderCreated {
    pub success: bool,
    pub data: Order,
    #[serde(rename = "orderId")]
    pub order_id: Uuid,
    #[serde(rename = "supplierId")]
    pub supplier_id: Uuid,
}

/// Place a new order
#[utoipa::path(
    post,
    path = "",
    tag = "Orders",
    request_body = CreateOrder,
    responses(
        (status = 201, description = "Order created successfully", body = OrderCreated),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_order<O, P, N>(
    State(service): State<Arc<OrderService<O, P, N>>>,
    user: CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateOrder>,
) -> OrderResult<impl IntoResponse>
where
    O: OrderRepository,
    P: ProductRepository,
    N: NotificationRepository,
{
    let client_id = caller_id(&user)?;
    let order = service
        .create_order(client_id, user.0.name.clone(), input)
        .await?;
    let response = OrderCreated {
        success: true,
        order_id: order.id,
        supplier_id: order.supplier_id,
        data: order,
    };
    Ok((StatusCode::CREATED, Json(response)))
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

/// List orders visible to the caller
#[utoipa::path(
    get,
    path = "",
    tag = "Orders",
    params(PageQuery),
    responses(
        (status = 200, description = "Orders visible to the caller", body = Vec<Order>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_orders<O, P, N>(
    State(service): State<Arc<OrderService<O, P, N>>>,
    user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> OrderResult<Json<Vec<Order>>>
where
    O: OrderRepository,
    P: ProductRepository,
    N: NotificationRepository,
{
    let user_id = caller_id(&user)?;
    let orders = service
        .list_orders_for(user.0.role, user_id, page.limit, page.offset)
        .await?;
    Ok(Json(orders))
}

/// Get one order by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Orders",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order found", body = Order),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_order<O, P, N>(
    State(service): State<Arc<OrderService<O, P, N>>>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
) -> OrderResult<Json<Order>>
where
    O: OrderRepository,
    P: ProductRepository,
    N: NotificationRepository,
{
    let user_id = caller_id(&user)?;
    let order = service.get_order_for(user.0.role, user_id, id).await?;
    Ok(Json(order))
}

/// Advance an order's delivery status
#[utoipa::path(
    put,
    path = "/{id}/status",
    tag = "Orders",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatus,
    responses(
        (status = 200, description = "Order status updated", body = Order),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_order_status<O, P, N>(
    State(service): State<Arc<OrderService<O, P, N>>>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateOrderStatus>,
) -> OrderResult<Json<Order>>
where
    O: OrderRepository,
    P: ProductRepository,
    N: NotificationRepository,
{
    let supplier_id = caller_id(&user)?;
    let order = service.advance_status(supplier_id, id, input.status).await?;
    Ok(Json(order))
}
