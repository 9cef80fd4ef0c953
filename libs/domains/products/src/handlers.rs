//! HTTP handlers for the Products API

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
    uploads::{save_field, PRODUCT_MEDIA_UPLOAD},
    AppError, CurrentUser, UuidPath, ValidatedJson,
};
use std::path::PathBuf;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, Product, ProductFilter, UpdateProduct};
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// OpenAPI documentation for Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        count_products,
        my_products,
        get_product,
        update_product,
        delete_product,
        upload_media,
    ),
    components(
        schemas(Product, CreateProduct, UpdateProduct, ProductFilter),
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
        (name = "Products", description = "Laboratory equipment catalog endpoints")
    )
)]
pub struct ApiDoc;

/// Shared state for product handlers
pub struct ProductsState<R: ProductRepository> {
    pub service: ProductService<R>,
    pub media_dir: PathBuf,
}

/// Create the products router with all HTTP endpoints.
///
/// Catalog reads stay open; every write carries the supplier role policy on
/// its method router. The API app layers JWT extraction over the whole mount.
pub fn router<R: ProductRepository + 'static>(
    service: ProductService<R>,
    media_dir: PathBuf,
) -> Router {
    let state = Arc::new(ProductsState { service, media_dir });
    let supplier_only = || from_fn_with_state(Role::Supplier, require_role);

    Router::new()
        .route(
            "/",
            get(list_products).merge(post(create_product).route_layer(supplier_only())),
        )
        .route("/count", get(count_products))
        .route("/mine", get(my_products).route_layer(supplier_only()))
        .route(
            "/{id}",
            get(get_product).merge(
                put(update_product)
                    .delete(delete_product)
                    .route_layer(supplier_only()),
            ),
        )
        .route(
            "/{id}/media",
            post(upload_media).route_layer(supplier_only()),
        )
        .with_state(state)
}

fn caller_id(user: &CurrentUser) -> ProductResult<Uuid> {
    user.0
        .user_id()
        .map_err(|e| ProductError::Internal(format!("Invalid token subject: {e}")))
}

/// List products with optional filters
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    params(ProductFilter),
    responses(
        (status = 200, description = "List of products", body = Vec<Product>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(state): State<Arc<ProductsState<R>>>,
    Query(filter): Query<ProductFilter>,
) -> ProductResult<Json<Vec<Product>>> {
    let products = state.service.list_products(filter).await?;
    Ok(Json(products))
}

/// Create a new product owned by the calling supplier
#[utoipa::path(
    post,
    path = "",
    tag = "Products",
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created successfully", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(state): State<Arc<ProductsState<R>>>,
    user: CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateProduct>,
) -> ProductResult<impl IntoResponse> {
    let supplier_id = caller_id(&user)?;
    let product = state.service.create_product(supplier_id, input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Count products matching a filter
#[utoipa::path(
    get,
    path = "/count",
    tag = "Products",
    params(ProductFilter),
    responses(
        (status = 200, description = "Product count", body = u64),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn count_products<R: ProductRepository>(
    State(state): State<Arc<ProductsState<R>>>,
    Query(filter): Query<ProductFilter>,
) -> ProductResult<Json<u64>> {
    let count = state.service.count_products(filter).await?;
    Ok(Json(count))
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

/// List the calling supplier's own catalog
#[utoipa::path(
    get,
    path = "/mine",
    tag = "Products",
    params(PageQuery),
    responses(
        (status = 200, description = "Supplier catalog", body = Vec<Product>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn my_products<R: ProductRepository>(
    State(state): State<Arc<ProductsState<R>>>,
    user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> ProductResult<Json<Vec<Product>>> {
    let supplier_id = caller_id(&user)?;
    let products = state
        .service
        .get_supplier_catalog(supplier_id, page.limit, page.offset)
        .await?;
    Ok(Json(products))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(state): State<Arc<ProductsState<R>>>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<Product>> {
    let product = state.service.get_product(id).await?;
    Ok(Json(product))
}

/// Update a product owned by the calling supplier
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Product updated successfully", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(state): State<Arc<ProductsState<R>>>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateProduct>,
) -> ProductResult<Json<Product>> {
    let supplier_id = caller_id(&user)?;
    let product = state.service.update_product(supplier_id, id, input).await?;
    Ok(Json(product))
}

/// Delete a product owned by the calling supplier
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Product deleted successfully"),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(state): State<Arc<ProductsState<R>>>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
) -> ProductResult<impl IntoResponse> {
    let supplier_id = caller_id(&user)?;
    state.service.delete_product(supplier_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload photos or videos for a product owned by the calling supplier
#[utoipa::path(
    post,
    path = "/{id}/media",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Media attached", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 413, response = PayloadTooLargeResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn upload_media<R: ProductRepository>(
    State(state): State<Arc<ProductsState<R>>>,
    user: CurrentUser,
    UuidPath(id): UuidPath,
    mut multipart: Multipart,
) -> Result<Json<Product>, AppError> {
    let supplier_id = caller_id(&user)?;

    let mut product = state.service.get_product(id).await?;
    if product.supplier_id != supplier_id {
        return Err(ProductError::NotOwner.into());
    }

    let mut stored_any = false;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {e}")))?
    {
        let stored = save_field(field, &state.media_dir, &PRODUCT_MEDIA_UPLOAD).await?;
        product = state
            .service
            .attach_media(supplier_id, id, stored.stored_name)
            .await?;
        stored_any = true;
    }

    if !stored_any {
        return Err(AppError::BadRequest("No file provided".to_string()));
    }

    Ok(Json(product))
}
