use super::jwt::{JwtAuth, JwtClaims, Role};
use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Extract JWT from Authorization header or cookie
fn extract_token_from_request(headers: &HeaderMap) -> Option<String> {
    // Try Authorization header first: "Bearer <token>"
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer ").map(|s| s.to_string()))
        .or_else(|| {
            // Fallback to cookie: "access_token=<token>"
            headers
                .get("cookie")
                .and_then(|v| v.to_str().ok())
                .and_then(|cookies| {
                    cookies.split(';').find_map(|cookie| {
                        let parts: Vec<&str> = cookie.trim().splitn(2, '=').collect();
                        if parts.len() == 2 && parts[0] == "access_token" {
                            Some(parts[1].to_string())
                        } else {
                            None
                        }
                    })
                })
        })
}

/// JWT authentication middleware
///
/// Validates JWT tokens from Authorization header or cookies.
/// Inserts JwtClaims into request extensions on success.
///
/// # Example
///
/// ```ignore
/// use axum::Router;
/// use axum::routing::get;
/// use axum_helpers::auth::{jwt_auth_middleware, JwtAuth};
///
/// let auth = JwtAuth::new(&jwt_config);
///
/// let protected_routes = Router::new()
///     .route("/profile", get(profile_handler))
///     .layer(axum::middleware::from_fn_with_state(
///         auth.clone(),
///         jwt_auth_middleware
///     ));
/// ```
pub async fn jwt_auth_middleware(
    State(auth): State<JwtAuth>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = match extract_token_from_request(&headers) {
        Some(t) => t,
        None => {
            tracing::debug!("No JWT found in Authorization header or cookie");
            return Err(
                AppError::Unauthorized("Authentication required".to_string()).into_response()
            );
        }
    };

    let claims = match auth.verify_token(&token) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!("JWT verification failed: {}", e);
            return Err(AppError::Unauthorized("Invalid token".to_string()).into_response());
        }
    };

    // Token is valid - insert claims into request extensions
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Optional JWT authentication middleware
///
/// Like jwt_auth_middleware but doesn't fail if no token is present.
/// Useful for endpoints that behave differently for authenticated vs anonymous users.
pub async fn optional_jwt_auth_middleware(
    State(auth): State<JwtAuth>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_token_from_request(&headers) {
        if let Ok(claims) = auth.verify_token(&token) {
            request.extensions_mut().insert(claims);
        }
    }

    next.run(request).await
}

/// Declarative per-route role policy.
///
/// Applied once per route group after [`jwt_auth_middleware`]; handlers never
/// re-derive the role themselves.
///
/// # Example
///
/// ```ignore
/// let supplier_routes = Router::new()
///     .route("/commandes/{id}/status", put(update_status))
///     .layer(axum::middleware::from_fn_with_state(Role::Supplier, require_role))
///     .layer(axum::middleware::from_fn_with_state(auth, jwt_auth_middleware));
/// ```
pub async fn require_role(
    State(required): State<Role>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let claims = match request.extensions().get::<JwtClaims>() {
        Some(c) => c,
        None => {
            return Err(
                AppError::Unauthorized("Authentication required".to_string()).into_response()
            );
        }
    };

    if claims.role != required {
        tracing::debug!(
            "Role policy rejected: required {}, got {}",
            required,
            claims.role
        );
        return Err(
            AppError::Forbidden(format!("{} role required", required)).into_response()
        );
    }

    Ok(next.run(request).await)
}

/// Extractor for the authenticated user's claims.
///
/// Requires [`jwt_auth_middleware`] to have run on the route.
///
/// # Example
/// ```ignore
/// async fn profile(CurrentUser(claims): CurrentUser) -> String {
///     format!("Hello, {}", claims.name)
/// }
/// ```
pub struct CurrentUser(pub JwtClaims);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<JwtClaims>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                AppError::Unauthorized("Authentication required".to_string()).into_response()
            })
    }
}
