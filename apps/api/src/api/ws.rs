//! WebSocket endpoint.
//!
//! Browsers cannot set an Authorization header on the upgrade request, so the
//! token rides in the query string and is verified with the same `JwtAuth`
//! as the REST routes.

use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axum_helpers::{auth::JwtAuth, AppError};
use realtime::{serve_socket, Hub, Room};
use serde::Deserialize;

#[derive(Clone)]
pub struct WsState {
    auth: JwtAuth,
    hub: Hub,
}

#[derive(Deserialize)]
pub struct WsQuery {
    token: String,
}

/// Create the websocket router
pub fn router(auth: JwtAuth, hub: Hub) -> Router {
    Router::new()
        .route("/ws", get(upgrade))
        .with_state(WsState { auth, hub })
}

async fn upgrade(
    State(state): State<WsState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, Response> {
    let claims = state
        .auth
        .verify_token(&query.token)
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()).into_response())?;
    let user_id = claims.user_id().map_err(|e| {
        AppError::Unauthorized(format!("Invalid token subject: {e}")).into_response()
    })?;

    // Clients and suppliers join their identity room; admins join `admins`.
    let rooms = vec![Room::for_user(claims.role, user_id)];
    let hub = state.hub.clone();
    Ok(ws.on_upgrade(move |socket| serve_socket(socket, rooms, hub)))
}
