//! REST API routes configuration

use crate::api::handlers::{self, ApiError, ApiState};
use crate::api::websocket::ws_handler;
use axum::{
    http::{StatusCode, Uri},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

/// Fallback for unknown routes
async fn fallback_handler(uri: Uri) -> (StatusCode, Json<ApiError>) {
    log::debug!("No route for {}", uri.path());
    (
        StatusCode::NOT_FOUND,
        Json(ApiError {
            error: format!("Not Found: {}", uri.path()),
            kind: "not_found".to_string(),
        }),
    )
}

/// Create the API router with all routes
pub fn create_router(state: ApiState) -> Router {
    // Configure CORS for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // WebSocket for notifications
        .route("/ws", get(ws_handler))
        // Registry
        .route(
            "/api/rectangles",
            get(handlers::list_rectangles).post(handlers::create_rectangle),
        )
        .route("/api/rectangles/area", get(handlers::total_surface))
        .route("/api/rectangles/{id}", get(handlers::get_rectangle))
        .route(
            "/api/rectangles/{id}/resize",
            post(handlers::resize_rectangle),
        )
        .route("/api/rectangles/{id}/move", post(handlers::move_rectangle))
        // Ledger
        .route("/api/ledger", get(handlers::get_stats))
        .route("/api/ledger/deposit", post(handlers::deposit))
        .route("/api/ledger/withdraw", post(handlers::withdraw))
        .route("/api/ledger/recipient", post(handlers::change_recipient))
        .route("/api/ledger/halt", post(handlers::halt))
        .route("/api/ledger/resume", post(handlers::resume))
        .route("/api/ledger/depositors", get(handlers::list_depositors))
        .route(
            "/api/ledger/depositors/{index}",
            get(handlers::get_depositor),
        )
        // Notifications
        .route("/api/notifications", get(handlers::list_notifications))
        .fallback(fallback_handler)
        .with_state(state)
        .layer(cors)
}
