use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

use crate::message;
use crate::shared::AppState;
use crate::websockets;

/// All HTTP and WebSocket routes of the server
pub fn build_router(state: AppState) -> Router {
    // Room for the 413 check in the handler; axum's own limit is only a backstop
    let body_limit = state.config.max_upload_bytes.saturating_mul(2);
    let files = ServeDir::new(&state.config.upload_dir);
    let cors = cors_layer(state.config.cors_origin.as_deref());

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/ws", get(websockets::websocket_handler))
        .route(
            "/rooms/:room/upload",
            post(message::upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .nest_service("/files", files)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(e)) => {
            warn!(error = %e, "Ignoring invalid CORS origin, allowing any");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}
