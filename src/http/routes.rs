//! HTTP route definitions

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::app::AppState;
use crate::ws::handler::ws_handler;

/// Build the application router. The upgrade endpoint is the only route.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
