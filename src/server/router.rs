use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::server::handlers;
use crate::server::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/{backend}",
            post(handlers::ask).fallback(handlers::method_not_allowed),
        )
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
