use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Unauthenticated, read-only endpoints. The drink listing only ever exposes the short
/// representation; recipes with quantities require `get:drinks-detail`.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers and monitoring.
        .route("/health", get(|| async { "ok" }))
        // GET /drinks
        // Every drink, short representation.
        .route("/drinks", get(handlers::get_drinks))
}
