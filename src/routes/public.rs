use crate::{AppState, handlers, routes::paths};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints reachable with or without a session. The identity layer still
/// runs, so handlers see the current user when there is one.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // All messages, newest first, with their authors.
        .route(paths::HOME, get(handlers::get_home))
        // GET /auth/logout
        // Clears the session identity; harmless when nobody is logged in.
        .route(paths::LOGOUT, get(handlers::get_logout))
        // GET /health
        // Monitoring endpoint; round-trips the store.
        .route("/health", get(handlers::health_check))
}
