use crate::{AppState, handlers, routes::paths};
use axum::{Router, routing::post};

/// Admin Router Module
///
/// Wrapped in `require_admin`. Anyone else is sent home with an
/// "Access denied" notice and nothing is deleted.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /messages/{id}/delete
        // Removes any message by id, no ownership check.
        .route(paths::DELETE_MESSAGE, post(handlers::delete_message))
}
