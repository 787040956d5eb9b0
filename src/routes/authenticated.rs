use crate::{AppState, handlers, routes::paths};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Wrapped in `require_logged_in`. Anonymous requests are diverted to the
/// login form with a notice before any handler runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /auth/join
        // Passcode form; a correct passcode grants membership.
        .route(paths::JOIN, get(handlers::get_join).post(handlers::post_join))
        // GET/POST /messages/new
        // Message form; validated, then stored under the current user.
        .route(
            paths::NEW_MESSAGE,
            get(handlers::get_new_message).post(handlers::post_new_message),
        )
}
