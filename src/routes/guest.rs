use crate::{AppState, handlers, routes::paths};
use axum::{Router, routing::get};

/// Guest Router Module
///
/// Signup and login. Wrapped in `require_logged_out`: a logged-in user who
/// reaches any of these is sent home.
pub fn guest_routes() -> Router<AppState> {
    Router::new()
        .route(
            paths::SIGNUP,
            get(handlers::get_signup).post(handlers::post_signup),
        )
        .route(
            paths::LOGIN,
            get(handlers::get_login).post(handlers::post_login),
        )
}
