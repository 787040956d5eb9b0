//! Router Module Index
//!
//! Routes are grouped by who may reach them. Each group is wrapped in its
//! guard by `create_router`, so access control sits at the group boundary
//! rather than inside individual handlers.

/// Routes open to everyone: the listing, logout, health.
pub mod public;

/// Routes only for visitors who are not logged in: signup and login.
pub mod guest;

/// Routes requiring a resolved identity: joining and posting.
pub mod authenticated;

/// Routes restricted to administrators.
pub mod admin;

/// Every path a handler or guard redirects to.
pub mod paths {
    pub const HOME: &str = "/";
    pub const SIGNUP: &str = "/auth/signup";
    pub const LOGIN: &str = "/auth/login";
    pub const LOGOUT: &str = "/auth/logout";
    pub const JOIN: &str = "/auth/join";
    pub const NEW_MESSAGE: &str = "/messages/new";
    pub const DELETE_MESSAGE: &str = "/messages/{id}/delete";
}
