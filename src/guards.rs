//! Authorization guards.
//!
//! Each guard is a pure pass/divert decision over the resolved identity,
//! wrapped in an axum middleware that performs the divert (an optional error
//! notice plus a redirect). Guards never touch the store.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::{auth::CurrentUser, flash::FlashSession, models::User, routes::paths};

pub const LOGIN_REQUIRED: &str = "You must be logged in to access that page.";
pub const ADMIN_REQUIRED: &str = "Access denied. Must be an administrator.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Signup and login: only for anonymous visitors.
    LoggedOut,
    /// Joining and posting.
    LoggedIn,
    /// Message deletion.
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Divert {
        to: &'static str,
        notice: Option<&'static str>,
    },
}

impl Guard {
    pub fn decide(self, user: Option<&User>) -> Decision {
        match (self, user) {
            (Guard::LoggedOut, None) => Decision::Proceed,
            (Guard::LoggedOut, Some(_)) => Decision::Divert {
                to: paths::HOME,
                notice: None,
            },
            (Guard::LoggedIn, Some(_)) => Decision::Proceed,
            (Guard::LoggedIn, None) => Decision::Divert {
                to: paths::LOGIN,
                notice: Some(LOGIN_REQUIRED),
            },
            (Guard::Admin, Some(user)) if user.admin => Decision::Proceed,
            (Guard::Admin, _) => Decision::Divert {
                to: paths::HOME,
                notice: Some(ADMIN_REQUIRED),
            },
        }
    }

    async fn enforce(
        self,
        current: CurrentUser,
        session: Session,
        request: Request,
        next: Next,
    ) -> Response {
        match self.decide(current.user()) {
            Decision::Proceed => next.run(request).await,
            Decision::Divert { to, notice } => {
                tracing::debug!(guard = ?self, path = %request.uri().path(), "request diverted");
                if let Some(notice) = notice {
                    if let Err(err) = FlashSession::new(&session).error(notice).await {
                        return err.into_response();
                    }
                }
                Redirect::to(to).into_response()
            }
        }
    }
}

pub async fn require_logged_out(
    current: CurrentUser,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    Guard::LoggedOut.enforce(current, session, request, next).await
}

pub async fn require_logged_in(
    current: CurrentUser,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    Guard::LoggedIn.enforce(current, session, request, next).await
}

pub async fn require_admin(
    current: CurrentUser,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    Guard::Admin.enforce(current, session, request, next).await
}
