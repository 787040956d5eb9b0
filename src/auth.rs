use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

use crate::{
    error::{AppError, AuthError},
    models::User,
    password::verify_password,
    repository::{Repository, RepositoryState},
};

const SESSION_AUTH_USER_ID: &str = "auth:user";

/// authenticate
///
/// Verifies a username/password pair against the store.
///
/// The error distinguishes an unknown username from a wrong password so the
/// server log can tell them apart; callers must surface both through
/// `AuthError::notice`, which is identical for the two.
pub async fn authenticate(
    repo: &dyn Repository,
    username: &str,
    password: &str,
) -> Result<User, AuthError> {
    let Some(user) = repo.find_user_by_username(username).await? else {
        return Err(AuthError::UnknownUsername);
    };

    if !verify_password(password, &user.password)? {
        return Err(AuthError::IncorrectPassword);
    }

    Ok(user)
}

/// Authentication session management.
///
/// Only the numeric user id lives in the session; the full record is looked
/// up again on every request by `resolve_identity`.
pub struct AuthSession<'a> {
    session: &'a Session,
}

impl<'a> AuthSession<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Binds `user_id` to the session under a fresh session id.
    pub async fn login(&self, user_id: i32) -> Result<(), AppError> {
        self.session.cycle_id().await?;
        self.session.insert(SESSION_AUTH_USER_ID, user_id).await?;
        Ok(())
    }

    /// The bound user id, if any.
    pub async fn user_id(&self) -> Result<Option<i32>, AppError> {
        Ok(self.session.get::<i32>(SESSION_AUTH_USER_ID).await?)
    }

    /// Forgets the bound identity. Safe to call when nobody is logged in.
    pub async fn logout(&self) -> Result<(), AppError> {
        self.session.remove::<i32>(SESSION_AUTH_USER_ID).await?;
        Ok(())
    }
}

/// CurrentUser
///
/// The identity resolved for this request, or `None` for anonymous visitors.
/// Populated by `resolve_identity`; extracting it never fails.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .unwrap_or_default())
    }
}

/// resolve_identity
///
/// First step of every request pipeline: maps the session's user id back to a
/// full `User` and stores it in the request extensions as `CurrentUser`.
///
/// Any failure (unreadable session, deleted user, store error) leaves the
/// request anonymous instead of failing it.
pub async fn resolve_identity(
    State(repo): State<RepositoryState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match AuthSession::new(&session).user_id().await {
        Ok(Some(user_id)) => match repo.find_user_by_id(user_id).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                tracing::debug!(user_id, "session refers to a missing user");
                None
            }
            Err(err) => {
                tracing::warn!(user_id, error = %err, "failed to resolve session user");
                None
            }
        },
        Ok(None) => None,
        Err(err) => {
            tracing::warn!(error = %err, "failed to read session");
            None
        }
    };

    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}
