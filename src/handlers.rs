use crate::{
    AppState,
    auth::{self, AuthSession, CurrentUser},
    error::{AppError, AuthError},
    flash::FlashSession,
    forms::{JoinForm, LoginForm, MessageForm, SignupForm},
    models::{NewMessage, NewUser, UserChanges},
    routes::paths,
    validation::{self, FieldError, MESSAGE_RULES, SIGNUP_RULES, USERNAME_TAKEN},
    views::{FormPage, HOME_TITLE, HomePage},
};
use axum::{
    Form, Json,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

pub const SIGNUP_SUCCESS: &str = "Sign up successful! Please log in and join the club.";
pub const LOGOUT_SUCCESS: &str = "You have been logged out.";
pub const ALREADY_MEMBER: &str = "You are already a member!";
pub const JOIN_SUCCESS: &str = "Success! Welcome to the exclusive club!";
pub const WRONG_PASSCODE: &str = "Incorrect secret passcode.";
pub const MESSAGE_CREATED: &str = "Message created successfully!";
pub const MESSAGE_DELETED: &str = "Message deleted.";

/// Renders a form page, draining the pending notices into it.
async fn render_form(
    title: &str,
    current: &CurrentUser,
    session: &Session,
) -> Result<Json<FormPage>, AppError> {
    let notices = FlashSession::new(session).drain().await?;
    Ok(Json(FormPage::new(title, current.user(), notices)))
}

// --- Public ---

/// get_home
///
/// [Public Route] Lists every message, newest first, each with its author's
/// public projection.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Home listing", body = HomePage))
)]
pub async fn get_home(
    State(state): State<AppState>,
    current: CurrentUser,
    session: Session,
) -> Result<Json<HomePage>, AppError> {
    let messages = state.repo.list_messages_with_authors().await?;
    let notices = FlashSession::new(&session).drain().await?;

    Ok(Json(HomePage {
        title: HOME_TITLE.to_string(),
        current_user: current.user().map(|user| user.profile()),
        notices,
        messages,
    }))
}

/// health_check
///
/// [Public Route] Reports whether the store answers.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Store reachable"), (status = 500, description = "Store unreachable"))
)]
pub async fn health_check(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state.repo.ping().await?;
    Ok("ok")
}

/// get_logout
///
/// [Public Route] Forgets the session identity. Logging out twice is harmless.
#[utoipa::path(
    get,
    path = "/auth/logout",
    responses((status = 303, description = "Redirect home"))
)]
pub async fn get_logout(session: Session) -> Result<Redirect, AppError> {
    AuthSession::new(&session).logout().await?;
    FlashSession::new(&session).success(LOGOUT_SUCCESS).await?;
    Ok(Redirect::to(paths::HOME))
}

// --- Guest (logged out) ---

#[utoipa::path(
    get,
    path = "/auth/signup",
    responses((status = 200, description = "Signup form", body = FormPage))
)]
pub async fn get_signup(current: CurrentUser, session: Session) -> Result<Json<FormPage>, AppError> {
    render_form("Sign Up", &current, &session).await
}

/// post_signup
///
/// [Guest Route] Validates the whole form, reporting every failed rule at
/// once. On success the password is hashed before the row is written.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body(content = SignupForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created, redirect to login; or invalid, redirect back to the form")
    )
)]
pub async fn post_signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Redirect, AppError> {
    let form = form.normalized();
    let flash = FlashSession::new(&session);

    let failures = validation::validate(&form, SIGNUP_RULES, state.repo.as_ref()).await?;
    if !failures.is_empty() {
        tracing::debug!(count = failures.len(), "signup rejected by validation");
        flash.validation_errors(failures).await?;
        return Ok(Redirect::to(paths::SIGNUP));
    }

    let admin = form.wants_admin();
    let prepared = NewUser {
        first_name: form.first_name,
        last_name: form.last_name,
        username: form.username,
        password: form.password,
        admin,
    }
    .prepare()?;

    // A concurrent signup can claim the username after the availability check.
    let user = match state.repo.create_user(prepared).await {
        Ok(user) => user,
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            tracing::debug!("signup lost a race for its username");
            flash
                .validation_errors(vec![FieldError::new("username", USERNAME_TAKEN)])
                .await?;
            return Ok(Redirect::to(paths::SIGNUP));
        }
        Err(err) => return Err(err.into()),
    };
    tracing::info!(user_id = user.id, admin = user.admin, "user signed up");

    flash.success(SIGNUP_SUCCESS).await?;
    Ok(Redirect::to(paths::LOGIN))
}

#[utoipa::path(
    get,
    path = "/auth/login",
    responses((status = 200, description = "Login form", body = FormPage))
)]
pub async fn get_login(current: CurrentUser, session: Session) -> Result<Json<FormPage>, AppError> {
    render_form("Login", &current, &session).await
}

/// post_login
///
/// [Guest Route] Checks the credentials and binds the user id to the session.
/// Both kinds of credential failure produce the same notice.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect home on success, back to login otherwise"))
)]
pub async fn post_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, AppError> {
    match auth::authenticate(state.repo.as_ref(), &form.username, &form.password).await {
        Ok(user) => {
            AuthSession::new(&session).login(user.id).await?;
            tracing::info!(user_id = user.id, "user logged in");
            Ok(Redirect::to(paths::HOME))
        }
        Err(AuthError::Internal(err)) => Err(err),
        Err(err) => {
            tracing::debug!(reason = %err, "login rejected");
            if let Some(notice) = err.notice() {
                FlashSession::new(&session).error(notice).await?;
            }
            Ok(Redirect::to(paths::LOGIN))
        }
    }
}

// --- Authenticated ---

/// get_join
///
/// [Authenticated Route] Shows the passcode form, unless the user already is
/// a member, in which case they are sent home with a notice.
#[utoipa::path(
    get,
    path = "/auth/join",
    responses(
        (status = 200, description = "Join form", body = FormPage),
        (status = 303, description = "Already a member, redirect home")
    )
)]
pub async fn get_join(current: CurrentUser, session: Session) -> Result<Response, AppError> {
    let Some(user) = current.user() else {
        return Ok(Redirect::to(paths::LOGIN).into_response());
    };

    if user.membership_status {
        FlashSession::new(&session).success(ALREADY_MEMBER).await?;
        return Ok(Redirect::to(paths::HOME).into_response());
    }

    Ok(render_form("Join the Club", &current, &session)
        .await?
        .into_response())
}

/// post_join
///
/// [Authenticated Route] Grants membership when the passcode matches the
/// configured secret exactly. Re-submitting as a member is a harmless no-op.
#[utoipa::path(
    post,
    path = "/auth/join",
    request_body(content = JoinForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect home on success, back to the form otherwise"))
)]
pub async fn post_join(
    State(state): State<AppState>,
    current: CurrentUser,
    session: Session,
    Form(form): Form<JoinForm>,
) -> Result<Redirect, AppError> {
    let Some(user) = current.user() else {
        return Ok(Redirect::to(paths::LOGIN));
    };
    let flash = FlashSession::new(&session);

    if form.passcode != state.config.membership_code {
        tracing::debug!(user_id = user.id, "wrong membership passcode");
        flash.error(WRONG_PASSCODE).await?;
        return Ok(Redirect::to(paths::JOIN));
    }

    state
        .repo
        .update_user(user.id, UserChanges::membership(true))
        .await?;
    tracing::info!(user_id = user.id, "membership granted");

    flash.success(JOIN_SUCCESS).await?;
    Ok(Redirect::to(paths::HOME))
}

#[utoipa::path(
    get,
    path = "/messages/new",
    responses((status = 200, description = "New message form", body = FormPage))
)]
pub async fn get_new_message(
    current: CurrentUser,
    session: Session,
) -> Result<Json<FormPage>, AppError> {
    render_form("Create Message", &current, &session).await
}

/// post_new_message
///
/// [Authenticated Route] Posts a message owned by the current user.
#[utoipa::path(
    post,
    path = "/messages/new",
    request_body(content = MessageForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect home on success, back to the form otherwise"))
)]
pub async fn post_new_message(
    State(state): State<AppState>,
    current: CurrentUser,
    session: Session,
    Form(form): Form<MessageForm>,
) -> Result<Redirect, AppError> {
    let Some(user) = current.user() else {
        return Ok(Redirect::to(paths::LOGIN));
    };
    let form = form.normalized();
    let flash = FlashSession::new(&session);

    let failures = validation::validate(&form, MESSAGE_RULES, state.repo.as_ref()).await?;
    if !failures.is_empty() {
        flash.validation_errors(failures).await?;
        return Ok(Redirect::to(paths::NEW_MESSAGE));
    }

    let message = state
        .repo
        .create_message(NewMessage {
            title: form.title,
            text: form.text,
            user_id: user.id,
        })
        .await?;
    tracing::info!(message_id = message.id, user_id = user.id, "message posted");

    flash.success(MESSAGE_CREATED).await?;
    Ok(Redirect::to(paths::HOME))
}

// --- Admin ---

/// delete_message
///
/// [Admin Route] Deletes any message by id, with no ownership check. An id
/// that matches nothing is treated as already deleted.
#[utoipa::path(
    post,
    path = "/messages/{id}/delete",
    params(("id" = i32, Path, description = "Message ID")),
    responses((status = 303, description = "Redirect home"))
)]
pub async fn delete_message(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    let removed = state.repo.delete_message(id).await?;
    tracing::info!(message_id = id, removed, "message deleted by admin");

    FlashSession::new(&session).success(MESSAGE_DELETED).await?;
    Ok(Redirect::to(paths::HOME))
}
