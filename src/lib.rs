use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tower_sessions::{
    SessionManagerLayer, SessionStore,
    cookie::{Key, SameSite},
};
use tracing::{Level, Span};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod flash;
pub mod forms;
pub mod guards;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod validation;
pub mod views;

// Routing segregation (public, guest, authenticated, admin).
pub mod routes;
use routes::{admin, authenticated, guest, public};

// --- Public Re-exports ---

pub use config::{AppConfig, DbTarget, Env};
pub use error::{AppError, ConfigError};
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI description of every route, served at `/api-docs/openapi.json`
/// and browsable through Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_home, handlers::health_check, handlers::get_logout,
        handlers::get_signup, handlers::post_signup, handlers::get_login, handlers::post_login,
        handlers::get_join, handlers::post_join, handlers::get_new_message,
        handlers::post_new_message, handlers::delete_message
    ),
    components(
        schemas(
            views::HomePage, views::FormPage, flash::Notices, validation::FieldError,
            models::UserProfile, models::MessageWithAuthor,
            forms::SignupForm, forms::LoginForm, forms::JoinForm, forms::MessageForm,
        )
    ),
    tags(
        (name = "members-board", description = "Members-only message board")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container of application services. Cloned per request;
/// both fields are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer, backed by the Postgres pool in production.
    pub repo: RepositoryState,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// session_key
///
/// Derives the cookie-signing key from `SESSION_SECRET`.
pub fn session_key(config: &AppConfig) -> Result<Key, ConfigError> {
    Key::try_from(config.session_secret.as_bytes())
        .map_err(|_| ConfigError::SessionSecretTooShort(config.session_secret.len()))
}

/// create_router
///
/// Assembles the routing structure and its middleware, outermost first:
/// request id + tracing, the session layer, identity resolution, then the
/// per-group guard.
pub fn create_router<Store>(state: AppState, store: Store) -> Result<Router, ConfigError>
where
    Store: SessionStore + Clone,
{
    // Signed cookies carry only the session id; identity and notices live in the store.
    let sessions = SessionManagerLayer::new(store)
        .with_secure(state.config.env == Env::Production)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_signed(session_key(&state.config)?);
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(guest::guest_routes().route_layer(middleware::from_fn(guards::require_logged_out)))
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn(guards::require_logged_in)),
        )
        .merge(admin::admin_routes().route_layer(middleware::from_fn(guards::require_admin)))
        // Runs before every guard: populates `CurrentUser` from the session.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::resolve_identity,
        ))
        .with_state(state);

    Ok(base_router.layer(sessions).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    ))
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with method, URI and the request id so
/// every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
