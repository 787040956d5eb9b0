use members_board::{
    AppState,
    config::{AppConfig, Env},
    create_router, db,
    repository::{PostgresRepository, RepositoryState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Startup sequence: configuration, logging, store connectivity and schema,
/// session store, then the HTTP server. Every step before binding is fatal
/// on failure, so the process never serves against a broken store.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load().expect("FATAL: invalid configuration");

    // 2. Logging: pretty locally, JSON for log aggregation in production.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "members_board=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Database: connect, health check, schema.
    let pool = db::connect(&config)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL or the DB_* variables.");
    db::sync_schema(&pool, config.reset_schema)
        .await
        .expect("FATAL: Failed to synchronise the database schema.");

    // 4. Sessions share the pool.
    let session_store = PostgresStore::new(pool.clone());
    session_store
        .migrate()
        .await
        .expect("FATAL: Failed to prepare the session table.");

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;
    let port = config.port;
    let app_state = AppState { repo, config };

    // 5. Router and server.
    let app = create_router(app_state, session_store).expect("FATAL: invalid session secret");

    let address = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&address)
        .await
        .expect("FATAL: Failed to bind the listening port.");

    tracing::info!("Listening on http://{}", address);
    tracing::info!("API documentation available at: http://localhost:{}/swagger-ui", port);

    axum::serve(listener, app)
        .await
        .expect("HTTP server terminated unexpectedly");
}
