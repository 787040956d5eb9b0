use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::config::AppConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const DROP_TABLES: &[&str] = &[
    "DROP TABLE IF EXISTS messages",
    "DROP TABLE IF EXISTS users",
];

const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id                SERIAL PRIMARY KEY,
    first_name        VARCHAR(255) NOT NULL,
    last_name         VARCHAR(255) NOT NULL,
    username          VARCHAR(255) NOT NULL UNIQUE,
    password          VARCHAR(255) NOT NULL,
    membership_status BOOLEAN NOT NULL DEFAULT FALSE,
    admin             BOOLEAN NOT NULL DEFAULT FALSE,
    created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at        TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_MESSAGES: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id          SERIAL PRIMARY KEY,
    title       VARCHAR(255) NOT NULL CHECK (title <> ''),
    text        TEXT NOT NULL CHECK (text <> ''),
    "timestamp" TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    user_id     INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE
)
"#;

/// connect
///
/// Opens the connection pool and performs the single-connection health check.
/// Any failure here is fatal to startup: the caller must not begin serving.
pub async fn connect(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    let options = config.db.connect_options()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect_with(options)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;
    tracing::info!("Database connection verified.");

    Ok(pool)
}

/// sync_schema
///
/// Ensures both tables exist. With `reset` set, drops them first, destroying
/// every user and message.
pub async fn sync_schema(pool: &PgPool, reset: bool) -> Result<(), sqlx::Error> {
    if reset {
        tracing::warn!("Resetting schema: dropping all tables.");
        for statement in DROP_TABLES {
            sqlx::query(statement).execute(pool).await?;
        }
    }

    sqlx::query(CREATE_USERS).execute(pool).await?;
    sqlx::query(CREATE_MESSAGES).execute(pool).await?;

    tracing::info!("Schema is up to date.");
    Ok(())
}
