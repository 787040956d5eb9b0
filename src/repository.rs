use crate::models::{
    Message, MessageChanges, MessageFilter, MessageWithAuthor, NewMessage, PreparedUser, User,
    UserChanges, UserFilter, UserProfile,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, query_builder::QueryBuilder};
use std::sync::Arc;

/// Every store operation either succeeds or hands the driver error back to the caller.
pub type RepoResult<T> = Result<T, sqlx::Error>;

/// Repository Trait
///
/// The abstract contract for all persistence operations. Handlers only ever see
/// `Arc<dyn Repository>`, so tests can substitute an in-memory implementation.
///
/// Writes that touch the credential column only accept prepared payloads
/// (`PreparedUser`, `UserChanges`), which already carry a digest.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Round-trips a trivial query; used by the health endpoint.
    async fn ping(&self) -> RepoResult<()>;

    // --- Users ---
    async fn create_user(&self, user: PreparedUser) -> RepoResult<User>;
    async fn find_user_by_id(&self, id: i32) -> RepoResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    async fn list_users(&self, filter: UserFilter) -> RepoResult<Vec<User>>;
    /// Applies the set fields and bumps `updated_at`. `None` if no such user.
    async fn update_user(&self, id: i32, changes: UserChanges) -> RepoResult<Option<User>>;
    /// Deletes the user; the store cascades to their messages. Returns rows removed.
    async fn delete_user(&self, id: i32) -> RepoResult<u64>;

    // --- Messages ---
    async fn create_message(&self, message: NewMessage) -> RepoResult<Message>;
    async fn find_message_by_id(&self, id: i32) -> RepoResult<Option<Message>>;
    /// Newest first.
    async fn list_messages(&self, filter: MessageFilter) -> RepoResult<Vec<Message>>;
    async fn update_message(&self, id: i32, changes: MessageChanges) -> RepoResult<Option<Message>>;
    /// Unconditional delete by id. A missing id removes nothing and is not an error.
    async fn delete_message(&self, id: i32) -> RepoResult<u64>;

    /// All messages, newest first, each joined with its author's projection.
    async fn list_messages_with_authors(&self) -> RepoResult<Vec<MessageWithAuthor>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str = "id, first_name, last_name, username, password, membership_status, admin, created_at, updated_at";
const MESSAGE_COLUMNS: &str = r#"id, title, text, "timestamp", user_id"#;

/// PostgresRepository
///
/// The `Repository` implementation backed by the Postgres pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Flat row of the listing join, folded into `MessageWithAuthor`.
#[derive(FromRow)]
struct MessageAuthorRow {
    id: i32,
    title: String,
    text: String,
    timestamp: DateTime<Utc>,
    first_name: String,
    last_name: String,
    username: String,
    membership_status: bool,
    admin: bool,
}

impl From<MessageAuthorRow> for MessageWithAuthor {
    fn from(row: MessageAuthorRow) -> Self {
        MessageWithAuthor {
            id: row.id,
            title: row.title,
            text: row.text,
            timestamp: row.timestamp,
            author: UserProfile {
                first_name: row.first_name,
                last_name: row.last_name,
                username: row.username,
                membership_status: row.membership_status,
                admin: row.admin,
            },
        }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn ping(&self) -> RepoResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, user: PreparedUser) -> RepoResult<User> {
        let sql = format!(
            "INSERT INTO users (first_name, last_name, username, password, admin) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.first_name)
            .bind(user.last_name)
            .bind(user.username)
            .bind(user.password.into_inner())
            .bind(user.admin)
            .fetch_one(&self.pool)
            .await
    }

    async fn find_user_by_id(&self, id: i32) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    /// list_users
    ///
    /// Builds the filter with `QueryBuilder` so every value stays a bound parameter.
    async fn list_users(&self, filter: UserFilter) -> RepoResult<Vec<User>> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));

        if let Some(status) = filter.membership_status {
            builder.push(" AND membership_status = ");
            builder.push_bind(status);
        }
        if let Some(admin) = filter.admin {
            builder.push(" AND admin = ");
            builder.push_bind(admin);
        }
        builder.push(" ORDER BY id");

        builder.build_query_as::<User>().fetch_all(&self.pool).await
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> RepoResult<Option<User>> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("UPDATE users SET updated_at = NOW()");

        if let Some(first_name) = &changes.first_name {
            builder.push(", first_name = ");
            builder.push_bind(first_name.clone());
        }
        if let Some(last_name) = &changes.last_name {
            builder.push(", last_name = ");
            builder.push_bind(last_name.clone());
        }
        if let Some(status) = changes.membership_status {
            builder.push(", membership_status = ");
            builder.push_bind(status);
        }
        if let Some(digest) = changes.password() {
            builder.push(", password = ");
            builder.push_bind(digest.as_str().to_string());
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {USER_COLUMNS}"));

        builder
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_user(&self, id: i32) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn create_message(&self, message: NewMessage) -> RepoResult<Message> {
        let sql = format!(
            "INSERT INTO messages (title, text, user_id) VALUES ($1, $2, $3) RETURNING {MESSAGE_COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&sql)
            .bind(message.title)
            .bind(message.text)
            .bind(message.user_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn find_message_by_id(&self, id: i32) -> RepoResult<Option<Message>> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1");
        sqlx::query_as::<_, Message>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_messages(&self, filter: MessageFilter) -> RepoResult<Vec<Message>> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE TRUE"));

        if let Some(user_id) = filter.user_id {
            builder.push(" AND user_id = ");
            builder.push_bind(user_id);
        }
        builder.push(r#" ORDER BY "timestamp" DESC, id DESC"#);

        builder.build_query_as::<Message>().fetch_all(&self.pool).await
    }

    async fn update_message(&self, id: i32, changes: MessageChanges) -> RepoResult<Option<Message>> {
        // COALESCE keeps the stored value for every field left unset.
        let sql = format!(
            "UPDATE messages SET title = COALESCE($1, title), text = COALESCE($2, text) \
             WHERE id = $3 RETURNING {MESSAGE_COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&sql)
            .bind(changes.title)
            .bind(changes.text)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_message(&self, id: i32) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// list_messages_with_authors
    ///
    /// One JOIN, so the author projection is eager-loaded with the messages.
    /// Only the five public author columns are selected.
    async fn list_messages_with_authors(&self) -> RepoResult<Vec<MessageWithAuthor>> {
        let rows = sqlx::query_as::<_, MessageAuthorRow>(
            r#"
            SELECT
                m.id, m.title, m.text, m."timestamp",
                u.first_name, u.last_name, u.username, u.membership_status, u.admin
            FROM messages m
            JOIN users u ON u.id = m.user_id
            ORDER BY m."timestamp" DESC, m.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MessageWithAuthor::from).collect())
    }
}
