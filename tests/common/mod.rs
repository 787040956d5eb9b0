#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, StatusCode, header},
};
use chrono::{DateTime, Utc};
use members_board::{
    AppConfig, AppState, create_router,
    models::{
        Message, MessageChanges, MessageFilter, MessageWithAuthor, NewMessage, NewUser,
        PreparedUser, User, UserChanges, UserFilter,
    },
    repository::{RepoResult, Repository},
};
use serde::de::DeserializeOwned;
use sqlx::error::{DatabaseError, ErrorKind};
use std::{
    borrow::Cow,
    error::Error as StdError,
    fmt,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};
use tower::ServiceExt;
use tower_sessions::MemoryStore;

pub const PASSWORD: &str = "hunter22";

// --- In-memory Repository ---

/// What Postgres reports when the `users.username` UNIQUE constraint is hit.
#[derive(Debug)]
pub struct UniqueViolation;

impl fmt::Display for UniqueViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("duplicate key value violates unique constraint \"users_username_key\"")
    }
}

impl StdError for UniqueViolation {}

impl DatabaseError for UniqueViolation {
    fn message(&self) -> &str {
        "duplicate key value violates unique constraint \"users_username_key\""
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed("23505"))
    }

    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::UniqueViolation
    }
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    messages: Vec<Message>,
    next_user_id: i32,
    next_message_id: i32,
}

/// MemoryRepo
///
/// A `Repository` over plain vectors. Mirrors the store's constraints that the
/// handlers rely on: unique usernames, cascading user deletion, newest-first
/// listing.
#[derive(Default)]
pub struct MemoryRepo {
    tables: Mutex<Tables>,
    failing: AtomicBool,
    blind_lookups: AtomicBool,
}

impl MemoryRepo {
    /// Makes every subsequent call fail as if the store were unreachable.
    pub fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Makes username lookups miss, as if another signup commits between the
    /// availability check and the insert.
    pub fn blind_username_lookups(&self) {
        self.blind_lookups.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> RepoResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(sqlx::Error::PoolTimedOut)
        } else {
            Ok(())
        }
    }

    fn insert_user(&self, user: PreparedUser) -> RepoResult<User> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(sqlx::Error::Database(Box::new(UniqueViolation)));
        }
        tables.next_user_id += 1;
        let now = Utc::now();
        let created = User {
            id: tables.next_user_id,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            password: user.password.into_inner(),
            membership_status: false,
            admin: user.admin,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    /// Inserts a user with `PASSWORD`, hashed the same way signup does.
    pub fn seed_user(&self, username: &str, admin: bool, member: bool) -> User {
        let prepared = NewUser {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            username: username.to_string(),
            password: PASSWORD.to_string(),
            admin,
        }
        .prepare()
        .unwrap();
        let mut user = self.insert_user(prepared).unwrap();
        if member {
            let mut tables = self.tables.lock().unwrap();
            let stored = tables.users.iter_mut().find(|u| u.id == user.id).unwrap();
            stored.membership_status = true;
            user = stored.clone();
        }
        user
    }

    pub fn seed_message(&self, user_id: i32, title: &str, timestamp: DateTime<Utc>) -> Message {
        let mut tables = self.tables.lock().unwrap();
        tables.next_message_id += 1;
        let message = Message {
            id: tables.next_message_id,
            title: title.to_string(),
            text: format!("{title} body"),
            timestamp,
            user_id,
        };
        tables.messages.push(message.clone());
        message
    }

    pub fn users(&self) -> Vec<User> {
        self.tables.lock().unwrap().users.clone()
    }

    pub fn user(&self, id: i32) -> Option<User> {
        self.users().into_iter().find(|u| u.id == id)
    }

    pub fn messages(&self) -> Vec<Message> {
        self.tables.lock().unwrap().messages.clone()
    }
}

#[async_trait]
impl Repository for MemoryRepo {
    async fn ping(&self) -> RepoResult<()> {
        self.check()
    }

    async fn create_user(&self, user: PreparedUser) -> RepoResult<User> {
        self.check()?;
        self.insert_user(user)
    }

    async fn find_user_by_id(&self, id: i32) -> RepoResult<Option<User>> {
        self.check()?;
        Ok(self.user(id))
    }

    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.check()?;
        if self.blind_lookups.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.users().into_iter().find(|u| u.username == username))
    }

    async fn list_users(&self, filter: UserFilter) -> RepoResult<Vec<User>> {
        self.check()?;
        Ok(self
            .users()
            .into_iter()
            .filter(|u| filter.membership_status.is_none_or(|m| u.membership_status == m))
            .filter(|u| filter.admin.is_none_or(|a| u.admin == a))
            .collect())
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> RepoResult<Option<User>> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(first_name) = &changes.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &changes.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(status) = changes.membership_status {
            user.membership_status = status;
        }
        if let Some(digest) = changes.password() {
            user.password = digest.as_str().to_string();
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i32) -> RepoResult<u64> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        tables.messages.retain(|m| m.user_id != id);
        Ok((before - tables.users.len()) as u64)
    }

    async fn create_message(&self, message: NewMessage) -> RepoResult<Message> {
        self.check()?;
        if self.user(message.user_id).is_none() {
            return Err(sqlx::Error::Protocol("foreign key violation".to_string()));
        }
        let mut tables = self.tables.lock().unwrap();
        tables.next_message_id += 1;
        let created = Message {
            id: tables.next_message_id,
            title: message.title,
            text: message.text,
            timestamp: Utc::now(),
            user_id: message.user_id,
        };
        tables.messages.push(created.clone());
        Ok(created)
    }

    async fn find_message_by_id(&self, id: i32) -> RepoResult<Option<Message>> {
        self.check()?;
        Ok(self.messages().into_iter().find(|m| m.id == id))
    }

    async fn list_messages(&self, filter: MessageFilter) -> RepoResult<Vec<Message>> {
        self.check()?;
        let mut messages: Vec<Message> = self
            .messages()
            .into_iter()
            .filter(|m| filter.user_id.is_none_or(|id| m.user_id == id))
            .collect();
        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(messages)
    }

    async fn update_message(&self, id: i32, changes: MessageChanges) -> RepoResult<Option<Message>> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let Some(message) = tables.messages.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            message.title = title;
        }
        if let Some(text) = changes.text {
            message.text = text;
        }
        Ok(Some(message.clone()))
    }

    async fn delete_message(&self, id: i32) -> RepoResult<u64> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.messages.len();
        tables.messages.retain(|m| m.id != id);
        Ok((before - tables.messages.len()) as u64)
    }

    async fn list_messages_with_authors(&self) -> RepoResult<Vec<MessageWithAuthor>> {
        let messages = self.list_messages(MessageFilter::default()).await?;
        Ok(messages
            .into_iter()
            .filter_map(|m| {
                let author = self.user(m.user_id)?.profile();
                Some(MessageWithAuthor {
                    id: m.id,
                    title: m.title,
                    text: m.text,
                    timestamp: m.timestamp,
                    author,
                })
            })
            .collect())
    }
}

// --- Router Harness ---

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("response body is not the expected JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Asserts a redirect and returns its target.
    pub fn redirect(&self) -> &str {
        assert_eq!(self.status, StatusCode::SEE_OTHER, "expected a redirect");
        self.location.as_deref().expect("redirect without location")
    }
}

/// TestApp
///
/// Drives the real router in-process, carrying the session cookie between
/// requests like a browser would.
pub struct TestApp {
    pub router: Router,
    pub repo: Arc<MemoryRepo>,
    cookie: Option<String>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let repo = Arc::new(MemoryRepo::default());
        let state = AppState {
            repo: repo.clone(),
            config,
        };
        let router = create_router(state, MemoryStore::default()).expect("router");
        Self {
            router,
            repo,
            cookie: None,
        }
    }

    /// A second visitor on the same app and store, with no cookie.
    pub fn fresh_visitor(&self) -> Self {
        Self {
            router: self.router.clone(),
            repo: self.repo.clone(),
            cookie: None,
        }
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = self.request("GET", path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post(&mut self, path: &str, form: &[(&str, &str)]) -> TestResponse {
        let body = serde_urlencoded::to_string(form).unwrap();
        let request = self
            .request("POST", path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Logs in with `PASSWORD` and asserts the login succeeded.
    pub async fn login(&mut self, username: &str) {
        let response = self
            .post("/auth/login", &[("username", username), ("password", PASSWORD)])
            .await;
        assert_eq!(response.redirect(), "/", "login should land on the home page");
    }

    fn request(&self, method: &str, path: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(path);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            let raw = value.to_str().unwrap();
            let pair = raw.split(';').next().unwrap_or_default().trim();
            let expired = raw.contains("Max-Age=0") || pair.ends_with('=');
            self.cookie = if expired { None } else { Some(pair.to_string()) };
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            location,
            body,
        }
    }
}
