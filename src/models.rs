use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{error::AppError, password::PasswordDigest};

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A row of the `users` table. The `password` column only ever holds an
/// Argon2 PHC string, and is never serialized.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    /// Email-shaped login identifier, unique across the table.
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub membership_status: bool,
    pub admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The public face of the user, safe to hand to a view.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            username: self.username.clone(),
            membership_status: self.membership_status,
            admin: self.admin,
        }
    }
}

/// Message
///
/// A row of the `messages` table. Always owned by an existing user; the
/// foreign key cascades on user deletion.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i32,
    pub title: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: i32,
}

/// UserProfile
///
/// The author projection: exactly the user fields a message listing exposes.
/// Also used for the current user on every rendered page.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub membership_status: bool,
    pub admin: bool,
}

/// MessageWithAuthor
///
/// A message eager-loaded with its author's projection, as listed on the home page.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MessageWithAuthor {
    pub id: i32,
    pub title: String,
    pub text: String,
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
    pub author: UserProfile,
}

// --- Write Payloads ---

/// NewUser
///
/// Signup data as received. Carries the plaintext password, so it cannot be
/// handed to the repository directly: call `prepare` first.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: String,
    pub admin: bool,
}

impl NewUser {
    /// Hashes the credential, producing the only shape the store accepts.
    pub fn prepare(self) -> Result<PreparedUser, AppError> {
        let password = PasswordDigest::hash(&self.password)?;
        Ok(PreparedUser {
            first_name: self.first_name,
            last_name: self.last_name,
            username: self.username,
            password,
            admin: self.admin,
        })
    }
}

/// PreparedUser
///
/// A `NewUser` whose password has been replaced by its digest.
#[derive(Debug, Clone)]
pub struct PreparedUser {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: PasswordDigest,
    pub admin: bool,
}

/// UserChanges
///
/// Partial update of a user. `None` leaves the column untouched. A new
/// password can only be set through `with_password`, which hashes it.
/// The admin flag is fixed at creation and has no counterpart here.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub membership_status: Option<bool>,
    password: Option<PasswordDigest>,
}

impl UserChanges {
    pub fn membership(status: bool) -> Self {
        Self {
            membership_status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_password(mut self, plaintext: &str) -> Result<Self, AppError> {
        self.password = Some(PasswordDigest::hash(plaintext)?);
        Ok(self)
    }

    pub fn password(&self) -> Option<&PasswordDigest> {
        self.password.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.membership_status.is_none()
            && self.password.is_none()
    }
}

/// Optional predicates for listing users. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub membership_status: Option<bool>,
    pub admin: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub title: String,
    pub text: String,
    pub user_id: i32,
}

#[derive(Debug, Clone, Default)]
pub struct MessageChanges {
    pub title: Option<String>,
    pub text: Option<String>,
}

/// Optional predicates for listing messages, newest first.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    pub user_id: Option<i32>,
}
