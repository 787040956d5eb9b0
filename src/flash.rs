//! One-shot notices stored against the session.
//!
//! A notice is pushed by whatever diverts the request (a guard, a failed
//! validation, a successful write) and is drained by the next render step.
//! Draining reads and clears in one go, so every notice is shown exactly once.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{error::AppError, validation::FieldError};

const SESSION_FLASH_ERROR: &str = "flash:error";
const SESSION_FLASH_SUCCESS: &str = "flash:success";
const SESSION_FLASH_VALIDATION: &str = "flash:validation_errors";

/// Notices
///
/// Everything pending for the next render, grouped by kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Notices {
    pub errors: Vec<String>,
    pub success: Vec<String>,
    pub validation_errors: Vec<FieldError>,
}

impl Notices {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.success.is_empty() && self.validation_errors.is_empty()
    }
}

/// Flash session management.
///
/// Wraps the request's `Session` and exposes only the pending-notice queue.
pub struct FlashSession<'a> {
    session: &'a Session,
}

impl<'a> FlashSession<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Queues an error notice for the next render.
    pub async fn error(&self, message: impl Into<String>) -> Result<(), AppError> {
        self.push(SESSION_FLASH_ERROR, message.into()).await
    }

    /// Queues a success notice for the next render.
    pub async fn success(&self, message: impl Into<String>) -> Result<(), AppError> {
        self.push(SESSION_FLASH_SUCCESS, message.into()).await
    }

    /// Queues the full list of failed constraints from one submission.
    pub async fn validation_errors(&self, errors: Vec<FieldError>) -> Result<(), AppError> {
        let mut pending: Vec<FieldError> = self
            .session
            .get(SESSION_FLASH_VALIDATION)
            .await?
            .unwrap_or_default();
        pending.extend(errors);
        self.session.insert(SESSION_FLASH_VALIDATION, pending).await?;
        Ok(())
    }

    /// Reads and clears every pending notice.
    pub async fn drain(&self) -> Result<Notices, AppError> {
        let errors: Vec<String> = self
            .session
            .remove(SESSION_FLASH_ERROR)
            .await?
            .unwrap_or_default();
        let success: Vec<String> = self
            .session
            .remove(SESSION_FLASH_SUCCESS)
            .await?
            .unwrap_or_default();
        let validation_errors: Vec<FieldError> = self
            .session
            .remove(SESSION_FLASH_VALIDATION)
            .await?
            .unwrap_or_default();

        Ok(Notices {
            errors,
            success,
            validation_errors,
        })
    }

    async fn push(&self, key: &str, message: String) -> Result<(), AppError> {
        let mut pending: Vec<String> = self.session.get(key).await?.unwrap_or_default();
        pending.push(message);
        self.session.insert(key, pending).await?;
        Ok(())
    }
}
