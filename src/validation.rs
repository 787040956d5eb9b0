//! Declarative form validation.
//!
//! Each route owns a list of `Rule`s: a field name, a check, and the message
//! shown when the check fails. `validate` runs the whole list in order and
//! returns every failure, never stopping at the first one.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use validator::ValidateEmail;

use crate::{
    error::AppError,
    forms::{MessageForm, SignupForm},
    repository::Repository,
};

pub const MIN_PASSWORD_CHARS: usize = 6;
/// Width of the `VARCHAR(255)` columns, counted in characters as Postgres does.
pub const MAX_FIELD_CHARS: usize = 255;

pub const USERNAME_TAKEN: &str = "Email already in use.";

fn fits(value: &str) -> bool {
    value.chars().count() <= MAX_FIELD_CHARS
}

/// FieldError
///
/// One failed constraint, as displayed next to the form.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// The predicate side of a rule.
pub enum Check<F> {
    /// Pure check over the submitted form.
    Predicate(fn(&F) -> bool),
    /// Passes when no user holds the extracted username. Needs the store.
    UsernameAvailable(fn(&F) -> &str),
}

pub struct Rule<F> {
    pub field: &'static str,
    pub check: Check<F>,
    pub message: &'static str,
}

pub const SIGNUP_RULES: &[Rule<SignupForm>] = &[
    Rule {
        field: "firstName",
        check: Check::Predicate(|f| !f.first_name.trim().is_empty()),
        message: "First name is required.",
    },
    Rule {
        field: "firstName",
        check: Check::Predicate(|f| fits(&f.first_name)),
        message: "First name must be at most 255 characters.",
    },
    Rule {
        field: "lastName",
        check: Check::Predicate(|f| !f.last_name.trim().is_empty()),
        message: "Last name is required.",
    },
    Rule {
        field: "lastName",
        check: Check::Predicate(|f| fits(&f.last_name)),
        message: "Last name must be at most 255 characters.",
    },
    Rule {
        field: "username",
        check: Check::Predicate(|f| f.username.validate_email()),
        message: "Username must be a valid email.",
    },
    Rule {
        field: "username",
        check: Check::Predicate(|f| fits(&f.username)),
        message: "Username must be at most 255 characters.",
    },
    Rule {
        field: "username",
        check: Check::UsernameAvailable(|f| f.username.as_str()),
        message: USERNAME_TAKEN,
    },
    Rule {
        field: "password",
        check: Check::Predicate(|f| f.password.chars().count() >= MIN_PASSWORD_CHARS),
        message: "Password must be at least 6 characters.",
    },
    Rule {
        field: "confirmPassword",
        check: Check::Predicate(|f| f.confirm_password == f.password),
        message: "Passwords do not match.",
    },
];

pub const MESSAGE_RULES: &[Rule<MessageForm>] = &[
    Rule {
        field: "title",
        check: Check::Predicate(|f| !f.title.trim().is_empty()),
        message: "Title is required.",
    },
    Rule {
        field: "title",
        check: Check::Predicate(|f| fits(&f.title)),
        message: "Title must be at most 255 characters.",
    },
    Rule {
        field: "text",
        check: Check::Predicate(|f| !f.text.trim().is_empty()),
        message: "Text content is required.",
    },
];

/// validate
///
/// Evaluates `rules` against `form` in declaration order and collects every
/// failure. An empty result means the form is valid. Store errors during the
/// availability check abort validation.
pub async fn validate<F: Sync>(
    form: &F,
    rules: &[Rule<F>],
    repo: &dyn Repository,
) -> Result<Vec<FieldError>, AppError> {
    let mut failures = Vec::new();

    for rule in rules {
        let passed = match &rule.check {
            Check::Predicate(predicate) => predicate(form),
            Check::UsernameAvailable(username) => {
                repo.find_user_by_username(username(form)).await?.is_none()
            }
        };
        if !passed {
            failures.push(FieldError::new(rule.field, rule.message));
        }
    }

    Ok(failures)
}
