//! Page payloads returned by the render (GET) steps.
//!
//! These carry exactly what a template needs: the page title, the current
//! user's public profile, and the notices drained for this render.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    flash::Notices,
    models::{MessageWithAuthor, User, UserProfile},
};

pub const HOME_TITLE: &str = "Members Only Club";

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HomePage {
    pub title: String,
    pub current_user: Option<UserProfile>,
    pub notices: Notices,
    pub messages: Vec<MessageWithAuthor>,
}

/// FormPage
///
/// Shared by the signup, login, join and new-message forms.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FormPage {
    pub title: String,
    pub current_user: Option<UserProfile>,
    pub notices: Notices,
}

impl FormPage {
    pub fn new(title: &str, user: Option<&User>, notices: Notices) -> Self {
        Self {
            title: title.to_string(),
            current_user: user.map(User::profile),
            notices,
        }
    }
}
