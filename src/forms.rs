use serde::Deserialize;
use utoipa::ToSchema;

/// Value a checked checkbox submits when it has no explicit `value`.
const CHECKBOX_ON: &str = "on";

// Every field defaults to empty, so a missing field fails validation instead of
// rejecting the whole submission.

/// SignupForm
///
/// Body of `POST /auth/signup`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    /// Checkbox token; present as `on` when ticked.
    pub admin: Option<String>,
}

impl SignupForm {
    /// Trims the free-text fields. Credentials are left exactly as typed.
    pub fn normalized(mut self) -> Self {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self
    }

    pub fn wants_admin(&self) -> bool {
        self.admin.as_deref() == Some(CHECKBOX_ON)
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct JoinForm {
    pub passcode: String,
}

/// MessageForm
///
/// Body of `POST /messages/new`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct MessageForm {
    pub title: String,
    pub text: String,
}

impl MessageForm {
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.text = self.text.trim().to_string();
        self
    }
}
