use serde::{Deserialize, Serialize};

use crate::models::user::User;

/// Response wrapper used by every endpoint: `{ success, message?, data }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Absent on some endpoints; a 2xx status then counts as success.
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Envelope for a 2xx response with no body (e.g. 204 on delete).
    pub(crate) fn empty() -> Self {
        Self { success: true, message: None, data: None }
    }
}

fn default_success() -> bool {
    true
}

/// Error bodies are only read for their message.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Payload of a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChangePasswordRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}
