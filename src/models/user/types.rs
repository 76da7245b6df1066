use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Access level of a back-office account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::User];

    /// Wire value, as the API sends and expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::User => "USER",
        }
    }

    /// Badge text shown in the user table.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::User => "User",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Admin => "Full system access",
            Role::Manager => "Can manage users and loans",
            Role::User => "Basic user access",
        }
    }

    /// CSS modifier for the role badge.
    pub fn badge_class(&self) -> &'static str {
        match self {
            Role::Admin => "badge-admin",
            Role::Manager => "badge-manager",
            Role::User => "badge-user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "MANAGER" => Ok(Role::Manager),
            "USER" => Ok(Role::User),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// A back-office account as returned by the API. Ids are assigned server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i64,
    pub fullname: String,
    pub username: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl User {
    pub fn initial(&self) -> String {
        self.fullname
            .chars()
            .next()
            .or_else(|| self.username.chars().next())
            .unwrap_or('?')
            .to_uppercase()
            .to_string()
    }
}

/// Some endpoints send the id as a number, others as a numeric string.
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Editable fields of an existing user. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UserPatch {
    pub fn apply_to(&self, user: &mut User) {
        if let Some(fullname) = &self.fullname {
            user.fullname = fullname.clone();
        }
        if let Some(username) = &self.username {
            user.username = username.clone();
        }
        if let Some(role) = self.role {
            user.role = role;
        }
    }
}

/// Body of the create-user call.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub fullname: String,
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Draft submitted by the create and edit forms.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserForm {
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub action: String,
    pub csrf_token: String,
}

impl UserForm {
    /// Fresh create-form draft.
    pub fn blank() -> Self {
        Self {
            role: Role::default().as_str().to_string(),
            ..Self::default()
        }
    }

    /// Edit-form draft pre-filled from an existing user.
    pub fn from_user(user: &User) -> Self {
        Self {
            fullname: user.fullname.clone(),
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
            ..Self::default()
        }
    }

    /// Lower-case the username, as the input field does while typing.
    pub fn normalized(mut self) -> Self {
        self.username = self.username.to_lowercase();
        self
    }

    pub fn parsed_role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    pub fn is_reset(&self) -> bool {
        self.action == "reset"
    }

    pub fn to_new_user(&self) -> Option<NewUser> {
        Some(NewUser {
            fullname: self.fullname.trim().to_string(),
            username: self.username.trim().to_string(),
            password: self.password.clone(),
            role: self.parsed_role()?,
        })
    }

    pub fn to_patch(&self) -> UserPatch {
        UserPatch {
            fullname: Some(self.fullname.trim().to_string()),
            username: Some(self.username.trim().to_string()),
            role: self.parsed_role(),
        }
    }
}
