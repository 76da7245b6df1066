use std::collections::BTreeMap;

use crate::models::user::UserForm;

/// Characters accepted as the "special character" of a password.
const PASSWORD_SYMBOLS: &str = "@$!%*?&";

/// Field name → first rule that field violates. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Record `message` for `field` if present. Only the first message per field is kept.
    pub fn check(&mut self, field: &'static str, message: Option<String>) {
        if let Some(message) = message {
            self.0.entry(field).or_insert(message);
        }
    }

    pub fn message(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(String::as_str)
    }
}

/// Full name: required, at least 3 characters once trimmed.
pub fn validate_fullname(fullname: &str) -> Option<String> {
    let trimmed = fullname.trim();
    if trimmed.is_empty() {
        return Some("Full name is required".to_string());
    }
    if trimmed.chars().count() < 3 {
        return Some("Full name must be at least 3 characters".to_string());
    }
    None
}

/// Username: required, at least 3 characters, ASCII letters, digits and underscores only.
pub fn validate_username(username: &str) -> Option<String> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Some("Username is required".to_string());
    }
    if trimmed.chars().count() < 3 {
        return Some("Username must be at least 3 characters".to_string());
    }
    // Checked untrimmed: surrounding spaces are rejected, not stripped.
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Some("Username can only contain letters, numbers, and underscores".to_string());
    }
    None
}

/// Password: at least 8 characters with a lower-case letter, an upper-case
/// letter, a digit and one of `@$!%*?&`.
pub fn validate_password(password: &str) -> Option<String> {
    if password.is_empty() {
        return Some("Password is required".to_string());
    }
    if password.chars().count() < 8 {
        return Some("Password must be at least 8 characters".to_string());
    }
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));
    if !(has_lower && has_upper && has_digit && has_symbol) {
        return Some(
            "Password must contain uppercase, lowercase, number, and special character".to_string(),
        );
    }
    None
}

pub fn validate_role(role: &str) -> Option<String> {
    match role.parse::<crate::models::user::Role>() {
        Ok(_) => None,
        Err(_) => Some("Please select a valid role".to_string()),
    }
}

/// Rules for the create-user form. Expects an already-normalized draft.
pub fn validate_create(form: &UserForm) -> FieldErrors {
    let mut errors = validate_edit(form);
    errors.check("password", validate_password(&form.password));
    errors
}

/// Rules for the edit-user modal (no password field).
pub fn validate_edit(form: &UserForm) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.check("fullname", validate_fullname(&form.fullname));
    errors.check("username", validate_username(&form.username));
    errors.check("role", validate_role(&form.role));
    errors
}

/// Rules for the change-password form.
pub fn validate_password_change(current: &str, new: &str, confirm: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if current.is_empty() {
        errors.check("current_password", Some("Current password is required".to_string()));
    }
    errors.check("new_password", validate_password(new));
    if new != confirm {
        errors.check("confirm_password", Some("New passwords do not match".to_string()));
    }
    errors
}
