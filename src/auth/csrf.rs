use actix_session::Session;

use crate::errors::AppError;

const CSRF_KEY: &str = "csrf_token";

/// Token embedded in every form of the session, minted on first use.
pub fn get_or_create_token(session: &Session) -> String {
    match session.get::<String>(CSRF_KEY) {
        Ok(Some(token)) => token,
        _ => {
            let token = hex::encode(rand::random::<[u8; 32]>());
            if let Err(e) = session.insert(CSRF_KEY, &token) {
                log::warn!("Failed to store CSRF token: {e}");
            }
            token
        }
    }
}

/// Reject a form post whose token does not match the session's.
pub fn validate_csrf(session: &Session, submitted: &str) -> Result<(), AppError> {
    let stored = session.get::<String>(CSRF_KEY).ok().flatten();
    match stored {
        Some(expected) if !expected.is_empty() && tokens_match(&expected, submitted) => Ok(()),
        _ => {
            log::warn!("Rejected form post with a missing or stale CSRF token");
            Err(AppError::Csrf)
        }
    }
}

/// Compares every byte so timing does not reveal the matching prefix.
fn tokens_match(expected: &str, submitted: &str) -> bool {
    if expected.len() != submitted.len() {
        return false;
    }
    let diff = expected
        .bytes()
        .zip(submitted.bytes())
        .fold(0u8, |diff, (x, y)| diff | (x ^ y));
    diff == 0
}
