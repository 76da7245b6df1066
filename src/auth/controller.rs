use std::fmt;

use tokio::sync::watch;

use crate::api::{ApiClient, ApiError};
use crate::auth::session::{SessionStore, TOKEN_TTL_SECS};
use crate::models::user::User;

/// Authentication state of the current browser session.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthStatus {
    /// The token has not been checked against the API yet.
    Loading,
    Anonymous,
    Authenticated(User),
}

impl AuthStatus {
    pub fn user(&self) -> Option<&User> {
        match self {
            AuthStatus::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AuthStatus::Loading)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    /// Login was refused; carries the message to show on the form.
    InvalidCredentials(String),
    /// The session token was rejected. The controller has already signed out.
    Unauthorized,
    Api(ApiError),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials(msg) => f.write_str(msg),
            AuthError::Unauthorized => write!(f, "Session expired. Please log in again."),
            AuthError::Api(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Sole writer of authentication state.
///
/// Rebuilt from the persisted token on every request, so it can never
/// disagree with what the route guard sees. Observers follow transitions
/// through [`AuthController::subscribe`].
pub struct AuthController {
    store: SessionStore,
    api: ApiClient,
    state: watch::Sender<AuthStatus>,
}

impl AuthController {
    pub fn new(store: SessionStore, api: ApiClient) -> Self {
        let (state, _) = watch::channel(AuthStatus::Loading);
        Self { store, api, state }
    }

    pub fn status(&self) -> AuthStatus {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.state.subscribe()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn into_store(self) -> SessionStore {
        self.store
    }

    /// Settle the `Loading` state: look up the profile behind the stored
    /// token, discarding the token if the lookup fails for any reason.
    pub async fn resolve(&mut self) -> AuthStatus {
        if !self.store.is_authenticated() {
            self.transition(AuthStatus::Anonymous);
            return self.status();
        }

        match self.api.current_user(&self.store).await {
            Ok(user) => self.transition(AuthStatus::Authenticated(user)),
            Err(e) => {
                log::info!("Discarding session token: {e}");
                self.store.clear_token();
                self.transition(AuthStatus::Anonymous);
            }
        }
        self.status()
    }

    /// Exchange credentials for a token and persist it.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<User, AuthError> {
        match self.api.login(username, password).await {
            Ok(data) if !data.token.is_empty() => {
                self.store.set_token(&data.token, TOKEN_TTL_SECS);
                self.transition(AuthStatus::Authenticated(data.user.clone()));
                Ok(data.user)
            }
            Ok(_) => {
                log::warn!("Login for '{username}' succeeded without a token");
                self.transition(AuthStatus::Anonymous);
                Err(AuthError::InvalidCredentials("Invalid username or password".to_string()))
            }
            Err(e) => {
                self.transition(AuthStatus::Anonymous);
                let message = match e {
                    ApiError::Api { message, .. } => message,
                    other => other.to_string(),
                };
                Err(AuthError::InvalidCredentials(message))
            }
        }
    }

    /// Local sign-out. The API has no revocation endpoint, so the token
    /// itself stays valid until it expires.
    pub fn logout(&mut self) {
        self.store.clear_token();
        self.transition(AuthStatus::Anonymous);
    }

    /// Tear the session down after the API rejected the token.
    pub fn expire_session(&mut self) {
        log::info!("Session token rejected by the API, signing out");
        self.logout();
    }

    /// Rotate the signed-in user's password. Returns the server's message.
    pub async fn change_password(&mut self, current: &str, new: &str) -> Result<Option<String>, AuthError> {
        match self.api.change_password(&self.store, current, new).await {
            Ok(message) => Ok(message),
            Err(ApiError::Unauthorized) => {
                self.expire_session();
                Err(AuthError::Unauthorized)
            }
            Err(e) => Err(AuthError::Api(e)),
        }
    }

    fn transition(&mut self, next: AuthStatus) {
        self.state.send_replace(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn offline_client() -> ApiClient {
        ApiClient::new("http://127.0.0.1:9", Duration::from_millis(200)).expect("client")
    }

    #[tokio::test]
    async fn test_resolve_without_token_is_anonymous() {
        let mut auth = AuthController::new(SessionStore::detached(), offline_client());
        assert!(auth.status().is_loading());
        assert_eq!(auth.resolve().await, AuthStatus::Anonymous);
    }

    #[test]
    fn test_logout_is_idempotent() {
        let store = SessionStore::with_token(Some("tok".to_string()), true);
        let mut auth = AuthController::new(store, offline_client());

        auth.logout();
        assert!(!auth.store().is_authenticated());
        auth.logout();
        assert!(!auth.store().is_authenticated());
        assert_eq!(auth.status(), AuthStatus::Anonymous);
    }

    #[test]
    fn test_subscribers_see_transitions() {
        let store = SessionStore::with_token(Some("tok".to_string()), true);
        let mut auth = AuthController::new(store, offline_client());
        let mut rx = auth.subscribe();
        assert!(rx.borrow_and_update().is_loading());

        auth.logout();
        assert!(rx.has_changed().expect("sender alive"));
        assert_eq!(*rx.borrow_and_update(), AuthStatus::Anonymous);
    }

    #[tokio::test]
    async fn test_unreachable_api_discards_token() {
        let store = SessionStore::with_token(Some("tok".to_string()), true);
        let mut auth = AuthController::new(store, offline_client());
        assert_eq!(auth.resolve().await, AuthStatus::Anonymous);
        assert!(!auth.store().is_authenticated());
    }
}
