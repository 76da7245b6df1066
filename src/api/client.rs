use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::auth::session::SessionStore;
use crate::config::AppConfig;
use crate::models::user::{NewUser, User, UserPatch};

use super::error::ApiError;
use super::types::{ChangePasswordRequest, Envelope, ErrorBody, LoginData, LoginRequest};

const LOGIN_PATH: &str = "/api/v1/users/auth/login";
const ME_PATH: &str = "/api/v1/users/auth/me";
const CHANGE_PASSWORD_PATH: &str = "/api/v1/users/change-password";
const USERS_PATH: &str = "/api/v1/users";

/// Thin wrapper over `reqwest::Client` that knows the API's endpoints and
/// response envelope. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ApiError::Network(format!("invalid API base URL {base_url:?}: {e}")))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base: parsed.as_str().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, config.api_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// POST credentials, returning the token and signed-in user.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginData, ApiError> {
        let req = self
            .request(Method::POST, LOGIN_PATH)
            .json(&LoginRequest { username, password });
        let envelope: Envelope<LoginData> = self.execute(req, false, "Login failed").await?;
        envelope
            .data
            .ok_or_else(|| ApiError::Network("login response carried no data".to_string()))
    }

    pub async fn current_user(&self, store: &SessionStore) -> Result<User, ApiError> {
        let req = self.authorized(store, Method::GET, ME_PATH)?;
        let envelope: Envelope<User> = self.execute(req, true, "Failed to get user profile").await?;
        envelope
            .data
            .ok_or_else(|| ApiError::Network("profile response carried no data".to_string()))
    }

    /// Returns the server's confirmation message, if any.
    pub async fn change_password(
        &self,
        store: &SessionStore,
        current_password: &str,
        new_password: &str,
    ) -> Result<Option<String>, ApiError> {
        let req = self
            .authorized(store, Method::POST, CHANGE_PASSWORD_PATH)?
            .json(&ChangePasswordRequest { current_password, new_password });
        let envelope: Envelope<serde_json::Value> =
            self.execute(req, true, "Failed to change password").await?;
        Ok(envelope.message)
    }

    /// Full user collection, in server order.
    pub async fn list_users(&self, store: &SessionStore) -> Result<Vec<User>, ApiError> {
        let req = self.authorized(store, Method::GET, USERS_PATH)?;
        let envelope: Envelope<Vec<User>> = self.execute(req, true, "Failed to fetch users").await?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// Create a user. Returns the created record when the server echoes it back.
    pub async fn create_user(&self, store: &SessionStore, user: &NewUser) -> Result<Option<User>, ApiError> {
        let req = self.authorized(store, Method::POST, USERS_PATH)?.json(user);
        let envelope: Envelope<serde_json::Value> =
            self.execute(req, true, "Failed to create user").await?;
        Ok(envelope
            .data
            .and_then(|data| serde_json::from_value::<User>(data).ok()))
    }

    pub async fn update_user(&self, store: &SessionStore, id: i64, patch: &UserPatch) -> Result<(), ApiError> {
        let req = self
            .authorized(store, Method::PUT, &format!("{USERS_PATH}/{id}"))?
            .json(patch);
        let fallback = format!("Failed to update user ID: {id}");
        let _: Envelope<serde_json::Value> = self.execute(req, true, &fallback).await?;
        Ok(())
    }

    pub async fn delete_user(&self, store: &SessionStore, id: i64) -> Result<(), ApiError> {
        let req = self.authorized(store, Method::DELETE, &format!("{USERS_PATH}/{id}"))?;
        let fallback = format!("Failed to delete user ID: {id}");
        let _: Envelope<serde_json::Value> = self.execute(req, true, &fallback).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base, path))
    }

    // The token is read from the store on every call, never cached here.
    fn authorized(&self, store: &SessionStore, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let token = store.get_token().ok_or(ApiError::MissingToken)?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        authenticated: bool,
        fallback: &str,
    ) -> Result<Envelope<T>, ApiError> {
        let resp = req.send().await.map_err(|e| {
            log::warn!("API request failed: {e}");
            ApiError::from(e)
        })?;
        let status = resp.status();
        let url_path = resp.url().path().to_string();
        let body = resp.bytes().await?;
        log::debug!("API {url_path} -> {status}");

        if authenticated && status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string());
            log::warn!("API {url_path} failed with {status}: {message}");
            return Err(ApiError::Api { status: status.as_u16(), message });
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Envelope::empty());
        }

        let envelope: Envelope<T> = serde_json::from_slice(&body)
            .map_err(|e| ApiError::Network(format!("invalid response from {url_path}: {e}")))?;

        if !envelope.success {
            let message = envelope
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string());
            return Err(ApiError::Api { status: status.as_u16(), message });
        }

        Ok(envelope)
    }
}
