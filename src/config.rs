use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_APP_NAME: &str = "CMI Loan Assessment";
const DEFAULT_API_TIMEOUT_SECS: u64 = 15;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the user-management REST API.
    pub api_base_url: String,
    pub bind_addr: String,
    /// Key for the flash/CSRF session cookie. Must be at least 64 bytes.
    pub session_key: Option<String>,
    /// `Secure` attribute on every cookie we set.
    pub cookie_secure: bool,
    pub api_timeout: Duration,
    pub app_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            session_key: None,
            cookie_secure: true,
            api_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

impl AppConfig {
    /// Load settings from the process environment (after `.env` has been applied).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Unset or invalid values
    /// fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_base_url = non_empty("API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        let cookie_secure = match non_empty("COOKIE_SECURE").as_deref() {
            None => defaults.cookie_secure,
            Some("1") | Some("true") | Some("yes") => true,
            Some("0") | Some("false") | Some("no") => false,
            Some(other) => {
                log::warn!("Ignoring COOKIE_SECURE={other:?}, expected true/false");
                defaults.cookie_secure
            }
        };

        let api_timeout = match non_empty("API_TIMEOUT_SECS") {
            None => defaults.api_timeout,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    log::warn!("Ignoring API_TIMEOUT_SECS={raw:?}, expected a positive integer");
                    defaults.api_timeout
                }
            },
        };

        Self {
            api_base_url,
            bind_addr: non_empty("BIND_ADDR").unwrap_or(defaults.bind_addr),
            session_key: lookup("SESSION_KEY").filter(|v| !v.is_empty()),
            cookie_secure,
            api_timeout,
            app_name: non_empty("APP_NAME").unwrap_or(defaults.app_name),
        }
    }
}
