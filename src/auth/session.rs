use std::future::{Ready, ready};

use actix_session::Session;
use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, web};

use crate::config::AppConfig;

/// Cookie holding the bearer token.
pub const TOKEN_COOKIE: &str = "token";

/// Lifetime of a freshly issued token cookie (24 hours).
pub const TOKEN_TTL_SECS: i64 = 86_400;

/// The persisted bearer-token slot for one request.
///
/// Reads come from the request's `Cookie` header. Writes are queued and take
/// effect on the browser once [`SessionStore::apply`] copies them onto the
/// response; the in-request view reflects them immediately.
#[derive(Debug, Clone)]
pub struct SessionStore {
    token: Option<String>,
    secure: bool,
    pending: Vec<Cookie<'static>>,
}

impl Default for SessionStore {
    /// A store with no browser behind it: always anonymous.
    fn default() -> Self {
        Self { token: None, secure: true, pending: Vec::new() }
    }
}

impl SessionStore {
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn from_request(req: &HttpRequest) -> Self {
        let secure = req
            .app_data::<web::Data<AppConfig>>()
            .map(|config| config.cookie_secure)
            .unwrap_or(true);
        let token = req.cookie(TOKEN_COOKIE).map(|c| c.value().to_string());
        Self::with_token(token, secure)
    }

    pub fn with_token(token: Option<String>, secure: bool) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
            secure,
            pending: Vec::new(),
        }
    }

    /// Persist `value` as the session token for `ttl_secs` seconds.
    pub fn set_token(&mut self, value: &str, ttl_secs: i64) {
        let cookie = Cookie::build(TOKEN_COOKIE, value.to_string())
            .path("/")
            .max_age(Duration::seconds(ttl_secs))
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .finish();
        self.queue(cookie);
        self.token = Some(value.to_string()).filter(|t| !t.is_empty());
    }

    pub fn get_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Overwrite the slot with an immediately-expiring value.
    pub fn clear_token(&mut self) {
        let cookie = Cookie::build(TOKEN_COOKIE, "")
            .path("/")
            .max_age(Duration::ZERO)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .finish();
        self.queue(cookie);
        self.token = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_token().is_some()
    }

    pub fn pending_cookies(&self) -> &[Cookie<'static>] {
        &self.pending
    }

    /// Copy queued cookie writes onto an outgoing response.
    pub fn apply(&self, res: &mut HttpResponse) {
        for cookie in &self.pending {
            if let Err(e) = res.add_cookie(cookie) {
                log::warn!("Failed to attach {} cookie: {e}", cookie.name());
            }
        }
    }

    // Only the last write to the slot reaches the browser.
    fn queue(&mut self, cookie: Cookie<'static>) {
        self.pending.retain(|c| c.name() != cookie.name());
        self.pending.push(cookie);
    }
}

impl FromRequest for SessionStore {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(SessionStore::from_request(req)))
    }
}

pub fn set_flash(session: &Session, message: &str) {
    if let Err(e) = session.insert("flash", message) {
        log::warn!("Failed to store flash message: {e}");
    }
}

pub fn take_flash(session: &Session) -> Option<String> {
    let flash = session.get::<String>("flash").unwrap_or(None);
    if flash.is_some() {
        session.remove("flash");
    }
    flash
}
