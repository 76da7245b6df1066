use actix_session::Session;
use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};

use crate::auth::controller::AuthController;
use crate::auth::session::{SessionStore, set_flash};
use crate::models::user::UserListRegistry;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/dashboard";

/// Notice shown on the login page after the API rejected the session token.
pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

/// Outcome of the navigation rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(&'static str),
}

/// Navigation rules, first match wins:
/// no token and not the login page → login; token on the login page → dashboard.
pub fn evaluate(path: &str, has_token: bool) -> GuardDecision {
    let is_login_page = path == LOGIN_PATH;
    if !has_token && !is_login_page {
        return GuardDecision::Redirect(LOGIN_PATH);
    }
    if has_token && is_login_page {
        return GuardDecision::Redirect(HOME_PATH);
    }
    GuardDecision::Allow
}

/// Middleware applying [`evaluate`] to every navigable request.
/// Static assets are outside its reach.
pub async fn route_guard(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let decision = if req.path().starts_with("/static/") {
        GuardDecision::Allow
    } else {
        let has_token = SessionStore::from_request(req.request()).is_authenticated();
        evaluate(req.path(), has_token)
    };

    match decision {
        GuardDecision::Redirect(location) => {
            log::debug!("Guard redirect {} -> {location}", req.path());
            Ok(req.into_response(redirect(location)).map_into_right_body())
        }
        GuardDecision::Allow => next.call(req).await.map(|res| res.map_into_left_body()),
    }
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", location.to_string()))
        .finish()
}

/// Data-driven guard: the API answered 401 during a page's data fetch.
/// Clears the token, drops cached view state and sends the browser to the
/// login page with a one-shot notice.
pub fn end_session(
    mut auth: AuthController,
    session: &Session,
    lists: &UserListRegistry,
    stale_token: Option<&str>,
) -> HttpResponse {
    if let Some(token) = stale_token.or(auth.store().get_token()) {
        lists.discard(token);
    }
    auth.expire_session();
    set_flash(session, SESSION_EXPIRED);

    let mut res = redirect(LOGIN_PATH);
    auth.store().apply(&mut res);
    res
}
