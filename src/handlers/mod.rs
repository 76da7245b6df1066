use actix_session::Session;
use actix_web::{HttpResponse, web};
use askama::Template;

use crate::api::ApiClient;
use crate::auth::controller::{AuthController, AuthStatus};
use crate::auth::middleware::{HOME_PATH, end_session, redirect};
use crate::auth::session::SessionStore;
use crate::errors::{AppError, render};
use crate::models::user::{User, UserListRegistry};

pub mod account_handlers;
pub mod auth_handlers;
pub mod dashboard;
pub mod user_handlers;

/// Page routes. The route guard and the session middleware are wrapped
/// around these by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(|| async { redirect(HOME_PATH) }))
        .route("/login", web::get().to(auth_handlers::login_page))
        .route("/login", web::post().to(auth_handlers::login_submit))
        .route("/logout", web::post().to(auth_handlers::logout))
        .route("/dashboard", web::get().to(dashboard::index))
        .route("/dashboard/account", web::get().to(account_handlers::form))
        .route("/dashboard/account", web::post().to(account_handlers::submit))
        // createUsers BEFORE {id}
        .route("/dashboard/users", web::get().to(user_handlers::list))
        .route("/dashboard/users/createUsers", web::get().to(user_handlers::new_form))
        .route("/dashboard/users/createUsers", web::post().to(user_handlers::create))
        .route("/dashboard/users/{id}", web::post().to(user_handlers::update))
        .route("/dashboard/users/{id}/delete", web::post().to(user_handlers::delete));
}

/// Look up the signed-in user behind the request's token.
///
/// `Err` is the sign-out redirect, ready to be returned: the token was
/// missing or could not be verified and has already been cleared.
pub async fn require_user(
    store: SessionStore,
    api: &ApiClient,
    session: &Session,
    lists: &UserListRegistry,
) -> Result<(AuthController, User), HttpResponse> {
    let stale_token = store.get_token().map(str::to_owned);
    let mut auth = AuthController::new(store, api.clone());
    match auth.resolve().await {
        AuthStatus::Authenticated(user) => Ok((auth, user)),
        _ => Err(end_session(auth, session, lists, stale_token.as_deref())),
    }
}

/// Render `tmpl` and carry over any cookie writes made while handling the request.
pub fn respond(auth: &AuthController, tmpl: impl Template) -> Result<HttpResponse, AppError> {
    let mut res = render(tmpl)?;
    auth.store().apply(&mut res);
    Ok(res)
}

pub async fn not_found() -> HttpResponse {
    let html = include_str!("../../templates/errors/404.html");
    HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(html)
}
