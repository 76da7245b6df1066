use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::api::ApiClient;
use crate::auth::controller::AuthController;
use crate::auth::csrf;
use crate::auth::middleware::{HOME_PATH, LOGIN_PATH, redirect};
use crate::auth::session::{SessionStore, take_flash};
use crate::config::AppConfig;
use crate::errors::{AppError, render};
use crate::models::user::UserListRegistry;
use crate::templates_structs::LoginTemplate;

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct CsrfOnly {
    pub csrf_token: String,
}

fn login_template(session: &Session, config: &AppConfig, username: &str, error: Option<String>) -> LoginTemplate {
    LoginTemplate {
        error,
        notice: take_flash(session),
        username: username.to_string(),
        app_name: config.app_name.clone(),
        csrf_token: csrf::get_or_create_token(session),
    }
}

pub async fn login_page(
    config: web::Data<AppConfig>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    render(login_template(&session, &config, "", None))
}

pub async fn login_submit(
    config: web::Data<AppConfig>,
    api: web::Data<ApiClient>,
    session: Session,
    store: SessionStore,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        let error = Some("Please enter username and password".to_string());
        return render(login_template(&session, &config, username, error));
    }

    let mut auth = AuthController::new(store, api.get_ref().clone());
    match auth.login(username, &form.password).await {
        Ok(user) => {
            log::info!("User '{}' signed in", user.username);
            let mut res = redirect(HOME_PATH);
            auth.store().apply(&mut res);
            Ok(res)
        }
        Err(e) => {
            log::info!("Sign-in refused for '{username}': {e}");
            render(login_template(&session, &config, username, Some(e.to_string())))
        }
    }
}

pub async fn logout(
    session: Session,
    store: SessionStore,
    api: web::Data<ApiClient>,
    lists: web::Data<UserListRegistry>,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    if let Some(token) = store.get_token() {
        lists.discard(token);
    }
    let mut auth = AuthController::new(store, api.get_ref().clone());
    auth.logout();
    session.purge();

    let mut res = redirect(LOGIN_PATH);
    auth.store().apply(&mut res);
    Ok(res)
}
