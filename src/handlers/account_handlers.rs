use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::api::ApiClient;
use crate::auth::controller::AuthError;
use crate::auth::middleware::{end_session, redirect};
use crate::auth::session::{SessionStore, set_flash};
use crate::auth::{csrf, validate};
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::user::UserListRegistry;
use crate::templates_structs::{AccountTemplate, PageContext};

use super::{require_user, respond};

const ACCOUNT_PATH: &str = "/dashboard/account";

#[derive(Deserialize)]
pub struct ChangePasswordForm {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
    pub csrf_token: String,
}

pub async fn form(
    config: web::Data<AppConfig>,
    api: web::Data<ApiClient>,
    lists: web::Data<UserListRegistry>,
    session: Session,
    store: SessionStore,
) -> Result<HttpResponse, AppError> {
    let (auth, user) = match require_user(store, &api, &session, &lists).await {
        Ok(found) => found,
        Err(res) => return Ok(res),
    };

    let ctx = PageContext::build(&session, &config, &user, ACCOUNT_PATH);
    let tmpl = AccountTemplate { ctx, errors: validate::FieldErrors::new(), general_error: None };
    respond(&auth, tmpl)
}

pub async fn submit(
    config: web::Data<AppConfig>,
    api: web::Data<ApiClient>,
    lists: web::Data<UserListRegistry>,
    session: Session,
    store: SessionStore,
    form: web::Form<ChangePasswordForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let (mut auth, user) = match require_user(store, &api, &session, &lists).await {
        Ok(found) => found,
        Err(res) => return Ok(res),
    };

    let errors = validate::validate_password_change(
        &form.current_password,
        &form.new_password,
        &form.confirm_password,
    );
    if !errors.is_empty() {
        let ctx = PageContext::build(&session, &config, &user, ACCOUNT_PATH);
        let tmpl = AccountTemplate { ctx, errors, general_error: None };
        return respond(&auth, tmpl);
    }

    let stale_token = auth.store().get_token().map(str::to_owned);
    match auth.change_password(&form.current_password, &form.new_password).await {
        Ok(message) => {
            log::info!("User '{}' changed their password", user.username);
            set_flash(&session, message.as_deref().unwrap_or("Password changed successfully"));
            let mut res = redirect(ACCOUNT_PATH);
            auth.store().apply(&mut res);
            Ok(res)
        }
        Err(AuthError::Unauthorized) => Ok(end_session(auth, &session, &lists, stale_token.as_deref())),
        Err(e) => {
            log::warn!("Password change for '{}' failed: {e}", user.username);
            let ctx = PageContext::build(&session, &config, &user, ACCOUNT_PATH);
            let tmpl = AccountTemplate {
                ctx,
                errors: validate::FieldErrors::new(),
                general_error: Some(e.to_string()),
            };
            respond(&auth, tmpl)
        }
    }
}
