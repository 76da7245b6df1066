use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::api::{ApiClient, ApiError};
use crate::auth::middleware::{end_session, redirect};
use crate::auth::session::{SessionStore, set_flash};
use crate::auth::{csrf, validate};
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::handlers::{require_user, respond};
use crate::models::user::{UserForm, UserListRegistry};
use crate::templates_structs::{PageContext, UserFormTemplate};

use super::helpers::{self, CREATE_PATH};

const CREATED: &str = "User created successfully!";

pub async fn new_form(
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

    let ctx = PageContext::build(&session, &config, &user, CREATE_PATH);
    let tmpl = UserFormTemplate::new(ctx, &UserForm::blank(), validate::FieldErrors::new());
    respond(&auth, tmpl)
}

pub async fn create(
    config: web::Data<AppConfig>,
    api: web::Data<ApiClient>,
    lists: web::Data<UserListRegistry>,
    session: Session,
    store: SessionStore,
    form: web::Form<UserForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let (auth, user) = match require_user(store, &api, &session, &lists).await {
        Ok(found) => found,
        Err(res) => return Ok(res),
    };

    let draft = form.into_inner().normalized();
    if draft.is_reset() {
        let mut res = redirect(CREATE_PATH);
        auth.store().apply(&mut res);
        return Ok(res);
    }

    let errors = validate::validate_create(&draft);
    let new_user = match draft.to_new_user() {
        Some(new_user) if errors.is_empty() => new_user,
        _ => {
            let ctx = PageContext::build(&session, &config, &user, CREATE_PATH);
            let tmpl = UserFormTemplate::new(ctx, &draft, errors);
            return respond(&auth, tmpl);
        }
    };

    match auth.api().create_user(auth.store(), &new_user).await {
        Ok(created) => {
            log::info!("User '{}' created user '{}'", user.username, new_user.username);
            if let Some(created) = created {
                helpers::list_for(&auth, &lists).append(created);
            }
            set_flash(&session, CREATED);
            let mut res = redirect(CREATE_PATH);
            auth.store().apply(&mut res);
            Ok(res)
        }
        Err(ApiError::Unauthorized) => Ok(end_session(auth, &session, &lists, None)),
        Err(e) => {
            log::warn!("Creating user '{}' failed: {e}", new_user.username);
            let ctx = PageContext::build(&session, &config, &user, CREATE_PATH);
            let mut tmpl = UserFormTemplate::new(ctx, &draft, validate::FieldErrors::new());
            tmpl.general_error = Some(e.to_string());
            respond(&auth, tmpl)
        }
    }
}
