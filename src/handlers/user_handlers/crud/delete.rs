use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::api::ApiClient;
use crate::auth::csrf;
use crate::auth::middleware::end_session;
use crate::auth::session::SessionStore;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::handlers::auth_handlers::CsrfOnly;
use crate::handlers::{require_user, respond};
use crate::models::user::UserListRegistry;
use crate::templates_structs::PageContext;

use super::helpers::{self, USERS_PATH};

/// Confirm the delete modal. The entry is excised from the list on success.
pub async fn delete(
    config: web::Data<AppConfig>,
    api: web::Data<ApiClient>,
    lists: web::Data<UserListRegistry>,
    session: Session,
    store: SessionStore,
    path: web::Path<i64>,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let (auth, user) = match require_user(store, &api, &session, &lists).await {
        Ok(found) => found,
        Err(res) => return Ok(res),
    };
    let controller = helpers::list_for(&auth, &lists);
    let id = path.into_inner();

    let mut error = None;
    let mut notice = None;
    if let Err(e) = helpers::ensure_loaded(&controller, &auth).await {
        if e.is_unauthorized() {
            return Ok(end_session(auth, &session, &lists, None));
        }
        error = Some(e.to_string());
    }

    let label = controller
        .snapshot()
        .find(id)
        .map(|u| u.fullname.clone())
        .unwrap_or_else(|| format!("#{id}"));

    match controller.remove(auth.api(), auth.store(), id).await {
        Ok(()) => {
            log::info!("User '{}' deleted user {id}", user.username);
            notice = Some(format!("User {label} deleted"));
        }
        Err(e) if e.is_unauthorized() => {
            return Ok(end_session(auth, &session, &lists, None));
        }
        Err(e) => {
            log::warn!("Deleting user {id} failed: {e}");
            error = Some(e.to_string());
        }
    }

    let ctx = PageContext::build(&session, &config, &user, USERS_PATH);
    let mut tmpl = helpers::list_page(ctx, controller.snapshot());
    tmpl.error = error;
    tmpl.notice = notice;
    respond(&auth, tmpl)
}
