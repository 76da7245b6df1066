use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::api::ApiClient;
use crate::auth::middleware::end_session;
use crate::auth::session::SessionStore;
use crate::auth::{csrf, validate};
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::handlers::{require_user, respond};
use crate::models::user::{UserForm, UserListRegistry};
use crate::templates_structs::{EditModal, PageContext};

use super::helpers::{self, USERS_PATH};

/// Submit the edit modal. The list is patched in place on success; it is
/// not fetched again.
pub async fn update(
    config: web::Data<AppConfig>,
    api: web::Data<ApiClient>,
    lists: web::Data<UserListRegistry>,
    session: Session,
    store: SessionStore,
    path: web::Path<i64>,
    form: web::Form<UserForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let (auth, user) = match require_user(store, &api, &session, &lists).await {
        Ok(found) => found,
        Err(res) => return Ok(res),
    };
    let controller = helpers::list_for(&auth, &lists);
    let id = path.into_inner();
    let draft = form.into_inner().normalized();

    let mut error = None;
    let mut notice = None;
    let mut edit = None;

    if let Err(e) = helpers::ensure_loaded(&controller, &auth).await {
        if e.is_unauthorized() {
            return Ok(end_session(auth, &session, &lists, None));
        }
        error = Some(e.to_string());
    }

    let target = controller.snapshot().find(id).cloned();
    match target {
        None if error.is_none() => error = Some("User not found".to_string()),
        None => {}
        Some(target) => {
            let errors = validate::validate_edit(&draft);
            if !errors.is_empty() {
                edit = Some(EditModal::with_draft(&target, &draft, errors));
            } else {
                match controller.update(auth.api(), auth.store(), id, draft.to_patch()).await {
                    Ok(()) => {
                        log::info!("User '{}' updated user {id}", user.username);
                        notice = Some(format!("User {} updated", draft.username.trim()));
                    }
                    Err(e) if e.is_unauthorized() => {
                        return Ok(end_session(auth, &session, &lists, None));
                    }
                    Err(e) => {
                        log::warn!("Updating user {id} failed: {e}");
                        error = Some(e.to_string());
                    }
                }
            }
        }
    }

    let ctx = PageContext::build(&session, &config, &user, USERS_PATH);
    let mut tmpl = helpers::list_page(ctx, controller.snapshot());
    tmpl.error = error;
    tmpl.notice = notice;
    tmpl.edit = edit;
    respond(&auth, tmpl)
}
