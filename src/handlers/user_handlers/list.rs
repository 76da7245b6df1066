use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::api::ApiClient;
use crate::auth::middleware::end_session;
use crate::auth::session::SessionStore;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::handlers::{require_user, respond};
use crate::models::user::UserListRegistry;
use crate::templates_structs::{EditModal, PageContext};

use super::crud::helpers::{self, USERS_PATH};

/// `?edit={id}` or `?delete={id}` opens the matching modal over the list.
/// `?cancel` closes it again.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub edit: Option<i64>,
    pub delete: Option<i64>,
    pub cancel: Option<String>,
}

pub async fn list(
    config: web::Data<AppConfig>,
    api: web::Data<ApiClient>,
    lists: web::Data<UserListRegistry>,
    session: Session,
    store: SessionStore,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let (auth, user) = match require_user(store, &api, &session, &lists).await {
        Ok(found) => found,
        Err(res) => return Ok(res),
    };
    let controller = helpers::list_for(&auth, &lists);

    // Opening or closing a modal reuses the list already on screen; a plain visit reloads it.
    let modal_requested = query.edit.is_some() || query.delete.is_some();
    let fetched = if modal_requested || query.cancel.is_some() {
        helpers::ensure_loaded(&controller, &auth).await
    } else {
        controller.fetch_all(auth.api(), auth.store()).await
    };

    let mut error = None;
    if let Err(e) = fetched {
        if e.is_unauthorized() {
            return Ok(end_session(auth, &session, &lists, None));
        }
        log::warn!("Loading the user list failed: {e}");
        error = Some(e.to_string());
    }

    let snapshot = controller.snapshot();
    let edit = query.edit.and_then(|id| snapshot.find(id)).map(EditModal::for_user);
    let delete = query.delete.and_then(|id| snapshot.find(id)).cloned();
    if modal_requested && edit.is_none() && delete.is_none() && error.is_none() {
        error = Some("User not found".to_string());
    }

    let ctx = PageContext::build(&session, &config, &user, USERS_PATH);
    let mut tmpl = helpers::list_page(ctx, snapshot);
    tmpl.error = error;
    tmpl.edit = edit;
    tmpl.delete = delete;
    respond(&auth, tmpl)
}
