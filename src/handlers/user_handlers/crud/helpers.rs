use crate::auth::controller::AuthController;
use crate::models::user::{ListError, ListSnapshot, UserListController, UserListRegistry};
use crate::templates_structs::{PageContext, UserListTemplate};

pub const USERS_PATH: &str = "/dashboard/users";
pub const CREATE_PATH: &str = "/dashboard/users/createUsers";

/// The signed-in session's list. Only anonymous stores come back unshared.
pub fn list_for(auth: &AuthController, lists: &UserListRegistry) -> UserListController {
    lists.for_store(auth.store()).unwrap_or_default()
}

/// Fetch the list unless an earlier page load already did.
pub async fn ensure_loaded(controller: &UserListController, auth: &AuthController) -> Result<(), ListError> {
    if controller.snapshot().loaded {
        return Ok(());
    }
    controller.fetch_all(auth.api(), auth.store()).await
}

/// List page with no banner and no modal open.
pub fn list_page(ctx: PageContext, snapshot: ListSnapshot) -> UserListTemplate {
    UserListTemplate {
        ctx,
        users: snapshot.users,
        loaded: snapshot.loaded,
        error: None,
        notice: None,
        edit: None,
        delete: None,
        is_updating: snapshot.is_updating,
        is_deleting: snapshot.is_deleting,
    }
}
