use askama::Template;

use crate::auth::validate::FieldErrors;
use crate::models::user::{User, UserForm};

use super::{PageContext, RoleOption, role_options};

/// Open edit modal: the user being edited and the draft in the form.
pub struct EditModal {
    pub user: User,
    pub fullname: String,
    pub username: String,
    pub roles: Vec<RoleOption>,
    pub errors: FieldErrors,
}

impl EditModal {
    pub fn for_user(user: &User) -> Self {
        Self::with_draft(user, &UserForm::from_user(user), FieldErrors::new())
    }

    pub fn with_draft(user: &User, draft: &UserForm, errors: FieldErrors) -> Self {
        Self {
            user: user.clone(),
            fullname: draft.fullname.clone(),
            username: draft.username.clone(),
            roles: role_options(&draft.role),
            errors,
        }
    }
}

#[derive(Template)]
#[template(path = "users/list.html")]
pub struct UserListTemplate {
    pub ctx: PageContext,
    pub users: Vec<User>,
    pub loaded: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub edit: Option<EditModal>,
    pub delete: Option<User>,
    pub is_updating: bool,
    pub is_deleting: bool,
}

impl UserListTemplate {
    /// Row actions are disabled while either modal action is in flight.
    pub fn actions_disabled(&self) -> bool {
        self.is_updating || self.is_deleting
    }
}

#[derive(Template)]
#[template(path = "users/form.html")]
pub struct UserFormTemplate {
    pub ctx: PageContext,
    pub fullname: String,
    pub username: String,
    pub roles: Vec<RoleOption>,
    pub selected_description: &'static str,
    pub errors: FieldErrors,
    pub general_error: Option<String>,
}

impl UserFormTemplate {
    /// The password is never echoed back into the page.
    pub fn new(ctx: PageContext, draft: &UserForm, errors: FieldErrors) -> Self {
        let roles = role_options(&draft.role);
        let selected_description = roles
            .iter()
            .find(|r| r.selected)
            .map(|r| r.description)
            .unwrap_or("");
        Self {
            ctx,
            fullname: draft.fullname.clone(),
            username: draft.username.clone(),
            roles,
            selected_description,
            errors,
            general_error: None,
        }
    }
}
