use askama::Template;

use crate::auth::validate::FieldErrors;

use super::PageContext;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub notice: Option<String>,
    pub username: String,
    pub app_name: String,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    pub ctx: PageContext,
    pub errors: FieldErrors,
    pub general_error: Option<String>,
}
