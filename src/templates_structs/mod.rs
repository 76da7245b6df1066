// Template context structures for Askama templates, organized by page.

use actix_session::Session;

use crate::auth::csrf;
use crate::auth::session::take_flash;
use crate::config::AppConfig;
use crate::models::user::User;

mod common;
mod dashboard;
mod user;

pub use common::*;
pub use dashboard::*;
pub use user::*;

/// One entry of the sidebar.
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
    pub active: bool,
}

const NAV: [(&str, &str); 4] = [
    ("Dashboard", "/dashboard"),
    ("All users", "/dashboard/users"),
    ("Add User", "/dashboard/users/createUsers"),
    ("Change password", "/dashboard/account"),
];

/// Common context shared by all authenticated pages.
/// Templates access these as `ctx.fullname`, `ctx.nav`, etc.
pub struct PageContext {
    pub fullname: String,
    pub username: String,
    pub role_label: String,
    pub avatar_initial: String,
    pub flash: Option<String>,
    pub nav: Vec<NavLink>,
    pub app_name: String,
    pub csrf_token: String,
}

impl PageContext {
    pub fn build(session: &Session, config: &AppConfig, user: &User, current_path: &str) -> Self {
        let nav = NAV
            .iter()
            .map(|&(label, href)| NavLink { label, href, active: href == current_path })
            .collect();
        Self {
            fullname: user.fullname.clone(),
            username: user.username.clone(),
            role_label: user.role.label().to_string(),
            avatar_initial: user.initial(),
            flash: take_flash(session),
            nav,
            app_name: config.app_name.clone(),
            csrf_token: csrf::get_or_create_token(session),
        }
    }
}

/// Option of a role `<select>`.
pub struct RoleOption {
    pub value: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub selected: bool,
}

pub fn role_options(selected: &str) -> Vec<RoleOption> {
    crate::models::user::Role::ALL
        .iter()
        .map(|role| RoleOption {
            value: role.as_str(),
            label: role.label(),
            description: role.description(),
            selected: role.as_str().eq_ignore_ascii_case(selected),
        })
        .collect()
}
