use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::{Local, Timelike};

use crate::api::ApiClient;
use crate::auth::session::SessionStore;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::user::UserListRegistry;
use crate::templates_structs::{DashboardTemplate, PageContext};

use super::{require_user, respond};

fn time_greeting(hour: u32, name: &str) -> String {
    let period = match hour {
        5..=11 => "Good morning",
        12..=16 => "Good afternoon",
        _ => "Good evening",
    };
    format!("{period}, {name}")
}

pub async fn index(
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

    let ctx = PageContext::build(&session, &config, &user, "/dashboard");
    let greeting = time_greeting(Local::now().hour(), &user.fullname);
    let tmpl = DashboardTemplate { ctx, greeting, user };
    respond(&auth, tmpl)
}
