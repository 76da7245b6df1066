//! Shared test infrastructure for the page-level tests.
//!
//! - `FakeApi::start()` - in-process stand-in for the user-management REST API
//! - `init_app()` - the full page app pointed at a `FakeApi`
//! - `Jar` + `get`/`post_form` - a tiny browser that keeps cookies between requests

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::{CONTENT_TYPE, LOCATION};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, middleware, test, web};
use regex::Regex;
use serde_json::{Value, json};

use loan_admin::api::ApiClient;
use loan_admin::auth::middleware::route_guard;
use loan_admin::config::AppConfig;
use loan_admin::handlers;
use loan_admin::models::user::UserListRegistry;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASS: &str = "Admin123!";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const SESSION_COOKIE: &str = "id";

// ============================================================================
// FAKE REST API
// ============================================================================

/// One request received by the fake API.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: String,
    pub path: String,
    pub token: Option<String>,
}

pub struct FakeState {
    pub users: Vec<Value>,
    pub next_id: i64,
    pub calls: Vec<Call>,
    /// Every authenticated endpoint answers 401.
    pub expired: bool,
    /// Only the list endpoint answers 401.
    pub reject_list: bool,
    /// The list endpoint answers 500.
    pub fail_list: bool,
    /// Only PUT and DELETE answer 401.
    pub reject_mutations: bool,
    /// PUT answers 400 with this message.
    pub update_error: Option<String>,
}

impl FakeState {
    fn seeded() -> Self {
        Self {
            users: vec![
                admin_json(),
                user_json(5, "Jane Doe", "jdoe", "USER"),
                user_json(7, "Mark Manager", "mmanager", "MANAGER"),
            ],
            next_id: 8,
            calls: Vec::new(),
            expired: false,
            reject_list: false,
            fail_list: false,
            reject_mutations: false,
            update_error: None,
        }
    }
}

pub fn user_json(id: i64, fullname: &str, username: &str, role: &str) -> Value {
    json!({
        "id": id,
        "fullname": fullname,
        "username": username,
        "role": role,
        "createdAt": "2025-01-01T00:00:00Z",
    })
}

/// The signed-in user, whatever the list currently holds.
pub fn admin_json() -> Value {
    user_json(1, "System Admin", ADMIN_USER, "ADMIN")
}

#[derive(Clone)]
pub struct FakeApi {
    pub base_url: String,
    state: Arc<Mutex<FakeState>>,
}

impl FakeApi {
    /// Serve the fake API on an ephemeral port. Must run inside an actix runtime.
    pub fn start() -> Self {
        let state = Arc::new(Mutex::new(FakeState::seeded()));
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind fake API");
        let port = listener.local_addr().expect("Failed to read fake API address").port();

        let data = web::Data::from(state.clone());
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .route("/api/v1/users/auth/login", web::post().to(fake_login))
                .route("/api/v1/users/auth/me", web::get().to(fake_me))
                .route("/api/v1/users/change-password", web::post().to(fake_change_password))
                .route("/api/v1/users", web::get().to(fake_list))
                .route("/api/v1/users", web::post().to(fake_create))
                .route("/api/v1/users/{id}", web::put().to(fake_update))
                .route("/api/v1/users/{id}", web::delete().to(fake_delete))
        })
        .workers(1)
        .disable_signals()
        .listen(listener)
        .expect("Failed to listen on fake API socket")
        .run();
        actix_rt::spawn(server);

        Self { base_url: format!("http://127.0.0.1:{port}"), state }
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn set_users(&self, users: Vec<Value>) {
        self.state().users = users;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn calls_to(&self, method: &str, path: &str) -> usize {
        self.calls().iter().filter(|c| c.method == method && c.path == path).count()
    }

    pub fn calls_with_token(&self, token: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.token.as_deref() == Some(token))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn user(&self, id: i64) -> Option<Value> {
        self.state().users.iter().find(|u| u["id"] == id).cloned()
    }

    pub fn config(&self) -> AppConfig {
        AppConfig {
            api_base_url: self.base_url.clone(),
            cookie_secure: false,
            api_timeout: Duration::from_secs(5),
            ..AppConfig::default()
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::from_config(&self.config()).expect("Failed to build API client")
    }
}

type Shared = web::Data<Mutex<FakeState>>;

fn record<'a>(state: &'a Shared, req: &HttpRequest) -> MutexGuard<'a, FakeState> {
    let mut s = state.lock().unwrap();
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned);
    s.calls.push(Call {
        method: req.method().to_string(),
        path: req.path().to_string(),
        token,
    });
    s
}

fn authorized(s: &FakeState, req: &HttpRequest) -> bool {
    !s.expired
        && req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {ADMIN_TOKEN}"))
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({ "success": false, "message": "Invalid or expired token" }))
}

async fn fake_login(state: Shared, req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
    let _s = record(&state, &req);
    if body["username"] == ADMIN_USER && body["password"] == ADMIN_PASS {
        let user = admin_json();
        HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Login successful",
            "data": { "token": ADMIN_TOKEN, "user": user },
        }))
    } else {
        HttpResponse::Unauthorized().json(json!({ "success": false, "message": "Invalid username or password" }))
    }
}

async fn fake_me(state: Shared, req: HttpRequest) -> HttpResponse {
    let s = record(&state, &req);
    if !authorized(&s, &req) {
        return unauthorized();
    }
    HttpResponse::Ok().json(json!({ "success": true, "data": admin_json() }))
}

async fn fake_list(state: Shared, req: HttpRequest) -> HttpResponse {
    let s = record(&state, &req);
    if !authorized(&s, &req) || s.reject_list {
        return unauthorized();
    }
    if s.fail_list {
        return HttpResponse::InternalServerError().json(json!({ "success": false, "message": "Database unavailable" }));
    }
    HttpResponse::Ok().json(json!({ "success": true, "data": s.users }))
}

async fn fake_create(state: Shared, req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
    let mut s = record(&state, &req);
    if !authorized(&s, &req) {
        return unauthorized();
    }
    if s.users.iter().any(|u| u["username"] == body["username"]) {
        return HttpResponse::Conflict().json(json!({ "success": false, "message": "Username already exists" }));
    }
    let id = s.next_id;
    s.next_id += 1;
    let user = user_json(
        id,
        body["fullname"].as_str().unwrap_or_default(),
        body["username"].as_str().unwrap_or_default(),
        body["role"].as_str().unwrap_or("USER"),
    );
    s.users.push(user.clone());
    HttpResponse::Created().json(json!({ "success": true, "message": "User created", "data": user }))
}

async fn fake_update(state: Shared, req: HttpRequest, path: web::Path<i64>, body: web::Json<Value>) -> HttpResponse {
    let mut s = record(&state, &req);
    if !authorized(&s, &req) || s.reject_mutations {
        return unauthorized();
    }
    if let Some(message) = &s.update_error {
        return HttpResponse::BadRequest().json(json!({ "success": false, "message": message }));
    }
    let id = path.into_inner();
    let Some(user) = s.users.iter_mut().find(|u| u["id"] == id) else {
        return HttpResponse::NotFound().json(json!({ "success": false }));
    };
    for field in ["fullname", "username", "role"] {
        if let Some(value) = body.get(field) {
            user[field] = value.clone();
        }
    }
    HttpResponse::Ok().json(json!({ "success": true, "message": "User updated" }))
}

async fn fake_delete(state: Shared, req: HttpRequest, path: web::Path<i64>) -> HttpResponse {
    let mut s = record(&state, &req);
    if !authorized(&s, &req) || s.reject_mutations {
        return unauthorized();
    }
    let id = path.into_inner();
    let before = s.users.len();
    s.users.retain(|u| u["id"] != id);
    if s.users.len() == before {
        return HttpResponse::NotFound().json(json!({ "success": false, "message": "User not found" }));
    }
    HttpResponse::NoContent().finish()
}

async fn fake_change_password(state: Shared, req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
    let s = record(&state, &req);
    if !authorized(&s, &req) {
        return unauthorized();
    }
    if body["currentPassword"] != ADMIN_PASS {
        return HttpResponse::BadRequest().json(json!({ "success": false, "message": "Current password is incorrect" }));
    }
    HttpResponse::Ok().json(json!({ "success": true, "message": "Password updated" }))
}

// ============================================================================
// PAGE APP
// ============================================================================

pub async fn init_app(
    api: &FakeApi,
    lists: web::Data<UserListRegistry>,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    let config = api.config();
    let client = api.client();
    test::init_service(
        App::new()
            .wrap(middleware::from_fn(route_guard))
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                    .cookie_secure(false)
                    .build(),
            )
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(client))
            .app_data(lists)
            .configure(handlers::configure)
            .default_service(web::to(handlers::not_found)),
    )
    .await
}

// ============================================================================
// BROWSER
// ============================================================================

/// Cookies the "browser" currently holds.
#[derive(Default)]
pub struct Jar(HashMap<String, Cookie<'static>>);

impl Jar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|c| c.value())
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.0.insert(name.to_string(), Cookie::new(name.to_string(), value.to_string()));
    }

    fn absorb(&mut self, cookies: &[Cookie<'static>]) {
        for cookie in cookies {
            let expired = cookie.value().is_empty()
                || cookie.max_age().is_some_and(|age| age.is_zero() || age.is_negative());
            if expired {
                self.0.remove(cookie.name());
            } else {
                self.0.insert(cookie.name().to_string(), cookie.clone());
            }
        }
    }

    fn attach(&self, mut req: test::TestRequest) -> test::TestRequest {
        for cookie in self.0.values() {
            req = req.cookie(Cookie::new(cookie.name().to_string(), cookie.value().to_string()));
        }
        req
    }
}

/// A response as the browser saw it.
pub struct Page {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
    pub set_cookies: Vec<Cookie<'static>>,
}

impl Page {
    pub fn set_cookie(&self, name: &str) -> Option<&Cookie<'static>> {
        self.set_cookies.iter().rev().find(|c| c.name() == name)
    }

    pub fn csrf_token(&self) -> String {
        let re = Regex::new(r#"name="csrf_token" value="([0-9a-f]{64})""#).unwrap();
        re.captures(&self.body)
            .map(|c| c[1].to_string())
            .expect("page carries no CSRF token")
    }

    pub fn count(&self, needle: &str) -> usize {
        self.body.matches(needle).count()
    }
}

async fn send<S, B>(app: &S, jar: &mut Jar, req: test::TestRequest) -> Page
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, jar.attach(req).to_request()).await;
    let status = resp.status();
    let location = resp
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let set_cookies: Vec<Cookie<'static>> = resp.response().cookies().map(|c| c.into_owned()).collect();
    jar.absorb(&set_cookies);
    let body = String::from_utf8_lossy(&test::read_body(resp).await).into_owned();
    Page { status, location, body, set_cookies }
}

pub async fn get<S, B>(app: &S, jar: &mut Jar, uri: &str) -> Page
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(app, jar, test::TestRequest::get().uri(uri)).await
}

pub async fn post_form<S, B>(app: &S, jar: &mut Jar, uri: &str, fields: &[(&str, &str)]) -> Page
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let body = serde_urlencoded::to_string(fields).expect("Failed to encode form");
    let req = test::TestRequest::post()
        .uri(uri)
        .insert_header((CONTENT_TYPE, "application/x-www-form-urlencoded"))
        .set_payload(body);
    send(app, jar, req).await
}

/// Sign in as the admin through the login form.
pub async fn sign_in<S, B>(app: &S, jar: &mut Jar)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let csrf = get(app, jar, "/login").await.csrf_token();
    let page = post_form(
        app,
        jar,
        "/login",
        &[("username", ADMIN_USER), ("password", ADMIN_PASS), ("csrf_token", &csrf)],
    )
    .await;
    assert_eq!(page.status, StatusCode::SEE_OTHER, "sign-in failed: {}", page.body);
    assert_eq!(jar.get("token"), Some(ADMIN_TOKEN));
}
