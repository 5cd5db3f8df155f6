//! Authentication handlers for login, register, and logout.

use askama::Template;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};

use super::db as auth_db;
use super::middleware::{OptionalAuth, LOGIN_PATH};
use super::session::{expired_session_cookie, session_cookie, SESSION_COOKIE_NAME};
use crate::db::{try_lock, LogOnError};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub version: &'static str,
}

#[derive(Template)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// GET /login - Show login page (already signed in goes to the profile)
pub async fn login_page(OptionalAuth(auth): OptionalAuth) -> Response {
    if auth.is_some() {
        return Redirect::to("/profile").into_response();
    }
    let template = LoginTemplate {
        version: env!("CARGO_PKG_VERSION"),
    };
    Html(template.render().unwrap_or_default()).into_response()
}

/// GET /register - Show registration page
pub async fn register_page() -> Html<String> {
    Html(RegisterTemplate.render().unwrap_or_default())
}

/// POST /api/login - Check credentials and set the session cookie
pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let Json(req) = body?;

    // Password derivation is CPU-bound, keep it off the async workers
    let pool = state.db.clone();
    let ttl = state.session_ttl;
    let session_id = tokio::task::spawn_blocking(move || {
        super::authenticate(&pool, &req.username, &req.password, ttl)
    })
    .await
    .map_err(|e| AppError::Hashing(e.to_string()))??
    .ok_or(AppError::InvalidCredentials)?;

    let cookie = session_cookie(session_id, state.session_ttl, state.secure_cookies);
    Ok((jar.add(cookie), Json(json!({ "success": true }))))
}

/// POST /api/register - Create an account (does not sign in)
pub async fn register_submit(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(req) = body?;

    if !is_valid_username(&req.username) {
        return Err(AppError::MalformedInput(
            "Username must be 3-32 alphanumeric characters or underscores".to_string(),
        ));
    }
    if !is_valid_email(&req.email) {
        return Err(AppError::MalformedInput("Invalid email address".to_string()));
    }
    if req.password.is_empty() {
        return Err(AppError::MalformedInput("Password is required".to_string()));
    }

    let pool = state.db.clone();
    tokio::task::spawn_blocking(move || {
        super::register(&pool, &req.username, &req.password, req.email.trim())
    })
    .await
    .map_err(|e| AppError::Hashing(e.to_string()))??;

    Ok((StatusCode::CREATED, Json(json!({ "success": true }))))
}

/// POST /api/logout - Log out and clear session
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(session_cookie) = jar.get(SESSION_COOKIE_NAME) {
        if let Some(conn) = try_lock(&state.db).log_warn("Logout without database") {
            auth_db::delete_session(&conn, session_cookie.value())
                .log_warn("Failed to delete session during logout");
        }
    }

    (jar.add(expired_session_cookie()), Redirect::to(LOGIN_PATH))
}

/// Validate username format (3-32 chars, alphanumeric + underscore)
fn is_valid_username(username: &str) -> bool {
    username.len() >= 3
        && username.len() <= 32
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Exactly one `@` with something on both sides, no whitespace
fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
