//! Shared setup for HTTP-level tests.

#![allow(dead_code)]

use axum::http::{HeaderValue, StatusCode};
use axum_test::{TestResponse, TestServer};
use serde_json::json;
use std::path::Path;

use birdspot::config::Config;
use birdspot::db::{self, DbPool};
use birdspot::routes;
use birdspot::state::AppState;

pub struct TestApp {
  pub server: TestServer,
  pub db: DbPool,
}

impl TestApp {
  /// Router over a fresh in-memory database
  pub fn new() -> Self {
    let db = db::init_in_memory().unwrap();
    let state = AppState::new(db.clone(), &Config::default());
    let server = TestServer::new(routes::router(state, Path::new("static"))).unwrap();
    Self { server, db }
  }

  /// Same as [`TestApp::new`] with the bundled species catalog loaded
  pub fn with_catalog() -> Self {
    let app = Self::new();
    {
      let conn = app.db.lock().unwrap();
      db::species::seed_catalog(&conn, Path::new("seed/species.json")).unwrap();
    }
    app
  }

  pub async fn register(&self, username: &str, password: &str) -> TestResponse {
    self
      .server
      .post("/api/register")
      .json(&json!({
        "username": username,
        "password": password,
        "email": format!("{}@example.com", username),
      }))
      .await
  }

  pub async fn login(&self, username: &str, password: &str) -> TestResponse {
    self
      .server
      .post("/api/login")
      .json(&json!({ "username": username, "password": password }))
      .await
  }

  /// Register then log in, returning the session token
  pub async fn sign_up(&self, username: &str) -> String {
    self.register(username, "S3cret!").await.assert_status(StatusCode::CREATED);
    let response = self.login(username, "S3cret!").await;
    response.assert_status_ok();
    response.cookie("sid").value().to_string()
  }
}

/// `Cookie` header carrying a session token
pub fn session_header(token: &str) -> HeaderValue {
  HeaderValue::from_str(&format!("sid={}", token)).unwrap()
}
