mod common;

use axum::http::{header, HeaderValue, StatusCode};
use serde_json::{json, Value};

use common::{session_header, TestApp};

#[tokio::test]
async fn test_register_then_login_sets_session_cookie() {
  let app = TestApp::new();

  let response = app.register("alice", "S3cret!").await;
  response.assert_status(StatusCode::CREATED);
  // Registration never signs the user in
  assert!(response.maybe_cookie("sid").is_none());

  let response = app.login("alice", "S3cret!").await;
  response.assert_status_ok();
  response.assert_json(&json!({ "success": true }));

  let set_cookie = response.header("set-cookie");
  let set_cookie = set_cookie.to_str().unwrap();
  assert!(set_cookie.starts_with("sid="));
  assert!(set_cookie.contains("HttpOnly"));
  assert!(set_cookie.contains("SameSite=Strict"));
  assert!(set_cookie.contains("Path=/"));
  assert!(set_cookie.contains("Max-Age=2700"));
}

#[tokio::test]
async fn test_login_is_case_insensitive() {
  let app = TestApp::new();
  app.register("Alice", "S3cret!").await.assert_status(StatusCode::CREATED);

  let upper = app.login("Alice", "S3cret!").await;
  let lower = app.login("alice", "S3cret!").await;
  upper.assert_status_ok();
  lower.assert_status_ok();
  assert_ne!(upper.cookie("sid").value(), lower.cookie("sid").value());
}

#[tokio::test]
async fn test_bad_credentials_look_the_same() {
  let app = TestApp::new();
  app.register("alice", "S3cret!").await.assert_status(StatusCode::CREATED);

  let wrong_password = app.login("alice", "wrong").await;
  let unknown_user = app.login("mallory", "S3cret!").await;

  wrong_password.assert_status(StatusCode::UNAUTHORIZED);
  unknown_user.assert_status(StatusCode::UNAUTHORIZED);
  assert_eq!(wrong_password.json::<Value>(), unknown_user.json::<Value>());
  assert!(wrong_password.maybe_cookie("sid").is_none());
}

#[tokio::test]
async fn test_corrupt_stored_hash_is_internal_error() {
  let app = TestApp::new();
  {
    let conn = app.db.lock().unwrap();
    birdspot::auth::db::create_user(&conn, "legacy", "legacy@example.com", "no-separator").unwrap();
  }

  let response = app.login("legacy", "anything").await;
  response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
  let body: Value = response.json();
  assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
  assert!(response.maybe_cookie("sid").is_none());
}

#[tokio::test]
async fn test_duplicate_registration_is_generic() {
  let app = TestApp::new();
  app.register("alice", "S3cret!").await.assert_status(StatusCode::CREATED);

  let response = app.register("ALICE", "other").await;
  response.assert_status(StatusCode::BAD_REQUEST);
  let body: Value = response.json();
  assert_eq!(body["error"]["code"], "REGISTRATION_FAILED");
  assert_eq!(body["error"]["message"], "Registration failed");
}

#[tokio::test]
async fn test_register_validates_input() {
  let app = TestApp::new();

  let response = app
    .server
    .post("/api/register")
    .json(&json!({ "username": "al", "password": "pw", "email": "a@x.com" }))
    .await;
  response.assert_status(StatusCode::BAD_REQUEST);

  let response = app
    .server
    .post("/api/register")
    .json(&json!({ "username": "alice", "password": "pw", "email": "nope" }))
    .await;
  response.assert_status(StatusCode::BAD_REQUEST);

  let response = app
    .server
    .post("/api/register")
    .json(&json!({ "username": "alice" }))
    .await;
  response.assert_status(StatusCode::BAD_REQUEST);
  let body: Value = response.json();
  assert_eq!(body["error"]["code"], "MALFORMED_INPUT");
}

#[tokio::test]
async fn test_protected_route_redirects_without_session() {
  let app = TestApp::new();

  let response = app.server.post("/api/user").await;
  response.assert_status(StatusCode::SEE_OTHER);
  assert_eq!(response.header("location"), "/login");

  let response = app.server.get("/profile").await;
  response.assert_status(StatusCode::SEE_OTHER);
  assert_eq!(response.header("location"), "/login");
}

#[tokio::test]
async fn test_protected_route_rejects_garbage_cookie() {
  let app = TestApp::new();

  let response = app
    .server
    .post("/api/user")
    .add_header(header::COOKIE, session_header("garbage"))
    .await;
  response.assert_status(StatusCode::SEE_OTHER);
  assert_eq!(response.header("location"), "/login");
}

#[tokio::test]
async fn test_protected_route_with_session() {
  let app = TestApp::new();
  let token = app.sign_up("alice").await;

  let response = app
    .server
    .post("/api/user")
    .add_header(header::COOKIE, session_header(&token))
    .await;
  response.assert_status_ok();
  response.assert_json(&json!({ "username": "alice", "email": "alice@example.com" }));

  let response = app
    .server
    .get("/profile")
    .add_header(header::COOKIE, session_header(&token))
    .await;
  response.assert_status_ok();
  assert!(response.text().contains("alice"));
}

#[tokio::test]
async fn test_session_cookie_among_others() {
  let app = TestApp::new();
  let token = app.sign_up("alice").await;

  let cookie = HeaderValue::from_str(&format!("theme=dark; sid={}; lang=en", token)).unwrap();
  let response = app.server.post("/api/user").add_header(header::COOKIE, cookie).await;
  response.assert_status_ok();
}

#[tokio::test]
async fn test_logout_ends_session() {
  let app = TestApp::new();
  let token = app.sign_up("alice").await;

  let response = app
    .server
    .post("/api/logout")
    .add_header(header::COOKIE, session_header(&token))
    .await;
  response.assert_status(StatusCode::SEE_OTHER);
  assert_eq!(response.header("location"), "/login");
  let cleared = response.header("set-cookie");
  assert!(cleared.to_str().unwrap().contains("Max-Age=0"));

  let response = app
    .server
    .post("/api/user")
    .add_header(header::COOKIE, session_header(&token))
    .await;
  response.assert_status(StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_logout_without_session_still_redirects() {
  let app = TestApp::new();
  let response = app.server.post("/api/logout").await;
  response.assert_status(StatusCode::SEE_OTHER);
  assert_eq!(response.header("location"), "/login");
}

#[tokio::test]
async fn test_pages_render() {
  let app = TestApp::new();

  for path in ["/", "/login", "/register"] {
    let response = app.server.get(path).await;
    response.assert_status_ok();
    assert!(response.text().contains("<html"), "{path} should render a page");
  }
}

#[tokio::test]
async fn test_unknown_path_is_json_404() {
  let app = TestApp::new();

  let response = app.server.get("/no/such/page").await;
  response.assert_status_not_found();
  let body: Value = response.json();
  assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_static_files_are_served_inside_root_only() {
  let app = TestApp::new();

  let response = app.server.get("/static/css/style.css").await;
  response.assert_status_ok();

  let response = app.server.get("/static/..%2FCargo.toml").await;
  response.assert_status_not_found();
}
