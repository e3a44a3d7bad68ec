mod common;

use axum::http::StatusCode;
use blogsmith::db::user_repository::UserRepository;

#[tokio::test]
async fn register_then_login_sets_cookie() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let user_id = env.sign_in(&server, "Ada", "ada@example.com").await;
    assert_eq!(user_id.len(), 24);

    // The session cookie is sent automatically from here on.
    let response = server.get("/api/auth/me").await;
    response.assert_status_ok();

    let me: serde_json::Value = response.json();
    assert_eq!(me["user_id"].as_str(), Some(user_id.as_str()));
    assert_eq!(me["email"].as_str(), Some("ada@example.com"));
    assert_eq!(me["name"].as_str(), Some("Ada"));
}

#[tokio::test]
async fn password_is_stored_hashed() {
    let env = common::TestEnv::start().await;
    let server = env.server();
    env.sign_in(&server, "Ada", "ada@example.com").await;

    let user = env
        .user_repo
        .find_by_email("ada@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(user.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn register_duplicate_email() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();
    env.sign_in(&server, "Ada", "ada@example.com").await;

    let response = server
        .post("/api/auth/register")
        .json(&serde_json::json!({
            "name": "Impostor",
            "email": "ADA@example.com",
            "password": "pw"
        }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"].as_str(), Some("User already exists"));
}

#[tokio::test]
async fn register_missing_fields() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();

    let response = server
        .post("/api/auth/register")
        .json(&serde_json::json!({ "email": "a@b.c" }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"].as_str(), Some("Missing required fields"));
}

#[tokio::test]
async fn login_invalid_credentials() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();
    env.sign_in(&server, "Ada", "ada@example.com").await;

    let response = server
        .post("/api/auth/login")
        .json(&serde_json::json!({
            "email": "ada@example.com",
            "password": "wrongpassword"
        }))
        .await;

    response.assert_status_unauthorized();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"].as_str(), Some("Invalid email or password"));
}

#[tokio::test]
async fn me_without_cookie() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();

    let response = server.get("/api/auth/me").await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn me_with_bearer_token() {
    let env = common::TestEnv::start().await;
    let server = env.server();
    let user_id = env.sign_in(&server, "Ada", "ada@example.com").await;

    let cookie = server
        .post("/api/auth/login")
        .json(&serde_json::json!({
            "email": "ada@example.com",
            "password": "correct horse battery staple"
        }))
        .await
        .cookie("blogsmith_session");

    // A fresh client without cookies, authenticating with the header instead.
    let other = env.server();
    let response = other
        .get("/api/auth/me")
        .authorization_bearer(cookie.value())
        .await;
    let me: serde_json::Value = response.json();
    assert_eq!(me["user_id"].as_str(), Some(user_id.as_str()));
}

#[tokio::test]
async fn logout_clears_session() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();
    env.sign_in(&server, "Ada", "ada@example.com").await;

    server.get("/api/auth/me").await.assert_status_ok();

    server.post("/api/auth/logout").await.assert_status_ok();

    let response = server.get("/api/auth/me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_json_uses_error_shape() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();

    let response = server
        .post("/api/auth/login")
        .text("{not json")
        .content_type("application/json")
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}
