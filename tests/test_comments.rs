mod common;

use axum::http::StatusCode;
use mongodb::bson::oid::ObjectId;

#[tokio::test]
async fn create_and_list_comments() {
    let env = common::TestEnv::start().await;
    let server = env.server();
    let user_id = env.sign_in(&server, "Grace", "grace@example.com").await;
    let blog = env.create_blog(&server, "Discuss Me").await;
    let id = blog["id"].as_str().unwrap();

    let response = server
        .post(&format!("/api/blogs/{id}/comments"))
        .json(&serde_json::json!({ "content": "  First!  " }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: serde_json::Value = response.json();
    assert_eq!(created["content"].as_str(), Some("First!"));
    assert_eq!(created["blogId"].as_str(), Some(id));
    assert_eq!(created["user"]["id"].as_str(), Some(user_id.as_str()));
    assert_eq!(created["user"]["name"].as_str(), Some("Grace"));

    server
        .post(&format!("/api/blogs/{id}/comments"))
        .json(&serde_json::json!({ "content": "Second" }))
        .await;

    // Listing is public and newest first.
    let anonymous = env.server();
    let comments: Vec<serde_json::Value> = anonymous
        .get(&format!("/api/blogs/{id}/comments"))
        .await
        .json();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["content"].as_str(), Some("Second"));
    assert_eq!(comments[1]["content"].as_str(), Some("First!"));
    assert!(comments[0]["user"].get("email").is_none());
}

#[tokio::test]
async fn blank_comment_rejected() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();
    env.sign_in(&server, "Grace", "grace@example.com").await;
    let blog = env.create_blog(&server, "Quiet").await;
    let id = blog["id"].as_str().unwrap();

    let response = server
        .post(&format!("/api/blogs/{id}/comments"))
        .json(&serde_json::json!({ "content": "   " }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"].as_str(), Some("Comment cannot be empty"));
}

#[tokio::test]
async fn comment_requires_session() {
    let env = common::TestEnv::start().await;
    let author = env.server();
    env.sign_in(&author, "Grace", "grace@example.com").await;
    let blog = env.create_blog(&author, "Members Only").await;
    let id = blog["id"].as_str().unwrap();

    let anonymous = env.server_permissive();
    anonymous
        .post(&format!("/api/blogs/{id}/comments"))
        .json(&serde_json::json!({ "content": "drive-by" }))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn comment_on_missing_blog() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();
    env.sign_in(&server, "Grace", "grace@example.com").await;

    let missing = ObjectId::new().to_hex();
    let response = server
        .post(&format!("/api/blogs/{missing}/comments"))
        .json(&serde_json::json!({ "content": "Hello?" }))
        .await;
    response.assert_status_not_found();

    server
        .get(&format!("/api/blogs/{missing}/comments"))
        .await
        .assert_status_not_found();
}
