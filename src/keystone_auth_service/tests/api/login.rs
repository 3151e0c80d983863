use keystone_core::Topic;
use serde_json::json;

use crate::helpers::{TestApp, get_random_email};

#[tokio::test]
async fn should_return_200_with_a_token_pair() {
    let app = TestApp::new().await;
    let email = get_random_email();

    let tokens = app.register_and_login(&email, "password123").await;

    assert!(tokens["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(tokens["refresh_token"].as_str().is_some_and(|t| !t.is_empty()));

    let user = app.db.users().await.pop().unwrap();
    assert_eq!(
        user.refresh_token().unwrap().as_str(),
        tokens["refresh_token"].as_str().unwrap()
    );
    assert_eq!(app.outbox(&Topic::LOGINS).await.len(), 1);
    assert_eq!(app.metric("auth_login_success").await, 1);
}

#[tokio::test]
async fn should_return_401_if_incorrect_password() {
    let app = TestApp::new().await;
    let email = get_random_email();

    let response = app
        .post_register(&json!({ "email": email, "password": "password123" }))
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let response = app
        .post_login(&json!({ "email": email, "password": "wrong-password" }))
        .await;

    assert_eq!(response.status().as_u16(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid email or password");
    assert!(app.outbox(&Topic::LOGINS).await.is_empty());
    assert_eq!(app.metric("auth_login_failure").await, 1);
}

#[tokio::test]
async fn should_return_404_if_user_does_not_exist() {
    let app = TestApp::new().await;

    let response = app
        .post_login(&json!({ "email": get_random_email(), "password": "password123" }))
        .await;

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn should_return_400_if_invalid_input() {
    let app = TestApp::new().await;

    let response = app
        .post_login(&json!({ "email": "not-an-email", "password": "password123" }))
        .await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn second_login_replaces_the_refresh_token() {
    let app = TestApp::new().await;
    let email = get_random_email();

    let first = app.register_and_login(&email, "password123").await;
    let response = app
        .post_login(&json!({ "email": email, "password": "password123" }))
        .await;
    let second: serde_json::Value = response.json().await.unwrap();

    assert_ne!(first["refresh_token"], second["refresh_token"]);

    let stale = app
        .post_refresh(&json!({ "refresh_token": first["refresh_token"] }))
        .await;
    assert_eq!(stale.status().as_u16(), 401);
}
