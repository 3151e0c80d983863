use serde_json::json;

use crate::helpers::{TestApp, get_random_email};

#[tokio::test]
async fn should_return_200_with_the_token_claims() {
    let app = TestApp::new().await;
    let email = get_random_email();
    let tokens = app.register_and_login(&email, "password123").await;

    let response = app
        .post_verify(&json!({ "access_token": tokens["access_token"] }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let claims: serde_json::Value = response.json().await.unwrap();
    assert_eq!(claims["email"], email.as_str());

    let user = app.db.users().await.pop().unwrap();
    assert_eq!(claims["user_id"], user.id().as_uuid().to_string());
    assert!(claims["expires_at"].is_string());
}

#[tokio::test]
async fn should_return_401_for_a_tampered_token() {
    let app = TestApp::new().await;
    let tokens = app.register_and_login(&get_random_email(), "password123").await;
    let mut tampered = tokens["access_token"].as_str().unwrap().to_string();
    tampered.push('x');

    let response = app.post_verify(&json!({ "access_token": tampered })).await;

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn should_return_401_for_garbage() {
    let app = TestApp::new().await;

    let response = app
        .post_verify(&json!({ "access_token": "not.a.token" }))
        .await;

    assert_eq!(response.status().as_u16(), 401);
}
