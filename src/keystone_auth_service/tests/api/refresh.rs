use serde_json::json;

use crate::helpers::{TestApp, get_random_email};

#[tokio::test]
async fn should_return_200_with_a_new_token_pair() {
    let app = TestApp::new().await;
    let tokens = app.register_and_login(&get_random_email(), "password123").await;

    let response = app
        .post_refresh(&json!({ "refresh_token": tokens["refresh_token"] }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let refreshed: serde_json::Value = response.json().await.unwrap();
    assert_ne!(refreshed["refresh_token"], tokens["refresh_token"]);
    assert_eq!(app.metric("auth_refresh_success").await, 1);
}

#[tokio::test]
async fn refresh_token_is_single_use() {
    let app = TestApp::new().await;
    let tokens = app.register_and_login(&get_random_email(), "password123").await;
    let body = json!({ "refresh_token": tokens["refresh_token"] });

    let first = app.post_refresh(&body).await;
    assert_eq!(first.status().as_u16(), 200);

    let replay = app.post_refresh(&body).await;
    assert_eq!(replay.status().as_u16(), 401);
    let error: serde_json::Value = replay.json().await.unwrap();
    assert_eq!(error["error"], "Refresh token is invalid or expired");
}

#[tokio::test]
async fn concurrent_refreshes_have_one_winner() {
    let app = TestApp::new().await;
    let tokens = app.register_and_login(&get_random_email(), "password123").await;
    let body = json!({ "refresh_token": tokens["refresh_token"] });

    let (first, second) = tokio::join!(app.post_refresh(&body), app.post_refresh(&body));

    let mut statuses = [first.status().as_u16(), second.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, [200, 401]);
}

#[tokio::test]
async fn should_return_401_for_an_unknown_token() {
    let app = TestApp::new().await;

    let response = app
        .post_refresh(&json!({ "refresh_token": "never-issued" }))
        .await;

    assert_eq!(response.status().as_u16(), 401);
}
