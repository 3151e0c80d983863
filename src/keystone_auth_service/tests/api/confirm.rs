use keystone_core::Topic;
use serde_json::json;

use crate::helpers::{TestApp, event_body, get_random_email};

async fn register(app: &TestApp, email: &str) {
    let response = app
        .post_register(&json!({ "email": email, "password": "password123" }))
        .await;
    assert_eq!(response.status().as_u16(), 201);
}

async fn latest_confirm_link(app: &TestApp) -> String {
    let events = app.outbox(&Topic::REGISTERS).await;
    let event = event_body(events.last().unwrap());
    event["confirm_link"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn confirm_link_from_the_register_event_confirms_the_account() {
    let app = TestApp::new().await;
    let email = get_random_email();
    register(&app, &email).await;

    let link = latest_confirm_link(&app).await;
    let (_, query) = link.split_once('?').unwrap();
    let response = app
        .http_client
        .get(format!("{}/auth/confirm?{}", app.address, query))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let user = app.db.users().await.pop().unwrap();
    assert!(user.is_confirmed());
    assert!(user.register_token().is_none());
}

#[tokio::test]
async fn should_return_400_for_a_wrong_token() {
    let app = TestApp::new().await;
    let email = get_random_email();
    register(&app, &email).await;

    let response = app.get_confirm(&email, "not-the-token").await;

    assert_eq!(response.status().as_u16(), 400);
    assert!(!app.db.users().await.pop().unwrap().is_confirmed());
}

#[tokio::test]
async fn should_return_404_for_an_unknown_email() {
    let app = TestApp::new().await;

    let response = app.get_confirm(&get_random_email(), "anything").await;

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn resend_replaces_the_register_token() {
    let app = TestApp::new().await;
    let email = get_random_email();
    register(&app, &email).await;
    let stale = app.db.users().await.pop().unwrap();
    let stale = stale.register_token().unwrap().as_str().to_string();

    let response = app
        .post_resend_confirmation(&json!({ "email": email }))
        .await;
    assert_eq!(response.status().as_u16(), 202);
    assert_eq!(app.outbox(&Topic::REGISTERS).await.len(), 2);

    let response = app.get_confirm(&email, &stale).await;
    assert_eq!(response.status().as_u16(), 400);

    let fresh = app.db.users().await.pop().unwrap();
    let fresh = fresh.register_token().unwrap().as_str().to_string();
    let response = app.get_confirm(&email, &fresh).await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn resend_for_a_confirmed_account_is_rejected() {
    let app = TestApp::new().await;
    let email = get_random_email();
    register(&app, &email).await;
    let user = app.db.users().await.pop().unwrap();
    let token = user.register_token().unwrap().as_str().to_string();
    assert_eq!(app.get_confirm(&email, &token).await.status().as_u16(), 200);

    let response = app
        .post_resend_confirmation(&json!({ "email": email }))
        .await;

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(app.outbox(&Topic::REGISTERS).await.len(), 1);
}
