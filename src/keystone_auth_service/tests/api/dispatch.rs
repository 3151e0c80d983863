use std::time::Duration;

use keystone_core::Topic;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use crate::helpers::{TestApp, get_random_email, test_settings};

async fn app_with_webhook(mock_server: &MockServer) -> TestApp {
    let mut settings = test_settings();
    settings.outbox.webhook_url = Some(format!("{}/events", mock_server.uri()));
    TestApp::with_settings(settings).await
}

async fn wait_for_delivery(app: &TestApp, topic: &Topic) -> bool {
    for _ in 0..100 {
        let messages = app.outbox(topic).await;
        if !messages.is_empty() && messages.iter().all(|m| m.delivered) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn register_event_reaches_the_webhook() {
    let mock_server = MockServer::start().await;
    Mock::given(path("/events"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let app = app_with_webhook(&mock_server).await;
    let email = get_random_email();
    let response = app
        .post_register(&json!({ "email": email, "password": "password123" }))
        .await;
    assert_eq!(response.status().as_u16(), 201);

    assert!(wait_for_delivery(&app, &Topic::REGISTERS).await);

    let requests = mock_server.received_requests().await.unwrap();
    let delivered: Vec<serde_json::Value> = requests
        .iter()
        .flat_map(|request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            body["messages"].as_array().cloned().unwrap_or_default()
        })
        .collect();

    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0]["topic"], "registers");
    assert_eq!(delivered[0]["value"]["email"], email.as_str());
}

#[tokio::test]
async fn rejected_batches_stay_pending() {
    let mock_server = MockServer::start().await;
    Mock::given(path("/events"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let app = app_with_webhook(&mock_server).await;
    let response = app
        .post_register(&json!({ "email": get_random_email(), "password": "password123" }))
        .await;
    assert_eq!(response.status().as_u16(), 201);

    for _ in 0..100 {
        if app.metric("outbox_dispatch_failures").await > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert!(app.metric("outbox_dispatch_failures").await > 0);
    let messages = app.outbox(&Topic::REGISTERS).await;
    assert_eq!(messages.len(), 1);
    assert!(!messages[0].delivered);
}

#[tokio::test]
async fn messages_stay_pending_without_a_webhook() {
    let app = TestApp::new().await;
    let response = app
        .post_register(&json!({ "email": get_random_email(), "password": "password123" }))
        .await;
    assert_eq!(response.status().as_u16(), 201);

    // Several poll intervals.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let messages = app.outbox(&Topic::REGISTERS).await;
    assert_eq!(messages.len(), 1);
    assert!(!messages[0].delivered);
    assert_eq!(app.metric("outbox_messages_dispatched").await, 0);
}
