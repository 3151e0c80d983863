use keystone_core::Topic;
use serde_json::json;

use crate::helpers::{TestApp, event_body, get_random_email};

#[tokio::test]
async fn should_return_201_and_record_a_register_event() {
    let app = TestApp::new().await;
    let email = get_random_email();

    let response = app
        .post_register(&json!({ "email": email, "password": "password123" }))
        .await;

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["email"], email.as_str());
    assert!(body["user_id"].is_string());

    let events = app.outbox(&Topic::REGISTERS).await;
    assert_eq!(events.len(), 1);
    let event = event_body(&events[0]);
    assert_eq!(event["email"], email.as_str());
    assert!(
        event["confirm_link"]
            .as_str()
            .unwrap()
            .starts_with("http://localhost:8080/auth/confirm?")
    );
    assert_eq!(app.metric("auth_register_success").await, 1);
}

#[tokio::test]
async fn should_return_409_if_email_already_exists() {
    let app = TestApp::new().await;
    let credentials = json!({ "email": get_random_email(), "password": "password123" });

    let first = app.post_register(&credentials).await;
    assert_eq!(first.status().as_u16(), 201);

    let second = app.post_register(&credentials).await;
    assert_eq!(second.status().as_u16(), 409);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["error"], "User already exists");

    assert_eq!(app.db.users().await.len(), 1);
    assert_eq!(app.outbox(&Topic::REGISTERS).await.len(), 1);
}

#[tokio::test]
async fn should_return_400_if_invalid_input() {
    let app = TestApp::new().await;

    let test_cases = [
        json!({ "email": "", "password": "password123" }),
        json!({ "email": "not-an-email", "password": "password123" }),
        json!({ "email": get_random_email(), "password": "" }),
    ];

    for test_case in test_cases.iter() {
        let response = app.post_register(test_case).await;
        assert_eq!(
            response.status().as_u16(),
            400,
            "Failed for input: {:?}",
            test_case
        );
    }

    assert!(app.db.users().await.is_empty());
}

#[tokio::test]
async fn should_return_422_if_malformed_input() {
    let app = TestApp::new().await;

    let test_cases = [
        json!({ "password": "password123" }),
        json!({ "email": get_random_email() }),
        json!({}),
    ];

    for test_case in test_cases.iter() {
        let response = app.post_register(test_case).await;
        assert_eq!(
            response.status().as_u16(),
            422,
            "Failed for input: {:?}",
            test_case
        );
    }
}
