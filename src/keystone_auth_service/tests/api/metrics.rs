use serde_json::json;

use crate::helpers::{TestApp, get_random_email, sample};

#[tokio::test]
async fn metrics_are_exposed_in_prometheus_format() {
    let app = TestApp::new().await;

    let response = app.get_metrics().await;

    assert_eq!(response.status().as_u16(), 200);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn requests_are_counted_by_path_and_status() {
    let app = TestApp::new().await;
    let email = get_random_email();

    app.register_and_login(&email, "password123").await;
    let response = app
        .post_login(&json!({ "email": email, "password": "wrong-password" }))
        .await;
    assert_eq!(response.status().as_u16(), 401);

    let body = app.get_metrics().await.text().await.unwrap();

    assert_eq!(
        sample(
            &body,
            r#"auth_service_requests_total{path="/auth/register",status="Created"}"#
        ),
        Some(1)
    );
    assert_eq!(
        sample(
            &body,
            r#"auth_service_requests_total{path="/auth/login",status="OK"}"#
        ),
        Some(1)
    );
    assert_eq!(
        sample(
            &body,
            r#"auth_service_requests_total{path="/auth/login",status="Unauthorized"}"#
        ),
        Some(1)
    );
    assert_eq!(
        sample(
            &body,
            r#"auth_service_errors_requests_total{path="/auth/login",status="Unauthorized"}"#
        ),
        Some(1)
    );
    assert_eq!(
        sample(
            &body,
            r#"auth_service_errors_requests_total{path="/auth/register",status="Created"}"#
        ),
        None
    );
}

#[tokio::test]
async fn use_case_counters_share_the_endpoint() {
    let app = TestApp::new().await;

    app.register_and_login(&get_random_email(), "password123").await;

    assert_eq!(app.metric("auth_register_success").await, 1);
    assert_eq!(app.metric("auth_login_success").await, 1);
}
