use std::path::Path;

use fake::{Fake, faker::internet::en::SafeEmail};
use keystone_adapters::{
    InMemoryDatabase,
    config::{KeystoneSettings, test},
};
use keystone_auth_service::Application;
use keystone_core::{OutboxMessage, Topic};
use secrecy::Secret;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

pub struct TestApp {
    pub address: String,
    pub db: InMemoryDatabase,
    pub http_client: reqwest::Client,
    shutdown: CancellationToken,
}

/// Settings from the repository's `configuration/` directory, pointed at an
/// ephemeral port and a fast dispatcher.
pub fn test_settings() -> KeystoneSettings {
    let directory = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configuration");
    let mut settings =
        KeystoneSettings::load_from(&directory, "local").expect("Failed to load settings");

    settings.application.host = test::HOST.to_string();
    settings.application.port = test::PORT;
    settings.application.base_url = test::BASE_URL.to_string();
    settings.tokens.signing_key = Secret::new(test::SIGNING_KEY.to_string());
    settings.outbox.poll_interval_ms = test::POLL_INTERVAL_MS;
    settings.outbox.webhook_timeout_ms = test::WEBHOOK_TIMEOUT_MS;
    settings.outbox.webhook_url = None;
    settings
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_settings(test_settings()).await
    }

    pub async fn with_settings(settings: KeystoneSettings) -> Self {
        let db = InMemoryDatabase::new();
        let app = Application::in_memory(settings, db.clone())
            .await
            .expect("Failed to build application");

        let address = format!("http://{}", app.address());
        let shutdown = app.shutdown_token();

        tokio::spawn(app.run_until_stopped());

        Self {
            address,
            db,
            http_client: reqwest::Client::new(),
            shutdown,
        }
    }

    pub async fn get_health(&self) -> reqwest::Response {
        self.http_client
            .get(format!("{}/health", self.address))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_metrics(&self) -> reqwest::Response {
        self.http_client
            .get(format!("{}/metrics", self.address))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Value of `series` in the scraped metrics, 0 when it has not been
    /// recorded yet.
    pub async fn metric(&self, series: &str) -> u64 {
        let body = self
            .get_metrics()
            .await
            .text()
            .await
            .expect("Failed to read metrics");
        sample(&body, series).unwrap_or(0)
    }

    pub async fn post_register<Body: serde::Serialize>(&self, body: &Body) -> reqwest::Response {
        self.post_json("/auth/register", body).await
    }

    pub async fn post_login<Body: serde::Serialize>(&self, body: &Body) -> reqwest::Response {
        self.post_json("/auth/login", body).await
    }

    pub async fn post_refresh<Body: serde::Serialize>(&self, body: &Body) -> reqwest::Response {
        self.post_json("/auth/refresh", body).await
    }

    pub async fn post_resend_confirmation<Body: serde::Serialize>(
        &self,
        body: &Body,
    ) -> reqwest::Response {
        self.post_json("/auth/confirm/resend", body).await
    }

    pub async fn post_verify<Body: serde::Serialize>(&self, body: &Body) -> reqwest::Response {
        self.post_json("/auth/verify", body).await
    }

    pub async fn get_confirm(&self, email: &str, register_token: &str) -> reqwest::Response {
        self.http_client
            .get(format!("{}/auth/confirm", self.address))
            .query(&[("email", email), ("register_token", register_token)])
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn post_json<Body: serde::Serialize>(&self, path: &str, body: &Body) -> reqwest::Response {
        self.http_client
            .post(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Register `email` and return its token pair after logging in.
    pub async fn register_and_login(&self, email: &str, password: &str) -> Value {
        let credentials = json!({ "email": email, "password": password });

        let response = self.post_register(&credentials).await;
        assert_eq!(response.status().as_u16(), 201);

        let response = self.post_login(&credentials).await;
        assert_eq!(response.status().as_u16(), 200);
        response.json().await.expect("Failed to parse token pair")
    }

    pub async fn outbox(&self, topic: &Topic) -> Vec<OutboxMessage> {
        self.db
            .outbox_messages()
            .await
            .into_iter()
            .filter(|message| &message.topic == topic)
            .collect()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

pub fn get_random_email() -> String {
    SafeEmail().fake::<String>().to_lowercase()
}

/// Parse the value of `series`, a metric name with its label set, from a
/// Prometheus text exposition.
pub fn sample(exposition: &str, series: &str) -> Option<u64> {
    exposition.lines().find_map(|line| {
        let value = line.strip_prefix(series)?.strip_prefix(' ')?;
        value.trim().parse::<f64>().ok().map(|value| value as u64)
    })
}

pub fn event_body(message: &OutboxMessage) -> Value {
    serde_json::from_slice(&message.value).expect("Outbox value is not JSON")
}
