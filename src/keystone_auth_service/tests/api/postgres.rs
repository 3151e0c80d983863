use keystone_auth_service::{Application, configure_postgresql};
use secrecy::{ExposeSecret, Secret};
use serde_json::json;
use testcontainers_modules::postgres;
use testcontainers_modules::testcontainers::{ContainerAsync, runners::AsyncRunner};
use tokio_util::sync::CancellationToken;

use crate::helpers::{get_random_email, test_settings};

struct PostgresApp {
    address: String,
    url: Secret<String>,
    http_client: reqwest::Client,
    shutdown: CancellationToken,
    _container: ContainerAsync<postgres::Postgres>,
}

impl PostgresApp {
    async fn start() -> Self {
        let container = postgres::Postgres::default().start().await.unwrap();
        let host = container.get_host().await.unwrap();
        let port = container.get_host_port_ipv4(5432).await.unwrap();
        let url = format!("postgres://postgres:postgres@{host}:{port}/postgres");

        let mut settings = test_settings();
        settings.database.url = Secret::new(url.clone());

        let app = Application::build(settings).await.unwrap();
        let address = format!("http://{}", app.address());
        let shutdown = app.shutdown_token();
        tokio::spawn(app.run_until_stopped());

        Self {
            address,
            url: Secret::new(url),
            http_client: reqwest::Client::new(),
            shutdown,
            _container: container,
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> reqwest::Response {
        self.http_client
            .post(format!("{}{}", self.address, path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for PostgresApp {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[tokio::test]
#[ignore = "requires docker"]
async fn register_login_and_refresh_against_postgres() {
    let app = PostgresApp::start().await;
    let credentials = json!({ "email": get_random_email(), "password": "password123" });

    assert_eq!(app.post("/auth/register", credentials.clone()).await.status().as_u16(), 201);
    assert_eq!(app.post("/auth/register", credentials.clone()).await.status().as_u16(), 409);

    let response = app.post("/auth/login", credentials).await;
    assert_eq!(response.status().as_u16(), 200);
    let tokens: serde_json::Value = response.json().await.unwrap();

    let body = json!({ "refresh_token": tokens["refresh_token"] });
    let (first, second) = tokio::join!(
        app.post("/auth/refresh", body.clone()),
        app.post("/auth/refresh", body)
    );
    let mut statuses = [first.status().as_u16(), second.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, [200, 401]);

    let mut settings = test_settings();
    settings.database.url = Secret::new(app.url.expose_secret().clone());
    let pool = configure_postgresql(&settings.database).await.unwrap();
    let topics: Vec<String> = sqlx::query_scalar("SELECT topic FROM outbox ORDER BY id")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(topics, vec!["registers".to_string(), "logins".to_string()]);
}
