pub mod routes;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use keystone_application::AuthApi;

use crate::PrometheusMetrics;

/// Authentication routes bound to `api`.
pub fn auth_routes<A: AuthApi>(api: Arc<A>) -> Router {
    Router::new()
        .route("/auth/register", post(routes::register::<A>))
        .route("/auth/login", post(routes::login::<A>))
        .route("/auth/refresh", post(routes::refresh::<A>))
        .route("/auth/confirm", get(routes::confirm::<A>))
        .route("/auth/confirm/resend", post(routes::resend_confirmation::<A>))
        .route("/auth/verify", post(routes::verify::<A>))
        .route("/health", get(routes::health))
        .with_state(api)
}

/// The Prometheus scrape endpoint.
pub fn metrics_routes(metrics: PrometheusMetrics) -> Router {
    Router::new()
        .route("/metrics", get(routes::metrics))
        .with_state(metrics)
}
