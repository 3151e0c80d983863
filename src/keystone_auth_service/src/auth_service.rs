use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, request},
    middleware,
};
use keystone_adapters::{
    PrometheusMetrics, auth_routes, http::routes::track_requests, metrics_routes,
};
use keystone_application::AuthApi;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::telemetry::{make_span_with_request_id, on_request, on_response};

/// HTTP front of the authentication service.
pub struct AuthService {
    router: Router,
}

impl AuthService {
    /// Bind every authentication route to `api` and serve `metrics` on
    /// `/metrics`.
    ///
    /// Handlers share the one `Arc`, so any [`AuthApi`] implementation works:
    /// the Postgres-backed orchestrator in production, the in-memory one in
    /// tests. Each matched request is counted by path and status.
    pub fn new<A: AuthApi>(api: Arc<A>, metrics: PrometheusMetrics) -> Self {
        let router = auth_routes(api)
            .route_layer(middleware::from_fn_with_state(
                metrics.clone(),
                track_requests,
            ))
            .merge(metrics_routes(metrics));

        Self { router }
    }

    fn with_trace_layer(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(make_span_with_request_id)
                .on_request(on_request)
                .on_response(on_response),
        );
        self
    }

    /// Convert the service into a router that can be mounted on another one.
    ///
    /// Origins that are not valid header values are ignored.
    pub fn as_nested_router(mut self, allowed_origins: Option<Vec<String>>) -> Router {
        if let Some(allowed_origins) = allowed_origins {
            let allowed_origins: Vec<HeaderValue> = allowed_origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok())
                .collect();

            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_credentials(true)
                .allow_origin(AllowOrigin::predicate(
                    move |origin: &HeaderValue, _request_parts: &request::Parts| {
                        allowed_origins.contains(origin)
                    },
                ));

            self.router = self.router.layer(cors);
        }
        self.with_trace_layer().router
    }

    /// Serve on `listener` until `shutdown` is cancelled, then drain
    /// in-flight requests.
    pub async fn run_standalone(
        self,
        listener: TcpListener,
        allowed_origins: Option<Vec<String>>,
        shutdown: CancellationToken,
    ) -> Result<(), std::io::Error> {
        let router = self.as_nested_router(allowed_origins);

        tracing::info!("Auth service listening on {}", listener.local_addr()?);

        axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
    }
}
