use axum::{
    extract::{MatchedPath, Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::PrometheusMetrics;

pub async fn metrics(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics.render(),
    )
}

/// Count every request by its route template and response status.
pub async fn track_requests(
    State(metrics): State<PrometheusMetrics>,
    request: Request,
    next: Next,
) -> Response {
    let path = match request.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_owned(),
        None => request.uri().path().to_owned(),
    };

    let response = next.run(request).await;
    metrics.record_request(&path, response.status());

    response
}
