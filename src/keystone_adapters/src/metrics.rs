use std::sync::Arc;

use axum::http::StatusCode;
use dashmap::DashMap;
use keystone_core::MetricsSink;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

pub const REQUESTS_TOTAL: &str = "auth_service_requests_total";
pub const ERROR_REQUESTS_TOTAL: &str = "auth_service_errors_requests_total";

/// Process-local counters, readable by name.
#[derive(Clone, Default)]
pub struct InMemoryMetrics {
    counters: Arc<DashMap<&'static str, u64>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, counter: &str) -> u64 {
        self.counters.get(counter).map(|value| *value).unwrap_or(0)
    }
}

impl MetricsSink for InMemoryMetrics {
    fn increment(&self, counter: &'static str, by: u64) {
        *self.counters.entry(counter).or_insert(0) += by;
    }
}

/// Counters kept in a Prometheus registry owned by this value.
///
/// The recorder is not installed globally, so each service instance renders
/// only its own counters.
#[derive(Clone)]
pub struct PrometheusMetrics {
    recorder: Arc<PrometheusRecorder>,
    handle: PrometheusHandle,
}

impl PrometheusMetrics {
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        Self {
            recorder: Arc::new(recorder),
            handle,
        }
    }

    /// Count one handled request by route and status text. Client and server
    /// errors are also counted in [`ERROR_REQUESTS_TOTAL`].
    pub fn record_request(&self, path: &str, status: StatusCode) {
        let status_text = status.canonical_reason().unwrap_or("Unknown");
        let is_error = status.is_client_error() || status.is_server_error();

        metrics::with_local_recorder(self.recorder.as_ref(), || {
            metrics::counter!(REQUESTS_TOTAL, "path" => path.to_owned(), "status" => status_text)
                .increment(1);
            if is_error {
                metrics::counter!(ERROR_REQUESTS_TOTAL, "path" => path.to_owned(), "status" => status_text)
                    .increment(1);
            }
        });
    }

    /// Prometheus text exposition of every counter.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl Default for PrometheusMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSink for PrometheusMetrics {
    fn increment(&self, counter: &'static str, by: u64) {
        metrics::with_local_recorder(self.recorder.as_ref(), || {
            metrics::counter!(counter).increment(by);
        });
    }
}
