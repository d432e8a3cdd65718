//! Prometheus Metrics Definitions
//!
//! Defines the Agora metrics and exposes them at `/metrics` for scraping.
//! Catalog metrics are fed by [`MetricsListener`], registered on every cache.

use axum::{http::StatusCode, response::IntoResponse};
use agora_catalog::{RefreshListener, RefreshReport};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge_vec, CounterVec, Encoder,
    HistogramVec, IntGaugeVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Upstream fetch latency buckets (seconds). Fetches are cut off at the
/// configured timeout, 10s by default.
const FETCH_LATENCY_BUCKETS: &[f64] = &[0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Global metrics instance, registered on first use.
pub static METRICS: Lazy<ApiResult<AgoraMetrics>> = Lazy::new(AgoraMetrics::new);

fn registration_error(name: &str, e: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, e))
}

/// Container for all Agora metrics.
#[derive(Clone)]
pub struct AgoraMetrics {
    /// Labels: method, path, status
    pub http_requests_total: CounterVec,

    /// Labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Labels: catalog, outcome
    pub catalog_refreshes_total: CounterVec,

    /// Labels: catalog, source, status
    pub source_fetches_total: CounterVec,

    /// Labels: catalog, source
    pub source_fetch_duration_seconds: HistogramVec,

    /// Labels: catalog
    pub catalog_entries: IntGaugeVec,
}

impl AgoraMetrics {
    /// Create and register all metrics with the default Prometheus registry.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "agora_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_error("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "agora_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("http_request_duration_seconds", e))?,

            catalog_refreshes_total: register_counter_vec!(
                "agora_catalog_refreshes_total",
                "Catalog refresh cycles by outcome",
                &["catalog", "outcome"]
            )
            .map_err(|e| registration_error("catalog_refreshes_total", e))?,

            source_fetches_total: register_counter_vec!(
                "agora_source_fetches_total",
                "Upstream source fetches by result",
                &["catalog", "source", "status"]
            )
            .map_err(|e| registration_error("source_fetches_total", e))?,

            source_fetch_duration_seconds: register_histogram_vec!(
                "agora_source_fetch_duration_seconds",
                "Upstream source fetch duration in seconds",
                &["catalog", "source"],
                FETCH_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("source_fetch_duration_seconds", e))?,

            catalog_entries: register_int_gauge_vec!(
                "agora_catalog_entries",
                "Entries currently served per catalog",
                &["catalog"]
            )
            .map_err(|e| registration_error("catalog_entries", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, status_str.as_str()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record one refresh cycle and every source fetch in it.
    pub fn record_refresh(&self, report: &RefreshReport) {
        let catalog = report.catalog.as_str();
        self.catalog_refreshes_total
            .with_label_values(&[catalog, report.outcome.as_str()])
            .inc();

        for source in &report.sources {
            let status = source.error.as_ref().map_or("success", |e| e.kind());
            self.source_fetches_total
                .with_label_values(&[catalog, source.label.as_str(), status])
                .inc();
            self.source_fetch_duration_seconds
                .with_label_values(&[catalog, source.label.as_str()])
                .observe(source.elapsed.as_secs_f64());
        }

        self.catalog_entries
            .with_label_values(&[catalog])
            .set(i64::try_from(report.merged).unwrap_or(i64::MAX));
    }
}

/// Forwards refresh reports into [`METRICS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsListener;

impl RefreshListener for MetricsListener {
    fn on_refresh(&self, report: &RefreshReport) {
        match METRICS.as_ref() {
            Ok(metrics) => metrics.record_refresh(report),
            Err(e) => tracing::warn!(error = %e, "Metrics unavailable, refresh not recorded"),
        }
    }
}

/// Handler for GET /metrics.
///
/// Returns Prometheus text format metrics.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
