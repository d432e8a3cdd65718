//! Axum middleware that wraps every request in a tracing span and records
//! Prometheus request metrics.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info_span, Instrument};

use super::metrics::METRICS;

/// Label used for requests that matched no route.
const UNMATCHED: &str = "unmatched";

/// Route template for metrics labels, e.g. `/api/v1/catalogs/:name`.
///
/// Raw paths are never used as labels; unknown catalog names would
/// otherwise create unbounded label cardinality.
fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| UNMATCHED.to_string(), |p| p.as_str().to_string())
}

/// Observability middleware for Axum.
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = route_label(&request);

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        http.route = %route,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    let status = response.status();

    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_http_request(method.as_str(), &route, status.as_u16(), duration.as_secs_f64());
    }

    tracing::info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = duration.as_millis() as u64,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{self, StatusCode},
        middleware::from_fn,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/items/:id", get(|| async { "ok" }))
            .layer(from_fn(observability_middleware))
    }

    #[tokio::test]
    async fn test_matched_route_is_recorded_by_template() -> Result<(), String> {
        let request = http::Request::builder()
            .uri("/items/42")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        let response = app()
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;
        assert_eq!(response.status(), StatusCode::OK);

        let metrics = METRICS.as_ref().map_err(|e| e.message.clone())?;
        let count = metrics
            .http_requests_total
            .with_label_values(&["GET", "/items/:id", "200"])
            .get();
        assert!(count >= 1.0);
        Ok(())
    }

    #[test]
    fn test_unmatched_request_label() {
        let request = http::Request::builder()
            .uri("/nowhere")
            .body(Body::empty())
            .unwrap();
        assert_eq!(route_label(&request), UNMATCHED);
    }
}
