use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

/// Middleware collecting HTTP metrics (latency, request count)
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    // Execute the request
    let response = next.run(req).await;

    // Record metrics
    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &path])
        .observe(duration);

    response
}

/// Normalize URL path to avoid cardinality explosion.
/// User identifiers are opaque client-chosen strings, so the segment right
/// after `progress` is collapsed to a placeholder. Level names are a fixed
/// set of six and stay as-is.
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<String> = path.split('/').map(str::to_string).collect();

    for i in 0..segments.len() {
        if segments[i] == "progress" && i + 1 < segments.len() && !segments[i + 1].is_empty() {
            segments[i + 1] = "{user_id}".to_string();
        }
    }

    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path("/api/v1/progress/alice-42"),
            "/api/v1/progress/{user_id}"
        );
        assert_eq!(
            normalize_path("/api/v1/progress/alice-42/level/comparison"),
            "/api/v1/progress/{user_id}/level/comparison"
        );
        assert_eq!(
            normalize_path("/api/v1/progress/alice-42/current-level"),
            "/api/v1/progress/{user_id}/current-level"
        );
        assert_eq!(normalize_path("/health"), "/health");
        assert_eq!(normalize_path("/metrics"), "/metrics");
    }
}
