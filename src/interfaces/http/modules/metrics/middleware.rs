//! HTTP request metrics middleware
//!
//! Records `http_requests_total{method,path,status}` and
//! `http_request_duration_seconds{method,path}`. The `path` label is the
//! route template (`/api/user/cards/{id}/balance`), never the concrete URI,
//! so card ids do not become label values. Scrapes of `/metrics` itself are
//! not counted.

use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

const UNMATCHED_PATH: &str = "unmatched";
const SCRAPE_PATH: &str = "/metrics";

fn route_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string())
}

pub async fn http_metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let path = route_label(&request);
    if path == SCRAPE_PATH {
        return next.run(request).await;
    }
    let method = request.method().as_str().to_string();

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64();

    let status = response.status().as_u16().to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(elapsed);

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::Router;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/api/user/cards/{id}/balance", get(|| async { "ok" }))
            .route("/metrics", get(|| async { "scrape" }))
            .layer(axum::middleware::from_fn(http_metrics_middleware))
    }

    async fn hit(uri: &str) {
        app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn labels_use_route_template() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        {
            let _guard = metrics::set_default_local_recorder(&recorder);
            hit("/api/user/cards/42/balance").await;
            hit("/metrics").await;
            hit("/nowhere").await;
        }

        let text = handle.render();
        assert!(text.contains("path=\"/api/user/cards/{id}/balance\""));
        assert!(!text.contains("/api/user/cards/42"));
        assert!(!text.contains("path=\"/metrics\""));
        assert!(text.contains("path=\"unmatched\""));
    }
}
