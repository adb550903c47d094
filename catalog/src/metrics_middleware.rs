use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::IntoResponse,
};

use crate::prometheus::{METRIC_HTTP_REQUESTS_TOTAL, METRIC_HTTP_REQUEST_DURATION_SECONDS};

/// nginx convention for "client closed request", used when the request
/// future is dropped before a response was produced.
const STATUS_CLIENT_CLOSED: u16 = 499;

/// Records duration and count for one request when dropped, so the
/// measurement fires exactly once whatever the exit path: normal
/// response, handler error, or an aborted connection dropping the
/// request future mid-flight.
struct RequestTimer {
    start: Instant,
    method: String,
    route: String,
    status: Option<u16>,
}

impl RequestTimer {
    fn new(method: String, route: String) -> Self {
        Self {
            start: Instant::now(),
            method,
            route,
            status: None,
        }
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        let latency = self.start.elapsed().as_secs_f64();
        let status = self.status.unwrap_or(STATUS_CLIENT_CLOSED);

        let labels = [
            ("method", self.method.clone()),
            ("route", self.route.clone()),
            ("status_code", status.to_string()),
        ];

        metrics::counter!(METRIC_HTTP_REQUESTS_TOTAL, &labels).increment(1);
        metrics::histogram!(METRIC_HTTP_REQUEST_DURATION_SECONDS, &labels).record(latency);
    }
}

/// Middleware to record some common HTTP metrics
/// Someday tower-http might provide a metrics middleware: https://github.com/tower-rs/tower-http/issues/57
pub async fn track_metrics(req: Request<Body>, next: Next) -> impl IntoResponse {
    // Label by the matched route pattern when the router found one, to
    // keep path parameters out of the label set; fall back to the raw
    // path for unmatched (404) requests.
    let route = if let Some(matched_path) = req.extensions().get::<MatchedPath>() {
        matched_path.as_str().to_owned()
    } else {
        req.uri().path().to_owned()
    };

    let method = req.method().to_string();

    let mut timer = RequestTimer::new(method, route);

    // Run the rest of the request handling first, so we can measure it
    // and get response codes.
    let response = next.run(req).await;

    timer.status = Some(response.status().as_u16());

    response
}
