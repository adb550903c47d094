// prometheus exporter setup

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

pub const METRIC_HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const METRIC_HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const METRIC_ACTIVE_CONNECTIONS: &str = "active_connections";

/// Content type of the text exposition format rendered by the handle.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub fn setup_metrics_recorder() -> PrometheusHandle {
    // Buckets are cumulative "<= threshold"; observations above 10s
    // only land in +Inf and the sum.
    const DURATION_SECONDS: &[f64] = &[0.1, 0.3, 0.5, 0.7, 1.0, 3.0, 5.0, 7.0, 10.0];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(METRIC_HTTP_REQUEST_DURATION_SECONDS.to_string()),
            DURATION_SECONDS,
        )
        .unwrap()
        .install_recorder()
        .unwrap();

    metrics::describe_histogram!(
        METRIC_HTTP_REQUEST_DURATION_SECONDS,
        "Duration of HTTP requests in seconds"
    );
    metrics::describe_counter!(METRIC_HTTP_REQUESTS_TOTAL, "Total number of HTTP requests");
    metrics::describe_gauge!(METRIC_ACTIVE_CONNECTIONS, "Number of active connections");

    handle
}
