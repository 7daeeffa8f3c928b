//! Metrics and observability utilities
//!
//! Metric descriptions for the webhook proxy, the integrated search,
//! the session gate and the board, recorded through the `metrics` facade.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics prefix for all TenderLens metrics
pub const METRICS_PREFIX: &str = "tenderlens";

/// Histogram buckets for webhook latency (in seconds)
/// Automation workflows with AI steps routinely take tens of seconds
pub const UPSTREAM_BUCKETS: &[f64] = &[
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
    60.00,  // 60s
    120.0,  // 120s - default upstream timeout
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_upstream_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Webhook calls by upstream and outcome"
    );

    describe_histogram!(
        format!("{}_upstream_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Webhook call latency in seconds"
    );

    describe_counter!(
        format!("{}_searches_total", METRICS_PREFIX),
        Unit::Count,
        "Integrated searches by outcome"
    );

    describe_histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Integrated search latency in seconds"
    );

    describe_counter!(
        format!("{}_session_attempts_total", METRICS_PREFIX),
        Unit::Count,
        "Password gate attempts by result"
    );

    describe_counter!(
        format!("{}_board_operations_total", METRICS_PREFIX),
        Unit::Count,
        "Feedback board operations by kind and result"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record one webhook call
pub fn record_upstream_call(upstream: &str, outcome: &str, duration_secs: Option<f64>) {
    counter!(
        format!("{}_upstream_requests_total", METRICS_PREFIX),
        "upstream" => upstream.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    if let Some(duration) = duration_secs {
        histogram!(
            format!("{}_upstream_duration_seconds", METRICS_PREFIX),
            "upstream" => upstream.to_string()
        )
        .record(duration);
    }
}

/// Helper to record an integrated search
pub fn record_search(duration_secs: f64, outcome: &str) {
    counter!(
        format!("{}_searches_total", METRICS_PREFIX),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(format!("{}_search_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

/// Helper to record a password gate attempt
pub fn record_session_attempt(result: &str) {
    counter!(
        format!("{}_session_attempts_total", METRICS_PREFIX),
        "result" => result.to_string()
    )
    .increment(1);
}

/// Helper to record a board operation
pub fn record_board_operation(operation: &str, success: bool) {
    let result = if success { "success" } else { "error" };

    counter!(
        format!("{}_board_operations_total", METRICS_PREFIX),
        "operation" => operation.to_string(),
        "result" => result.to_string()
    )
    .increment(1);
}
