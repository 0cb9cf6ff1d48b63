//! Prometheus metrics setup and metric definitions

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const ACCESS_POLICY_CREATE_TOTAL: &str = "sm_access_policy_create_total";

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> anyhow::Result<PrometheusHandle> {
    let buckets = [
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    let handle = PrometheusBuilder::new()
        .set_buckets(&buckets)?
        .install_recorder()?;
    Ok(handle)
}

/// Register descriptions and zero values so HELP/TYPE lines show up before
/// the first request.
pub fn describe_metrics() {
    describe_counter!("sm_http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "sm_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "sm_http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );

    describe_counter!(
        ACCESS_POLICY_CREATE_TOTAL,
        "Access policy creation commands by outcome"
    );

    gauge!("sm_http_requests_in_flight").set(0.0);
    counter!(ACCESS_POLICY_CREATE_TOTAL, "outcome" => "created").absolute(0);
}

/// Count one access policy creation command. `outcome` is `created` or the
/// rejecting error kind.
pub fn record_access_policy_create(outcome: &'static str) {
    counter!(ACCESS_POLICY_CREATE_TOTAL, "outcome" => outcome).increment(1);
}
