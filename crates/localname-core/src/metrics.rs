//! Metrics instrumentation for localname.
//!
//! All metrics are prefixed with `localname_client_`. Nothing is exported
//! unless the embedding process installs a `metrics` recorder.

use metrics::{counter, histogram};
use std::time::Duration;

use crate::traits::MetricsSink;

/// [`MetricsSink`] backed by the `metrics` facade
#[derive(Debug, Clone, Copy)]
pub struct PrometheusMetrics;

impl PrometheusMetrics {
    /// Create the sink and register metric descriptions
    pub fn new() -> Self {
        describe();
        Self
    }
}

impl Default for PrometheusMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSink for PrometheusMetrics {
    fn resolve_completed(&self, elapsed: Duration, ok: bool) {
        counter!("localname_client_ip_request_count").increment(1);
        if !ok {
            counter!("localname_client_ip_request_error_count").increment(1);
        }
        histogram!("localname_client_getip_requests_duration_seconds", "outcome" => outcome(ok))
            .record(elapsed.as_secs_f64());
    }

    fn ip_unchanged(&self) {
        counter!("localname_client_ip_unchanged_count").increment(1);
    }

    fn ip_changed(&self) {
        counter!("localname_client_ip_change_count").increment(1);
    }

    fn update_completed(&self, elapsed: Duration, ok: bool) {
        counter!("localname_client_dns_update_request_count").increment(1);
        if !ok {
            counter!("localname_client_dns_update_request_error_count").increment(1);
        }
        histogram!("localname_client_updatedns_requests_duration_seconds", "outcome" => outcome(ok))
            .record(elapsed.as_secs_f64());
    }
}

fn outcome(ok: bool) -> &'static str {
    if ok { "success" } else { "error" }
}

fn describe() {
    use metrics::{describe_counter, describe_histogram, Unit};

    describe_counter!(
        "localname_client_ip_request_count",
        "the number of times the IP address has been requested"
    );
    describe_counter!(
        "localname_client_ip_request_error_count",
        "the number of times a request for an IP address failed"
    );
    describe_counter!(
        "localname_client_ip_change_count",
        "the number of times the IP address has changed"
    );
    describe_counter!(
        "localname_client_ip_unchanged_count",
        "the number of checks that found the IP address unchanged"
    );
    describe_counter!(
        "localname_client_dns_update_request_count",
        "the number of times a DNS update has been requested"
    );
    describe_counter!(
        "localname_client_dns_update_request_error_count",
        "the number of times a request for a DNS update failed"
    );
    describe_histogram!(
        "localname_client_getip_requests_duration_seconds",
        Unit::Seconds,
        "distribution of response times for IP lookups"
    );
    describe_histogram!(
        "localname_client_updatedns_requests_duration_seconds",
        Unit::Seconds,
        "distribution of response times for DNS updates"
    );
}
