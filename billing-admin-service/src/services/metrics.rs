//! Metrics module for billing-admin-service.
//! Prometheus metrics for storage calls, list traffic and access denials.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "billing_admin_db_query_duration_seconds",
            "Database query duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// List requests served per entity
pub static PAGE_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Requests rejected by the access scope
pub static ACCESS_DENIED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    PAGE_REQUESTS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "billing_admin_page_requests_total",
                "Total list requests by entity"
            ),
            &["entity"]
        )
        .expect("Failed to register PAGE_REQUESTS_TOTAL")
    });

    ACCESS_DENIED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "billing_admin_access_denied_total",
                "Total requests denied by entity and reason"
            ),
            &["entity", "reason"]
        )
        .expect("Failed to register ACCESS_DENIED_TOTAL")
    });

    // Force initialization of lazy statics
    let _ = &*DB_QUERY_DURATION;
}

/// Get metrics in Prometheus text format, service metrics followed by HTTP metrics.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
    }

    let mut metrics = String::from_utf8_lossy(&buffer).into_owned();
    metrics.push_str(&service_core::observability::render_recorder());
    metrics
}

/// Record a list request.
pub fn record_page_request(entity: &str) {
    if let Some(counter) = PAGE_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[entity]).inc();
    }
}

/// Record an access denial.
pub fn record_access_denied(entity: &str, reason: &str) {
    if let Some(counter) = ACCESS_DENIED_TOTAL.get() {
        counter.with_label_values(&[entity, reason]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_counters_are_exported() {
        init_metrics();
        record_page_request("package");
        record_access_denied("invoice", "not_entitled");

        let metrics = get_metrics();

        assert!(metrics.contains("billing_admin_page_requests_total"));
        assert!(metrics.contains("billing_admin_access_denied_total"));
    }
}
