//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the redline server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Jobs held in the registry, by status (collected dynamically)
//! - Dispatcher pool state (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use redline_core::JobStatus;
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "redline_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .expect("valid metric definition")
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("redline_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("valid metric definition")
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "redline_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .expect("valid metric definition")
});

// =============================================================================
// Job Metrics (collected dynamically)
// =============================================================================

/// Jobs held in the registry by status.
pub static JOBS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("redline_jobs_by_status", "Current job count by status"),
        &["status"],
    )
    .expect("valid metric definition")
});

// =============================================================================
// Dispatcher Metrics (collected dynamically)
// =============================================================================

/// Jobs being processed.
pub static DISPATCHER_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "redline_dispatcher_active_jobs",
        "Number of jobs currently being processed",
    )
    .expect("valid metric definition")
});

/// Jobs waiting for a processing slot.
pub static DISPATCHER_QUEUED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "redline_dispatcher_queued_jobs",
        "Number of jobs waiting for a processing slot",
    )
    .expect("valid metric definition")
});

/// Dispatcher running state (1 = accepting jobs, 0 = shut down).
pub static DISPATCHER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "redline_dispatcher_running",
        "Whether the dispatcher accepts jobs (1) or is shut down (0)",
    )
    .expect("valid metric definition")
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // HTTP
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        // Jobs
        Box::new(JOBS_BY_STATUS.clone()),
        // Dispatcher
        Box::new(DISPATCHER_ACTIVE.clone()),
        Box::new(DISPATCHER_QUEUED.clone()),
        Box::new(DISPATCHER_RUNNING.clone()),
    ];

    // Core metrics (jobs, tasks, packaging, external services)
    for metric in metrics.into_iter().chain(redline_core::metrics::all_metrics()) {
        if let Err(e) = registry.register(metric) {
            tracing::warn!(error = %e, "Failed to register metric");
        }
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the gauges reflect the registry and the
/// dispatcher at scrape time.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let service = state.service();

    let status = service.status();
    DISPATCHER_ACTIVE.set(status.dispatcher.active_jobs as i64);
    DISPATCHER_QUEUED.set(status.dispatcher.queued_jobs as i64);
    DISPATCHER_RUNNING.set(if status.dispatcher.running { 1 } else { 0 });

    let jobs = service.list();
    for job_status in [
        JobStatus::Queued,
        JobStatus::Processing,
        JobStatus::Complete,
        JobStatus::Failed,
    ] {
        let count = jobs.iter().filter(|j| j.status() == job_status).count();
        JOBS_BY_STATUS
            .with_label_values(&[job_status.as_str()])
            .set(count as i64);
    }
}

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("valid uuid regex")
});

static NUMERIC_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\d+(/|$)").expect("valid numeric segment regex"));

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_SEGMENT.replace_all(path, "{id}");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/jobs/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/v1/jobs/{id}");
    }

    #[test]
    fn test_normalize_path_task_artifact() {
        let path = "/api/v1/jobs/550e8400-e29b-41d4-a716-446655440000/tasks/3/artifact";
        assert_eq!(
            normalize_path(path),
            "/api/v1/jobs/{id}/tasks/{id}/artifact"
        );
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("redline_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_all_metrics() {
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        JOBS_BY_STATUS.with_label_values(&["queued"]).set(0);
        DISPATCHER_ACTIVE.set(0);
        DISPATCHER_RUNNING.set(1);
        redline_core::metrics::JOBS_SUBMITTED.inc();

        let output = encode_metrics();

        assert!(output.contains("redline_http_request_duration_seconds"));
        assert!(output.contains("redline_http_requests_in_flight"));
        assert!(output.contains("redline_jobs_by_status"));
        assert!(output.contains("redline_dispatcher_active_jobs"));
        assert!(output.contains("redline_dispatcher_running"));
        assert!(output.contains("redline_jobs_submitted_total"));
    }
}
