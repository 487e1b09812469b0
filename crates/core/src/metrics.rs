//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Jobs (submissions, outcomes, cleanup)
//! - Pipeline (per-file results, packaging)
//! - External services (LLM)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Job Metrics
// =============================================================================

/// Jobs accepted for processing.
pub static JOBS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("redline_jobs_submitted_total", "Total jobs submitted")
        .expect("valid metric definition")
});

/// Jobs that stopped processing, by outcome.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("redline_jobs_finished_total", "Total jobs finished"),
        &["status"], // "complete", "failed", "aborted"
    )
    .expect("valid metric definition")
});

/// Jobs removed by cleanup.
pub static JOBS_CLEANED_UP: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "redline_jobs_cleaned_up_total",
        "Total jobs removed by cleanup",
    )
    .expect("valid metric definition")
});

/// Job duration in seconds, from start of processing to final status.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("redline_job_duration_seconds", "Duration of job processing")
            .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["status"],
    )
    .expect("valid metric definition")
});

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Files processed, by result.
pub static TASKS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("redline_tasks_total", "Total files processed"),
        &["result"], // "complete", "error"
    )
    .expect("valid metric definition")
});

/// Per-file processing duration in seconds.
pub static TASK_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "redline_task_duration_seconds",
            "Duration of single file processing",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["result"],
    )
    .expect("valid metric definition")
});

/// Archive packaging duration in seconds.
pub static PACKAGING_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "redline_packaging_duration_seconds",
            "Duration of archive packaging",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["result"], // "success", "failed"
    )
    .expect("valid metric definition")
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "redline_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["service", "operation"],
    )
    .expect("valid metric definition")
});

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "redline_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .expect("valid metric definition")
});

/// LLM tokens used.
pub static LLM_TOKENS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("redline_llm_tokens_total", "Total LLM tokens used"),
        &["provider", "direction"], // direction: "input", "output"
    )
    .expect("valid metric definition")
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOBS_CLEANED_UP.clone()),
        Box::new(JOB_DURATION.clone()),
        // Pipeline
        Box::new(TASKS_TOTAL.clone()),
        Box::new(TASK_DURATION.clone()),
        Box::new(PACKAGING_DURATION.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
        Box::new(LLM_TOKENS.clone()),
    ]
}
