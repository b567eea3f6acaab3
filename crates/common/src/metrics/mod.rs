//! Metrics and observability utilities
//!
//! Prometheus metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all ScholarCheck metrics
pub const METRICS_PREFIX: &str = "scholarcheck";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_uploads_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of accepted assignment uploads"
    );

    describe_counter!(
        format!("{}_dispatch_total", METRICS_PREFIX),
        Unit::Count,
        "Background forwards to the analysis workflow, by outcome"
    );

    describe_histogram!(
        format!("{}_dispatch_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Latency of the background forward to the analysis workflow"
    );

    describe_counter!(
        format!("{}_results_ingested_total", METRICS_PREFIX),
        Unit::Count,
        "Analysis results accepted from the external workflow"
    );

    describe_counter!(
        format!("{}_embedding_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total embedding API requests"
    );

    describe_histogram!(
        format!("{}_embedding_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Embedding generation latency in seconds"
    );

    describe_counter!(
        format!("{}_retrieval_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total reference source retrieval queries"
    );

    describe_histogram!(
        format!("{}_retrieval_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Reference source retrieval latency in seconds"
    );

    describe_gauge!(
        format!("{}_retrieval_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of sources returned from the last retrieval"
    );

    tracing::info!("Metrics registered");
}

/// Record an accepted upload
pub fn record_upload(content_type: &str) {
    counter!(
        format!("{}_uploads_total", METRICS_PREFIX),
        "content_type" => content_type.to_string()
    )
    .increment(1);
}

/// Record the outcome of one background forward
pub fn record_dispatch(duration_secs: f64, success: bool) {
    let outcome = if success { "success" } else { "failure" };

    counter!(
        format!("{}_dispatch_total", METRICS_PREFIX),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_dispatch_duration_seconds", METRICS_PREFIX),
        "outcome" => outcome.to_string()
    )
    .record(duration_secs);
}

/// Record a dispatch job that never left the queue
pub fn record_dispatch_dropped() {
    counter!(
        format!("{}_dispatch_total", METRICS_PREFIX),
        "outcome" => "dropped".to_string()
    )
    .increment(1);
}

/// Record one accepted result ingestion
pub fn record_result_ingested() {
    counter!(format!("{}_results_ingested_total", METRICS_PREFIX)).increment(1);
}

/// Record an embedding provider call
pub fn record_embedding(duration_secs: f64, model: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_embedding_requests_total", METRICS_PREFIX),
        "model" => model.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_embedding_duration_seconds", METRICS_PREFIX),
            "model" => model.to_string()
        )
        .record(duration_secs);
    }
}

/// Record a retrieval query
pub fn record_retrieval(duration_secs: f64, result_count: usize) {
    counter!(format!("{}_retrieval_queries_total", METRICS_PREFIX)).increment(1);

    histogram!(format!("{}_retrieval_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    gauge!(format!("{}_retrieval_results_count", METRICS_PREFIX)).set(result_count as f64);
}

/// Helper to time a span of work
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_monotonic() {
        let timer = Timer::start();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(timer.elapsed_secs() > 0.0);
    }

    #[test]
    fn test_record_helpers_do_not_panic() {
        record_upload("application/pdf");
        record_dispatch(0.1, true);
        record_dispatch_dropped();
        record_result_ingested();
        record_embedding(0.2, "mock-embedding", true);
        record_retrieval(0.05, 3);
    }
}
