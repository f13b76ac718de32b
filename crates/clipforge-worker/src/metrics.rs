//! Prometheus metrics for the worker.

use axum::routing::get;
use axum::Router;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::{WorkerError, WorkerResult};

/// Metric names as constants for consistency.
pub mod names {
    /// Terminal task outcomes, labeled by status and worker.
    pub const TASKS_PROCESSED_TOTAL: &str = "tasks_processed_total";
    /// Wall time of one iteration, labeled by final status and worker.
    pub const TASK_PROCESSING_SECONDS: &str = "task_processing_seconds";
    /// Queue transport failures. Empty polls do not count.
    pub const QUEUE_ERRORS_TOTAL: &str = "queue_errors_total";
    /// Broker backlog sampled at each fetch.
    pub const QUEUE_DEPTH: &str = "queue_depth";
}

/// Observation points of the worker loop. One implementation records to the
/// Prometheus recorder; tests substitute a counting fake.
pub trait WorkerMetrics: Send + Sync {
    fn task_processed(&self, status: &str, worker_id: &str);
    fn processing_duration(&self, status: &str, worker_id: &str, seconds: f64);
    fn queue_error(&self, worker_id: &str);
    fn queue_depth(&self, worker_id: &str, depth: u64);
}

/// Metrics sink backed by the global Prometheus recorder.
#[derive(Debug, Clone, Default)]
pub struct PrometheusMetrics;

impl WorkerMetrics for PrometheusMetrics {
    fn task_processed(&self, status: &str, worker_id: &str) {
        let labels = [
            ("status", status.to_string()),
            ("worker_id", worker_id.to_string()),
        ];
        counter!(names::TASKS_PROCESSED_TOTAL, &labels).increment(1);
    }

    fn processing_duration(&self, status: &str, worker_id: &str, seconds: f64) {
        let labels = [
            ("status", status.to_string()),
            ("worker_id", worker_id.to_string()),
        ];
        histogram!(names::TASK_PROCESSING_SECONDS, &labels).record(seconds);
    }

    fn queue_error(&self, worker_id: &str) {
        let labels = [("worker_id", worker_id.to_string())];
        counter!(names::QUEUE_ERRORS_TOTAL, &labels).increment(1);
    }

    fn queue_depth(&self, worker_id: &str, depth: u64) {
        let labels = [("worker_id", worker_id.to_string())];
        gauge!(names::QUEUE_DEPTH, &labels).set(depth as f64);
    }
}

/// Install the Prometheus recorder and return its render handle.
pub fn init_recorder() -> WorkerResult<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| WorkerError::metrics(format!("install recorder: {e}")))
}

/// Router serving the scrape endpoint. Rendering is read-only.
pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || std::future::ready(handle.render())))
}
