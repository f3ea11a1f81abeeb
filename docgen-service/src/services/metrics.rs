//! Metrics collection and Prometheus export.
//!
//! Initializes the metrics exporter, records document generation outcomes and
//! provides the /metrics endpoint body.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics recorder.
///
/// Call once at startup before any metrics are recorded. Repeated calls are
/// no-ops.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::warn!(error = %e, "Failed to install Prometheus recorder"),
    }
}

/// Get the current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

pub fn record_document_generated(size: usize) {
    counter!("documents_generated_total").increment(1);
    histogram!("document_size_bytes").record(size as f64);
}

/// `stage` is one of `serialize` or `store`.
pub fn record_generation_failure(stage: &'static str) {
    counter!("document_generation_failures_total", "stage" => stage).increment(1);
}
