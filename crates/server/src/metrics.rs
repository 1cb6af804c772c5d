//! Prometheus export
//!
//! Process-level counters for the HTTP surface. The router's own `NlpMetrics`
//! are served separately at `/api/nlp/metrics`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::ServerError;

/// Install the global Prometheus recorder
pub fn init_metrics() -> Result<PrometheusHandle, ServerError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Internal(format!("Failed to install metrics recorder: {}", e)))
}

/// One chat turn
pub fn record_chat(intent: &'static str, provider: &str, degradation: Option<&'static str>, latency_ms: u64) {
    metrics::counter!(
        "sari_sari_chat_requests_total",
        "intent" => intent,
        "provider" => provider.to_string(),
        "degradation" => degradation.unwrap_or("none")
    )
    .increment(1);
    metrics::histogram!("sari_sari_chat_latency_ms").record(latency_ms as f64);
}

pub fn record_error(endpoint: &'static str) {
    metrics::counter!("sari_sari_errors_total", "endpoint" => endpoint).increment(1);
}
