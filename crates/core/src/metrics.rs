//! NLP usage metrics
//!
//! `MetricsRecorder` is handed to the router at construction and shared with
//! whoever needs to inspect it. Nothing here is global or persisted.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Snapshot of router counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NlpMetrics {
    pub total_requests: u64,
    /// Requests that produced any result, fallback results included
    pub successful_requests: u64,
    /// Requests where no provider could be selected
    pub failed_requests: u64,
    /// Running mean over requests a provider or the fallback actually served
    pub average_latency_ms: f64,
    pub total_cost: f64,
    /// Provider name -> requests served
    pub provider_usage: HashMap<String, u64>,
}

#[derive(Debug, Default)]
struct RecorderState {
    metrics: NlpMetrics,
    /// Requests whose latency is part of the mean
    served: u64,
}

/// Thread-safe metrics context
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    inner: Mutex<RecorderState>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.inner.lock().metrics.total_requests += 1;
    }

    pub fn record_failure(&self) {
        self.inner.lock().metrics.failed_requests += 1;
    }

    pub fn record_success(&self) {
        self.inner.lock().metrics.successful_requests += 1;
    }

    /// Record latency, cost and usage for one served request.
    ///
    /// The mean is taken over served requests only, counted under the same
    /// lock, so concurrent calls and selection failures do not skew it.
    pub fn record_usage(&self, provider: &str, latency_ms: f64, cost: f64) {
        let mut state = self.inner.lock();
        state.served += 1;
        let n = state.served as f64;
        let metrics = &mut state.metrics;
        metrics.average_latency_ms += (latency_ms - metrics.average_latency_ms) / n;
        metrics.total_cost += cost;
        *metrics.provider_usage.entry(provider.to_string()).or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> NlpMetrics {
        self.inner.lock().metrics.clone()
    }

    pub fn reset(&self) {
        *self.inner.lock() = RecorderState::default();
    }
}
