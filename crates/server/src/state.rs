//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;

use sari_sari_agent::{AiRouter, HttpProductSearch, NlpService, ResponseGenerator};
use sari_sari_config::Settings;
use sari_sari_core::{BusinessContext, MetricsRecorder};
use sari_sari_text_processing::SanitizeLimits;

use crate::session::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub nlp: Arc<NlpService>,
    pub generator: Arc<ResponseGenerator>,
    /// Store catalog; each session starts from it with an empty cart
    pub catalog: Arc<BusinessContext>,
    pub sessions: Arc<SessionManager>,
    /// Unset when Prometheus export is disabled
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Settings, nlp: NlpService, catalog: BusinessContext) -> Self {
        let sessions = SessionManager::new(
            config.server.max_sessions,
            Duration::from_secs(config.server.session_ttl_secs),
        );
        Self {
            generator: Arc::new(ResponseGenerator::new(&config.response)),
            config: Arc::new(config),
            nlp: Arc::new(nlp),
            catalog: Arc::new(catalog),
            sessions: Arc::new(sessions),
            prometheus: None,
        }
    }

    /// Build the router, probe providers and wire product search
    pub async fn from_settings(config: Settings, catalog: BusinessContext) -> Self {
        let metrics = Arc::new(MetricsRecorder::new());
        let router = AiRouter::from_config(config.router.clone(), metrics).await;
        let limits = SanitizeLimits {
            max_chars: config.nlp.max_input_chars,
            max_raw_chars: config.nlp.max_raw_input_chars,
        };

        let mut nlp = NlpService::new(Arc::new(router), limits);
        if config.search.endpoint.is_some() {
            match HttpProductSearch::new(&config.search) {
                Ok(search) => nlp = nlp.with_search(Arc::new(search)),
                Err(e) => tracing::warn!(error = %e, "Product search disabled"),
            }
        }

        Self::new(config, nlp, catalog)
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
