//! Local inference endpoint pool
//!
//! A local provider may spread over several inference hosts. Calls go to the
//! `primary` endpoint while it is healthy, otherwise to the first healthy
//! secondary in insertion order. Endpoints that were never probed count as
//! healthy.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::backend::LlmBackend;
use crate::LlmError;

/// Reserved name of the endpoint built from the provider config
pub const PRIMARY_ENDPOINT: &str = "primary";

/// Health snapshot of one endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointStatus {
    pub name: String,
    pub url: String,
    /// `None` until the first probe
    pub healthy: Option<bool>,
    pub last_checked: Option<DateTime<Utc>>,
}

struct Endpoint {
    name: String,
    url: String,
    backend: Arc<dyn LlmBackend>,
    healthy: Option<bool>,
    last_checked: Option<DateTime<Utc>>,
}

impl Endpoint {
    fn usable(&self) -> bool {
        self.healthy.unwrap_or(true)
    }

    fn status(&self) -> EndpointStatus {
        EndpointStatus {
            name: self.name.clone(),
            url: self.url.clone(),
            healthy: self.healthy,
            last_checked: self.last_checked,
        }
    }
}

/// Ordered set of named inference endpoints
pub struct EndpointPool {
    endpoints: RwLock<Vec<Endpoint>>,
}

impl EndpointPool {
    /// Pool holding only the primary endpoint
    pub fn new(url: impl Into<String>, backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            endpoints: RwLock::new(vec![Endpoint {
                name: PRIMARY_ENDPOINT.to_string(),
                url: url.into(),
                backend,
                healthy: None,
                last_checked: None,
            }]),
        }
    }

    pub fn add(
        &self,
        name: impl Into<String>,
        url: impl Into<String>,
        backend: Arc<dyn LlmBackend>,
    ) -> Result<(), LlmError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LlmError::Endpoint("endpoint name must not be empty".to_string()));
        }
        let mut endpoints = self.endpoints.write();
        if endpoints.iter().any(|e| e.name == name) {
            return Err(LlmError::Endpoint(format!("endpoint '{}' already exists", name)));
        }
        endpoints.push(Endpoint {
            name,
            url: url.into(),
            backend,
            healthy: None,
            last_checked: None,
        });
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<(), LlmError> {
        if name == PRIMARY_ENDPOINT {
            return Err(LlmError::Endpoint("the primary endpoint cannot be removed".to_string()));
        }
        let mut endpoints = self.endpoints.write();
        let before = endpoints.len();
        endpoints.retain(|e| e.name != name);
        if endpoints.len() == before {
            return Err(LlmError::Endpoint(format!("unknown endpoint '{}'", name)));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.endpoints.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.read().is_empty()
    }

    pub fn status(&self) -> Vec<EndpointStatus> {
        self.endpoints.read().iter().map(Endpoint::status).collect()
    }

    /// Endpoint to send the next call to
    pub fn select(&self) -> Option<(String, Arc<dyn LlmBackend>)> {
        let endpoints = self.endpoints.read();
        endpoints
            .iter()
            .find(|e| e.name == PRIMARY_ENDPOINT && e.usable())
            .or_else(|| endpoints.iter().find(|e| e.usable()))
            .map(|e| (e.name.clone(), e.backend.clone()))
    }

    /// Record a health observation
    pub fn mark(&self, name: &str, healthy: bool) {
        let mut endpoints = self.endpoints.write();
        if let Some(endpoint) = endpoints.iter_mut().find(|e| e.name == name) {
            if endpoint.healthy != Some(healthy) {
                tracing::info!(endpoint = name, healthy, "Endpoint health changed");
            }
            endpoint.healthy = Some(healthy);
            endpoint.last_checked = Some(Utc::now());
        }
    }

    /// Probe every endpoint concurrently; true if any is healthy
    pub async fn probe_all(&self) -> bool {
        let targets: Vec<(String, Arc<dyn LlmBackend>)> = self
            .endpoints
            .read()
            .iter()
            .map(|e| (e.name.clone(), e.backend.clone()))
            .collect();

        let results = futures::future::join_all(targets.into_iter().map(|(name, backend)| async move {
            let healthy = backend.is_available().await;
            (name, healthy)
        }))
        .await;

        let mut any = false;
        for (name, healthy) in results {
            self.mark(&name, healthy);
            any |= healthy;
        }
        any
    }
}
