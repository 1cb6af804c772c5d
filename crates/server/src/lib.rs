//! Sari-sari store agent server
//!
//! HTTP host for the NLP service: sessions, chat, product-description search,
//! router metrics and provider status.

pub mod http;
pub mod metrics;
pub mod session;
pub mod state;

pub use http::create_router;
pub use metrics::{init_metrics, record_chat, record_error};
pub use session::{Session, SessionManager};
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use sari_sari_agent::{NlpError, SearchError};

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Session error: {0}")]
    Session(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<&ServerError> for StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::Session(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        StatusCode::from(&err)
    }
}

impl From<NlpError> for ServerError {
    fn from(err: NlpError) -> Self {
        match err {
            NlpError::Validation(e) => ServerError::InvalidRequest(e.to_string()),
            NlpError::Search(e @ (SearchError::NotFound | SearchError::NoResults)) => {
                ServerError::NotFound(e.to_string())
            }
            NlpError::Search(e @ SearchError::NotConfigured) => {
                ServerError::Unavailable(e.to_string())
            }
            NlpError::Search(e) => ServerError::Upstream(e.to_string()),
        }
    }
}

impl From<ServerError> for sari_sari_core::Error {
    fn from(err: ServerError) -> Self {
        sari_sari_core::Error::Internal(err.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
