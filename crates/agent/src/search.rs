//! Product-description search
//!
//! Free-text product descriptions ("yung maanghang na sardinas") are resolved
//! by an external semantic-search service. Failures are returned to the
//! caller as they are; nothing here degrades silently.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sari_sari_config::SearchConfig;

/// Environment variable consulted when no API key is configured
pub const SEARCH_API_KEY_ENV: &str = "SARI_SARI_SEARCH_API_KEY";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Search service rejected credentials ({0})")]
    Auth(u16),

    #[error("Search endpoint not found")]
    NotFound,

    #[error("Search service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Search service error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("No matching products")]
    NoResults,

    #[error("Search transport error: {0}")]
    Transport(String),

    #[error("Invalid search response: {0}")]
    Decode(String),

    #[error("Product search is not configured")]
    NotConfigured,
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SearchError::Decode(err.to_string())
        } else {
            SearchError::Transport(err.to_string())
        }
    }
}

/// One product matched by a description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMatch {
    pub product_id: String,
    pub name: String,
    pub score: f32,
    #[serde(default)]
    pub description: Option<String>,
}

/// Products matched by a free-text description, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDescription {
    pub query: String,
    pub matches: Vec<ProductMatch>,
}

#[async_trait]
pub trait ProductSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<ProductDescription, SearchError>;
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    limit: usize,
    threshold: f32,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ProductMatch>,
}

/// `POST {endpoint}/search` with bearer auth
pub struct HttpProductSearch {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    limit: usize,
    threshold: f32,
}

impl HttpProductSearch {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .map(|e| e.trim_end_matches('/').to_string())
            .filter(|e| !e.is_empty())
            .ok_or(SearchError::NotConfigured)?;

        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(SEARCH_API_KEY_ENV).ok().filter(|k| !k.is_empty()));
        if api_key.is_none() {
            tracing::warn!("Product search configured without an API key");
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| SearchError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            limit: config.limit,
            threshold: config.threshold,
        })
    }

    fn url(&self) -> String {
        format!("{}/search", self.endpoint)
    }
}

/// Map a non-success status to a search error
fn status_error(status: StatusCode, body: String) -> SearchError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SearchError::Auth(status.as_u16()),
        StatusCode::NOT_FOUND => SearchError::NotFound,
        s if s.is_client_error() => SearchError::Rejected {
            status: s.as_u16(),
            message: body,
        },
        _ => SearchError::Server {
            status: status.as_u16(),
            message: body,
        },
    }
}

#[async_trait]
impl ProductSearch for HttpProductSearch {
    async fn search(&self, query: &str) -> Result<ProductDescription, SearchError> {
        let mut request = self.client.post(self.url()).json(&SearchRequest {
            query,
            limit: self.limit,
            threshold: self.threshold,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let body: SearchResponse = response.json().await?;
        if body.results.is_empty() {
            return Err(SearchError::NoResults);
        }

        let mut matches = body.results;
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        tracing::debug!(query, matches = matches.len(), "Product search");
        Ok(ProductDescription {
            query: query.to_string(),
            matches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_endpoint() {
        assert!(matches!(
            HttpProductSearch::new(&SearchConfig::default()),
            Err(SearchError::NotConfigured)
        ));
    }

    #[test]
    fn test_url_and_key() {
        let config = SearchConfig {
            endpoint: Some("https://search.example.ph/v1/".to_string()),
            api_key: Some("secret".to_string()),
            ..Default::default()
        };
        let search = HttpProductSearch::new(&config).unwrap();
        assert_eq!(search.url(), "https://search.example.ph/v1/search");
        assert_eq!(search.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_error(StatusCode::UNAUTHORIZED, String::new()), SearchError::Auth(401));
        assert_eq!(status_error(StatusCode::FORBIDDEN, String::new()), SearchError::Auth(403));
        assert_eq!(status_error(StatusCode::NOT_FOUND, String::new()), SearchError::NotFound);
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "upstream".to_string()),
            SearchError::Server { status: 502, .. }
        ));
        assert_eq!(
            status_error(StatusCode::BAD_REQUEST, "missing query".to_string()),
            SearchError::Rejected {
                status: 400,
                message: "missing query".to_string()
            }
        );
        assert!(matches!(
            status_error(StatusCode::UNPROCESSABLE_ENTITY, String::new()),
            SearchError::Rejected { status: 422, .. }
        ));
    }

    #[test]
    fn test_request_body() {
        let body = serde_json::to_value(SearchRequest {
            query: "spicy sardines",
            limit: 5,
            threshold: 0.5,
        })
        .unwrap();
        assert_eq!(body["query"], "spicy sardines");
        assert_eq!(body["limit"], 5);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let config = SearchConfig {
            endpoint: Some("http://127.0.0.1:9".to_string()),
            api_key: Some("k".to_string()),
            timeout_ms: 200,
            ..Default::default()
        };
        let search = HttpProductSearch::new(&config).unwrap();
        assert!(matches!(
            search.search("bigas").await,
            Err(SearchError::Transport(_))
        ));
    }
}
