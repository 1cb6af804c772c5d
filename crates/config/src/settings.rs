//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{ConfigError, RouterConfig};

/// Prefix for environment overrides, e.g. `SARI_SARI__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "SARI_SARI";

/// Longest upsell or negotiation cooldown window (30 days)
pub const MAX_ROLLING_WINDOW_SECS: u64 = 30 * 24 * 60 * 60;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - falls back to defaults when config is broken
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Whether the binary must refuse to start on invalid configuration
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    /// Provider routing
    #[serde(default)]
    pub router: RouterConfig,

    /// Input sanitation limits
    #[serde(default)]
    pub nlp: NlpConfig,

    /// Product-description search endpoint
    #[serde(default)]
    pub search: SearchConfig,

    /// Response generation
    #[serde(default)]
    pub response: ResponseConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Path to the YAML store catalog
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
}

fn default_catalog_path() -> String {
    "config/catalog.yaml".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: RuntimeEnvironment::default(),
            server: ServerConfig::default(),
            router: RouterConfig::default(),
            nlp: NlpConfig::default(),
            search: SearchConfig::default(),
            response: ResponseConfig::default(),
            observability: ObservabilityConfig::default(),
            catalog_path: default_catalog_path(),
        }
    }
}

impl Settings {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.router.validate()?;
        self.validate_nlp()?;
        self.validate_response()?;
        self.validate_server()?;
        Ok(())
    }

    fn validate_nlp(&self) -> Result<(), ConfigError> {
        if self.nlp.max_input_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "nlp.max_input_chars".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }
        if self.nlp.max_raw_input_chars < self.nlp.max_input_chars {
            return Err(ConfigError::InvalidValue {
                field: "nlp.max_raw_input_chars".to_string(),
                message: format!(
                    "Must be at least nlp.max_input_chars ({})",
                    self.nlp.max_input_chars
                ),
            });
        }
        if self.search.limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "search.limit".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.search.threshold) {
            return Err(ConfigError::InvalidValue {
                field: "search.threshold".to_string(),
                message: format!("Must be between 0.0 and 1.0, got {}", self.search.threshold),
            });
        }
        Ok(())
    }

    fn validate_response(&self) -> Result<(), ConfigError> {
        let response = &self.response;

        if response.max_response_length < 20 {
            return Err(ConfigError::InvalidValue {
                field: "response.max_response_length".to_string(),
                message: format!("Too short (minimum 20), got {}", response.max_response_length),
            });
        }
        for (field, secs) in [
            ("response.upsell_window_secs", response.upsell_window_secs),
            ("response.negotiation_window_secs", response.negotiation_window_secs),
        ] {
            if !(1..=MAX_ROLLING_WINDOW_SECS).contains(&secs) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!(
                        "Must be between 1 and {} seconds, got {}",
                        MAX_ROLLING_WINDOW_SECS, secs
                    ),
                });
            }
        }
        if !(0.0..=100.0).contains(&response.max_discount_percent) {
            return Err(ConfigError::InvalidValue {
                field: "response.max_discount_percent".to_string(),
                message: format!(
                    "Must be between 0 and 100, got {}",
                    response.max_discount_percent
                ),
            });
        }
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }
        if self.server.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_sessions".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum live sessions held in memory
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Idle time after which a session is dropped
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_max_sessions() -> usize {
    1000
}
fn default_session_ttl() -> u64 {
    1800
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            max_sessions: default_max_sessions(),
            session_ttl_secs: default_session_ttl(),
        }
    }
}

/// Input sanitation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NlpConfig {
    /// Sanitized text is truncated to this many characters
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Raw input longer than this is rejected outright
    #[serde(default = "default_max_raw_input_chars")]
    pub max_raw_input_chars: usize,
}

fn default_max_input_chars() -> usize {
    1000
}
fn default_max_raw_input_chars() -> usize {
    10_000
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            max_input_chars: default_max_input_chars(),
            max_raw_input_chars: default_max_raw_input_chars(),
        }
    }
}

/// Semantic product search service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL; product-description search is disabled when unset
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token; falls back to SARI_SARI_SEARCH_API_KEY when unset
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_search_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum matches requested
    #[serde(default = "default_search_limit")]
    pub limit: usize,

    /// Minimum similarity for a match
    #[serde(default = "default_search_threshold")]
    pub threshold: f32,
}

fn default_search_timeout_ms() -> u64 {
    5_000
}
fn default_search_limit() -> usize {
    5
}
fn default_search_threshold() -> f32 {
    0.5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_ms: default_search_timeout_ms(),
            limit: default_search_limit(),
            threshold: default_search_threshold(),
        }
    }
}

/// Store persona
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalityConfig {
    /// Name the store keeper introduces themself with
    #[serde(default = "default_persona_name")]
    pub persona_name: String,

    /// Mix Filipino phrases into greetings and farewells
    #[serde(default = "default_true")]
    pub taglish: bool,
}

fn default_persona_name() -> String {
    "Aling Nena".to_string()
}

impl Default for PersonalityConfig {
    fn default() -> Self {
        Self {
            persona_name: default_persona_name(),
            taglish: true,
        }
    }
}

/// Response generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseConfig {
    /// Responses are truncated to this many characters
    #[serde(default = "default_max_response_length")]
    pub max_response_length: usize,

    #[serde(default = "default_true")]
    pub upsell_enabled: bool,

    /// Upsell suggestions allowed per rolling window
    #[serde(default = "default_max_attempts")]
    pub upsell_max_attempts: usize,

    #[serde(default = "default_upsell_window")]
    pub upsell_window_secs: u64,

    #[serde(default = "default_true")]
    pub negotiation_enabled: bool,

    /// Negotiation offers allowed per product per rolling window
    #[serde(default = "default_max_attempts")]
    pub negotiation_max_attempts: usize,

    #[serde(default = "default_negotiation_window")]
    pub negotiation_window_secs: u64,

    /// Deepest discount offered when haggling
    #[serde(default = "default_max_discount")]
    pub max_discount_percent: f64,

    #[serde(default)]
    pub personality: PersonalityConfig,
}

fn default_max_response_length() -> usize {
    500
}
fn default_max_attempts() -> usize {
    2
}
fn default_upsell_window() -> u64 {
    300
}
fn default_negotiation_window() -> u64 {
    600
}
fn default_max_discount() -> f64 {
    10.0
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            max_response_length: default_max_response_length(),
            upsell_enabled: true,
            upsell_max_attempts: default_max_attempts(),
            upsell_window_secs: default_upsell_window(),
            negotiation_enabled: true,
            negotiation_max_attempts: default_max_attempts(),
            negotiation_window_secs: default_negotiation_window(),
            max_discount_percent: default_max_discount(),
            personality: PersonalityConfig::default(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Expose Prometheus metrics at /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from `config/` in the working directory and the environment
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from `dir/default`, then `dir/{env}`, then `SARI_SARI__*` variables
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    let default_path = dir.join("default");
    builder = builder.add_source(File::with_name(&default_path.to_string_lossy()).required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        let env_path = dir.join(env_name);
        builder = builder.add_source(File::with_name(&env_path.to_string_lossy()).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
