//! Degradation-aware results
//!
//! Intent, entity and response operations always hand back a usable value.
//! `Outcome` records whether that value is a genuine answer or a degraded
//! stand-in, so callers can assert on degradation without reading logs.
//! Hard failures stay in the surrounding `Result`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a result is degraded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// Backend replied, but the payload could not be parsed
    MalformedResponse { detail: String },
    /// Backend call failed and the keyword classifier answered instead
    ProviderFailed { provider: String, error: String },
    /// No registered provider is available
    NoProviderAvailable,
    /// Only providers exceeding the configured cost/latency thresholds are available
    NoProviderMeetsThresholds,
    /// Input was rejected by sanitation
    InvalidInput { detail: String },
}

impl Degradation {
    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Degradation::MalformedResponse { .. } => "malformed_response",
            Degradation::ProviderFailed { .. } => "provider_failed",
            Degradation::NoProviderAvailable => "no_provider_available",
            Degradation::NoProviderMeetsThresholds => "no_provider_meets_thresholds",
            Degradation::InvalidInput { .. } => "invalid_input",
        }
    }
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::MalformedResponse { detail } => write!(f, "malformed response: {}", detail),
            Degradation::ProviderFailed { provider, error } => {
                write!(f, "provider {} failed: {}", provider, error)
            }
            Degradation::NoProviderAvailable => f.write_str("no provider available"),
            Degradation::NoProviderMeetsThresholds => {
                f.write_str("no provider meets configured thresholds")
            }
            Degradation::InvalidInput { detail } => write!(f, "invalid input: {}", detail),
        }
    }
}

/// A value that is either a genuine answer or a degraded stand-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Outcome<T> {
    Ok(T),
    Degraded(T, Degradation),
}

impl<T> Outcome<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded(..))
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Ok(v) | Outcome::Degraded(v, _) => v,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Ok(v) | Outcome::Degraded(v, _) => v,
        }
    }

    pub fn degradation(&self) -> Option<&Degradation> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Degraded(_, reason) => Some(reason),
        }
    }

    /// Map the carried value, keeping the degradation reason
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Ok(v) => Outcome::Ok(f(v)),
            Outcome::Degraded(v, reason) => Outcome::Degraded(f(v), reason),
        }
    }

    /// Split into value and optional reason
    pub fn into_parts(self) -> (T, Option<Degradation>) {
        match self {
            Outcome::Ok(v) => (v, None),
            Outcome::Degraded(v, reason) => (v, Some(reason)),
        }
    }
}
