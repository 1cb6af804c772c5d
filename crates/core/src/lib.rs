//! Core types for the sari-sari store agent
//!
//! Foundational types shared by every other crate:
//! - Intents, entities and provider call results
//! - Degradation-aware `Outcome`
//! - Provider descriptors and NLP metrics
//! - Conversation and business context
//! - Error types

pub mod business;
pub mod conversation;
pub mod error;
pub mod intent;
pub mod metrics;
pub mod outcome;
pub mod provider;

pub use business::{BusinessContext, CartItem, Product, Promotion};
pub use conversation::{
    ConversationContext, NegotiationAttempt, Preferences, Turn, TurnRole, UpsellAttempt,
};
pub use error::{Error, Result};
pub use intent::{
    clamp_confidence, Entity, EntityExtraction, EntityType, GeneratedResponse, Intent,
    IntentClassification, IntentKind,
};
pub use metrics::{MetricsRecorder, NlpMetrics};
pub use outcome::{Degradation, Outcome};
pub use provider::{ProviderDescriptor, ProviderKind};
