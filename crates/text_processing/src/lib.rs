//! Text processing for the sari-sari store agent
//!
//! This crate provides the deterministic, provider-free text handling:
//! - **Sanitation**: trim, collapse whitespace, bound message length
//! - **Fallback classification**: keyword intent and entity rules used when
//!   no provider is available or a provider call fails
//! - **Negation extraction**: "no X", "don't like X", "without X" and friends

pub mod fallback;
pub mod negation;
pub mod sanitize;

mod error;

pub use error::{Result, TextProcessingError};

pub use fallback::{SimpleClassifier, SIMPLE_TEMPLATE_PROVIDER};
pub use negation::{extract_negations, Negation, NegationType, NEGATION_CONFIDENCE};
pub use sanitize::{sanitize, SanitizeLimits};
