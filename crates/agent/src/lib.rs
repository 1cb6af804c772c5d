//! Provider routing and conversation services
//!
//! Features:
//! - AI router: pure provider selection, per-call fallback, metrics context
//! - NLP service: sanitation, negations, product-description search
//! - Response generator: intent templates, personality, upsell, negotiation

pub mod nlp;
pub mod response;
pub mod router;
pub mod search;

pub use nlp::{NlpAnalysis, NlpService};
pub use response::{GeneratedReply, ResponseGenerator};
pub use router::{select_provider, AiRouter, Routed, RouterError, Selection, NO_PROVIDER};
pub use search::{
    HttpProductSearch, ProductDescription, ProductMatch, ProductSearch, SearchError,
};

use sari_sari_text_processing::TextProcessingError;
use thiserror::Error;

/// NLP service errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NlpError {
    #[error("Invalid input: {0}")]
    Validation(#[from] TextProcessingError),

    #[error(transparent)]
    Search(#[from] SearchError),
}
