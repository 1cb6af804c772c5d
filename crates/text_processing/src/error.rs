use thiserror::Error;

/// Text processing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextProcessingError {
    #[error("Message is empty")]
    Empty,

    #[error("Message too long: {len} > {max} characters")]
    TooLong { len: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, TextProcessingError>;
