//! Input sanitation
//!
//! Trims, collapses runs of whitespace and truncates to a character budget.
//! Lengths are counted in grapheme clusters so Filipino text with combining
//! marks and emoji is never split mid-character.

use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Result, TextProcessingError};

/// Sanitation limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeLimits {
    /// Output is truncated to this many characters
    pub max_chars: usize,
    /// Input longer than this is rejected instead of truncated
    pub max_raw_chars: usize,
}

impl Default for SanitizeLimits {
    fn default() -> Self {
        Self {
            max_chars: 1000,
            max_raw_chars: 10_000,
        }
    }
}

/// Sanitize a raw customer message
pub fn sanitize(input: &str, limits: &SanitizeLimits) -> Result<String> {
    let raw_len = input.graphemes(true).count();
    if raw_len > limits.max_raw_chars {
        return Err(TextProcessingError::TooLong {
            len: raw_len,
            max: limits.max_raw_chars,
        });
    }

    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(TextProcessingError::Empty);
    }

    if collapsed.graphemes(true).count() <= limits.max_chars {
        return Ok(collapsed);
    }

    let truncated: String = collapsed.graphemes(true).take(limits.max_chars).collect();
    Ok(truncated.trim_end().to_string())
}
