//! Length limiting for customer-facing replies

const ELLIPSIS: &str = "...";
const SENTENCE_BREAK: &str = ". ";

/// Fit `text` into `max_chars` characters.
///
/// Whole sentences (split on `". "`) are kept while they fit. When not even
/// the first sentence fits, the text is cut and `"..."` appended, with the
/// ellipsis counted against the budget.
pub fn truncate_response(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let sentences: Vec<&str> = text.split(SENTENCE_BREAK).collect();
    let mut kept = String::new();
    for sentence in &sentences {
        let candidate = if kept.is_empty() {
            format!("{}.", sentence.trim_end_matches('.'))
        } else {
            format!("{} {}.", kept, sentence.trim_end_matches('.'))
        };
        if candidate.chars().count() > max_chars {
            break;
        }
        kept = candidate;
    }
    if !kept.is_empty() {
        return kept;
    }

    let budget = max_chars.saturating_sub(ELLIPSIS.len());
    let mut cut: String = text.chars().take(budget).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str(ELLIPSIS);
    cut.chars().take(max_chars).collect()
}
