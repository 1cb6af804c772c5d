//! Negation extraction
//!
//! Fixed pattern table scanned over sanitized text. Runs without any provider,
//! so dislikes are still captured when provider-backed extraction fails.
//! Patterns are tried in table order and a later pattern never claims text an
//! earlier one already matched ("do not like X" is not also read as "not like").

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Fixed confidence for every negation match
pub const NEGATION_CONFIDENCE: f32 = 0.8;

/// What kind of thing is being negated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegationType {
    Ingredient,
    Characteristic,
    Category,
}

/// A negated term found in a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Negation {
    pub negated_term: String,
    pub negation_type: NegationType,
    pub confidence: f32,
    /// Name of the pattern that matched
    pub pattern: String,
}

struct NegationPattern {
    name: &'static str,
    regex: Regex,
    negation_type: NegationType,
}

// Optional determiner between the negation and the term ("no more sugar")
const DETERMINER: &str = r"(?:(?:the|any|more|a|an)\s+)?";

// Optional intensifier before the term ("not too sweet")
const INTENSIFIER: &str = r"(?:(?:too|very|so|really|that)\s+)?";

static PATTERNS: Lazy<Vec<NegationPattern>> = Lazy::new(|| {
    let table: [(&str, &str, NegationType); 5] = [
        (
            "dont_like",
            r"\b(?:don[’']?t|do\s+not|doesn[’']?t|does\s+not)\s+(?:like|want|eat)\s+",
            NegationType::Characteristic,
        ),
        ("avoid", r"\bavoid(?:ing)?\s+", NegationType::Category),
        ("without", r"\bwithout\s+", NegationType::Ingredient),
        ("no", r"\bno\s+", NegationType::Ingredient),
        ("not", r"\bnot\s+", NegationType::Characteristic),
    ];

    table
        .into_iter()
        .map(|(name, prefix, negation_type)| NegationPattern {
            name,
            regex: Regex::new(&format!(
                r"(?i){}{}{}([\p{{L}}][\p{{L}}\-]*)",
                prefix, DETERMINER, INTENSIFIER
            ))
            .unwrap(),
            negation_type,
        })
        .collect()
});

// Words that follow a negation without naming a product trait ("no problem")
const IGNORED_TERMS: &[&str] = &[
    "a", "an", "the", "any", "more", "problem", "problems", "thanks", "thank", "worries",
    "sure", "need", "one", "way", "longer", "yet", "really", "much", "like", "want", "it",
    "that", "this", "i", "we", "you", "po",
];

/// Extract negated terms from a (sanitized) message
pub fn extract_negations(text: &str) -> Vec<Negation> {
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut found: Vec<(usize, Negation)> = Vec::new();

    for pattern in PATTERNS.iter() {
        for caps in pattern.regex.captures_iter(text) {
            let (Some(whole), Some(term)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let span = (whole.start(), whole.end());
            if claimed.iter().any(|&(s, e)| span.0 < e && s < span.1) {
                continue;
            }

            let term_text = term.as_str().to_lowercase();
            if IGNORED_TERMS.contains(&term_text.as_str()) {
                continue;
            }

            claimed.push(span);
            found.push((
                span.0,
                Negation {
                    negated_term: term_text,
                    negation_type: pattern.negation_type,
                    confidence: NEGATION_CONFIDENCE,
                    pattern: pattern.name.to_string(),
                },
            ));
        }
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, n)| n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_spicy() {
        let negations = extract_negations("no spicy");
        assert_eq!(negations.len(), 1);
        assert_eq!(negations[0].negated_term, "spicy");
        assert_eq!(negations[0].negation_type, NegationType::Ingredient);
        assert_eq!(negations[0].confidence, 0.8);
    }

    #[test]
    fn test_dont_like() {
        let negations = extract_negations("I don't like spicy food");
        assert_eq!(negations.len(), 1);
        assert_eq!(negations[0].negated_term, "spicy");
        assert_eq!(negations[0].negation_type, NegationType::Characteristic);
        assert_eq!(negations[0].pattern, "dont_like");
    }

    #[test]
    fn test_do_not_like_not_double_counted() {
        let negations = extract_negations("I do not like salty chips");
        assert_eq!(negations.len(), 1);
        assert_eq!(negations[0].negated_term, "salty");
    }

    #[test]
    fn test_avoid_and_without() {
        let negations = extract_negations("Please avoid dairy, and I want coffee without sugar");
        assert_eq!(negations.len(), 2);
        assert_eq!(negations[0].negated_term, "dairy");
        assert_eq!(negations[0].negation_type, NegationType::Category);
        assert_eq!(negations[1].negated_term, "sugar");
        assert_eq!(negations[1].negation_type, NegationType::Ingredient);
    }

    #[test]
    fn test_intensifier_skipped() {
        let negations = extract_negations("not too sweet please");
        assert_eq!(negations.len(), 1);
        assert_eq!(negations[0].negated_term, "sweet");
        assert_eq!(negations[0].negation_type, NegationType::Characteristic);
    }

    #[test]
    fn test_determiner_skipped() {
        let negations = extract_negations("I don't like the spicy one");
        assert_eq!(negations.len(), 1);
        assert_eq!(negations[0].negated_term, "spicy");
        assert_eq!(negations[0].pattern, "dont_like");

        let negations = extract_negations("no more sugar please");
        assert_eq!(negations.len(), 1);
        assert_eq!(negations[0].negated_term, "sugar");
        assert_eq!(negations[0].negation_type, NegationType::Ingredient);

        let negations = extract_negations("I don't want any onions");
        assert_eq!(negations[0].negated_term, "onions");

        let negations = extract_negations("not the very sweet kind");
        assert_eq!(negations[0].negated_term, "sweet");
    }

    #[test]
    fn test_determiner_alone_is_not_a_term() {
        assert!(extract_negations("no more, thanks").is_empty());
        assert!(extract_negations("Not a problem").is_empty());
    }

    #[test]
    fn test_filler_ignored() {
        assert!(extract_negations("No problem, thanks!").is_empty());
        assert!(extract_negations("Hello there").is_empty());
    }

    #[test]
    fn test_word_boundary() {
        // "no" inside "piano" or "casino" is not a negation
        assert!(extract_negations("piano music at the casino bar").is_empty());
    }

    #[test]
    fn test_idempotent() {
        let text = "no onions, not spicy, without msg";
        let first = extract_negations(text);
        let second = extract_negations(text);
        assert_eq!(first, second);
        let terms: Vec<&str> = first.iter().map(|n| n.negated_term.as_str()).collect();
        assert_eq!(terms, vec!["onions", "spicy", "msg"]);
    }
}
