//! Per-session conversation state
//!
//! Owned by the session layer. The router and NLP service only read it; the
//! response generator reads it and hands back the attempts it made so the
//! owner can record them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::intent::{Entity, Intent};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    Customer,
    Agent,
}

/// One message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Recorded negotiation offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationAttempt {
    pub product_id: String,
    pub offered_price: f64,
    pub timestamp: DateTime<Utc>,
}

/// Recorded upsell suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsellAttempt {
    pub product_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Customer likes and dislikes gathered during the session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

// "onion" and "onions" name the same thing
fn same_word(a: &str, b: &str) -> bool {
    a == b || a.strip_suffix('s') == Some(b) || b.strip_suffix('s') == Some(a)
}

impl Preferences {
    /// Whole-word match, so "egg" never covers "Eggplant"
    pub fn dislikes(&self, term: &str) -> bool {
        let term = words(term);
        self.dislikes.iter().any(|dislike| {
            let dislike = words(dislike);
            !dislike.is_empty()
                && term.windows(dislike.len()).any(|window| {
                    window
                        .iter()
                        .zip(&dislike)
                        .all(|(t, d)| same_word(t, d))
                })
        })
    }
}

/// Mutable per-session state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub session_id: String,
    pub current_intent: Option<Intent>,
    pub entities: Vec<Entity>,
    pub history: Vec<Turn>,
    pub preferences: Preferences,
    pub negotiation_history: Vec<NegotiationAttempt>,
    pub upsell_attempts: Vec<UpsellAttempt>,
}

impl ConversationContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    pub fn add_turn(&mut self, role: TurnRole, text: impl Into<String>) {
        self.history.push(Turn {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        });
    }

    /// Store the latest intent and accumulate its entities
    pub fn set_intent(&mut self, intent: Intent) {
        for entity in &intent.entities {
            if !self.entities.iter().any(|e| e.entity_type == entity.entity_type && e.value == entity.value) {
                self.entities.push(entity.clone());
            }
        }
        self.current_intent = Some(intent);
    }

    /// Add a dislike, lowercased and de-duplicated
    pub fn add_dislike(&mut self, term: &str) {
        let term = term.trim().to_lowercase();
        if !term.is_empty() && !self.preferences.dislikes.contains(&term) {
            self.preferences.dislikes.push(term);
        }
    }

    pub fn record_upsell(&mut self, attempt: UpsellAttempt) {
        self.upsell_attempts.push(attempt);
    }

    pub fn record_negotiation(&mut self, attempt: NegotiationAttempt) {
        self.negotiation_history.push(attempt);
    }

    /// Upsell attempts in the rolling window ending at `now`
    pub fn upsells_within(&self, window: Duration, now: DateTime<Utc>) -> usize {
        let cutoff = now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.upsell_attempts
            .iter()
            .filter(|a| a.timestamp > cutoff && a.timestamp <= now)
            .count()
    }

    /// Negotiation attempts on one product in the rolling window ending at `now`
    pub fn negotiations_within(&self, product_id: &str, window: Duration, now: DateTime<Utc>) -> usize {
        let cutoff = now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.negotiation_history
            .iter()
            .filter(|a| a.product_id == product_id && a.timestamp > cutoff && a.timestamp <= now)
            .count()
    }

    /// Last `n` turns, oldest first
    pub fn recent_turns(&self, n: usize) -> &[Turn] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{EntityType, IntentKind};

    #[test]
    fn test_upsell_window() {
        let now = Utc::now();
        let mut ctx = ConversationContext::new("s1");
        ctx.record_upsell(UpsellAttempt { product_id: "a".into(), timestamp: now - Duration::seconds(400) });
        ctx.record_upsell(UpsellAttempt { product_id: "b".into(), timestamp: now - Duration::seconds(100) });
        ctx.record_upsell(UpsellAttempt { product_id: "c".into(), timestamp: now - Duration::seconds(10) });

        assert_eq!(ctx.upsells_within(Duration::seconds(300), now), 2);
        assert_eq!(ctx.upsells_within(Duration::seconds(600), now), 3);
    }

    #[test]
    fn test_window_wider_than_calendar() {
        let now = Utc::now();
        let mut ctx = ConversationContext::new("s1");
        ctx.record_upsell(UpsellAttempt { product_id: "a".into(), timestamp: now - Duration::days(365) });
        ctx.record_negotiation(NegotiationAttempt {
            product_id: "rice".into(),
            offered_price: 45.0,
            timestamp: now - Duration::days(365),
        });

        assert_eq!(ctx.upsells_within(Duration::MAX, now), 1);
        assert_eq!(ctx.negotiations_within("rice", Duration::MAX, now), 1);
    }

    #[test]
    fn test_negotiation_window_per_product() {
        let now = Utc::now();
        let mut ctx = ConversationContext::new("s1");
        for secs in [50, 100, 700] {
            ctx.record_negotiation(NegotiationAttempt {
                product_id: "rice".into(),
                offered_price: 45.0,
                timestamp: now - Duration::seconds(secs),
            });
        }
        ctx.record_negotiation(NegotiationAttempt {
            product_id: "eggs".into(),
            offered_price: 7.0,
            timestamp: now,
        });

        assert_eq!(ctx.negotiations_within("rice", Duration::seconds(600), now), 2);
        assert_eq!(ctx.negotiations_within("eggs", Duration::seconds(600), now), 1);
        assert_eq!(ctx.negotiations_within("soap", Duration::seconds(600), now), 0);
    }

    #[test]
    fn test_set_intent_accumulates_unique_entities() {
        let mut ctx = ConversationContext::new("s1");
        let intent = Intent::new(IntentKind::AddToCart, 0.8)
            .with_entities(vec![Entity::new(EntityType::ProductName, "rice", 0.8)]);
        ctx.set_intent(intent.clone());
        ctx.set_intent(intent);
        assert_eq!(ctx.entities.len(), 1);
        assert_eq!(ctx.current_intent.map(|i| i.name), Some(IntentKind::AddToCart));
    }

    #[test]
    fn test_dislikes() {
        let mut ctx = ConversationContext::new("s1");
        ctx.add_dislike(" Spicy ");
        ctx.add_dislike("spicy");
        assert_eq!(ctx.preferences.dislikes, vec!["spicy".to_string()]);
        assert!(ctx.preferences.dislikes("Spicy Noodles"));
        assert!(!ctx.preferences.dislikes("Rice"));
    }

    #[test]
    fn test_dislikes_match_whole_words() {
        let mut ctx = ConversationContext::new("s1");
        ctx.add_dislike("egg");
        ctx.add_dislike("a");
        assert!(ctx.preferences.dislikes("Eggs"));
        assert!(ctx.preferences.dislikes("Fresh egg"));
        assert!(!ctx.preferences.dislikes("Eggplant"));
        assert!(!ctx.preferences.dislikes("Pancit Canton"));

        ctx.add_dislike("tomato sauce");
        assert!(ctx.preferences.dislikes("Sardines in Tomato Sauce"));
        assert!(!ctx.preferences.dislikes("Tomato Sardines"));
    }

    #[test]
    fn test_recent_turns() {
        let mut ctx = ConversationContext::new("s1");
        ctx.add_turn(TurnRole::Customer, "hi");
        ctx.add_turn(TurnRole::Agent, "hello");
        ctx.add_turn(TurnRole::Customer, "rice please");
        let recent = ctx.recent_turns(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].text, "hello");
        assert_eq!(ctx.recent_turns(10).len(), 3);
    }
}
