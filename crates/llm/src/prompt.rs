//! Prompt construction
//!
//! Builds the three prompt families sent to provider backends: intent
//! classification, entity extraction and customer-facing replies.

use std::fmt;
use std::fmt::Write as _;
use serde::{Deserialize, Serialize};

use sari_sari_core::{BusinessContext, ConversationContext, Intent, IntentKind, TurnRole};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Number of history turns sent with a classification request
const HISTORY_TURNS: usize = 4;
/// Number of in-stock products listed in a reply prompt
const INVENTORY_LINES: usize = 30;

fn intent_names() -> String {
    IntentKind::ALL
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Compact context summary serialized into the classification prompt
#[derive(Serialize)]
struct ContextSummary<'a> {
    current_intent: Option<&'a str>,
    recent_messages: Vec<String>,
    dislikes: &'a [String],
    pending_negotiations: usize,
}

fn summarize(context: &ConversationContext) -> String {
    let summary = ContextSummary {
        current_intent: context.current_intent.as_ref().map(|i| i.name.as_str()),
        recent_messages: context
            .recent_turns(HISTORY_TURNS)
            .iter()
            .map(|t| {
                let who = match t.role {
                    TurnRole::Customer => "customer",
                    TurnRole::Agent => "store",
                };
                format!("{}: {}", who, t.text)
            })
            .collect(),
        dislikes: &context.preferences.dislikes,
        pending_negotiations: context.negotiation_history.len(),
    };
    serde_json::to_string(&summary).unwrap_or_else(|_| "{}".to_string())
}

/// Intent classification prompt
pub fn intent_messages(message: &str, context: &ConversationContext) -> Vec<Message> {
    let system = format!(
        "You classify customer messages for a Philippine sari-sari store. \
         Customers may write in English, Tagalog or Taglish.\n\
         Valid intents: {}.\n\
         Respond with JSON only, no prose: \
         {{\"intent\": \"<intent>\", \"confidence\": <0.0-1.0>, \"reasoning\": \"<short reason>\"}}",
        intent_names()
    );
    let user = format!(
        "Conversation context: {}\nCustomer message: {}",
        summarize(context),
        message
    );
    vec![Message::system(system), Message::user(user)]
}

/// Entity extraction prompt
pub fn entity_messages(message: &str) -> Vec<Message> {
    let system = "You extract shopping entities from customer messages for a Philippine \
                  sari-sari store. Entity types: quantity, unit, product_name, \
                  product_category, price, brand.\n\
                  Respond with JSON only, no prose: \
                  {\"entities\": [{\"type\": \"<type>\", \"value\": \"<value>\", \
                  \"confidence\": <0.0-1.0>}], \"confidence\": <0.0-1.0>}";
    vec![
        Message::system(system),
        Message::user(format!("Customer message: {}", message)),
    ]
}

/// Customer reply prompt with live inventory and promotions
pub fn response_messages(
    intent: &Intent,
    business: &BusinessContext,
    original_message: Option<&str>,
) -> Vec<Message> {
    let mut system = format!(
        "You are the friendly keeper of {}, a Filipino sari-sari store. \
         Reply in one to three short sentences. Quote prices in pesos (₱). \
         Only mention products listed below.\n\nIn stock:\n",
        business.store_name
    );
    let mut listed = 0;
    for product in business.in_stock().take(INVENTORY_LINES) {
        let _ = writeln!(
            system,
            "- {} ({}): ₱{:.2} per {}, {} left",
            product.name, product.category, product.price, product.unit, product.stock
        );
        listed += 1;
    }
    if listed == 0 {
        system.push_str("- (nothing in stock)\n");
    }
    if !business.promotions.is_empty() {
        system.push_str("\nPromotions:\n");
        for promo in &business.promotions {
            let name = business
                .product_by_id(&promo.product_id)
                .map(|p| p.name.as_str())
                .unwrap_or(promo.product_id.as_str());
            let _ = writeln!(system, "- {}: {}", name, promo.description);
        }
    }

    let entities = intent
        .entities
        .iter()
        .map(|e| format!("{}={}", e.entity_type, e.value))
        .collect::<Vec<_>>()
        .join(", ");
    let mut user = format!("Customer intent: {}", intent.name);
    if !entities.is_empty() {
        let _ = write!(user, "\nEntities: {}", entities);
    }
    if let Some(original) = original_message {
        let _ = write!(user, "\nCustomer said: {}", original);
    }

    vec![Message::system(system), Message::user(user)]
}
