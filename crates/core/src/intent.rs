//! Intent and entity types
//!
//! Produced once per incoming message, either by a provider backend or by the
//! keyword fallback classifier. Confidences are clamped to `[0, 1]` on
//! construction so downstream code never sees out-of-range values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Clamp a confidence into `[0, 1]`, mapping NaN to 0.
pub fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Closed set of customer intents understood by the store agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Greeting,
    BrowseProducts,
    ProductInquiry,
    PriceInquiry,
    AddToCart,
    ViewCart,
    NegotiationStart,
    Recommendation,
    Farewell,
    Help,
    #[default]
    #[serde(other)]
    Unknown,
}

impl IntentKind {
    /// All intents, in declaration order
    pub const ALL: [IntentKind; 11] = [
        IntentKind::Greeting,
        IntentKind::BrowseProducts,
        IntentKind::ProductInquiry,
        IntentKind::PriceInquiry,
        IntentKind::AddToCart,
        IntentKind::ViewCart,
        IntentKind::NegotiationStart,
        IntentKind::Recommendation,
        IntentKind::Farewell,
        IntentKind::Help,
        IntentKind::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Greeting => "greeting",
            IntentKind::BrowseProducts => "browse_products",
            IntentKind::ProductInquiry => "product_inquiry",
            IntentKind::PriceInquiry => "price_inquiry",
            IntentKind::AddToCart => "add_to_cart",
            IntentKind::ViewCart => "view_cart",
            IntentKind::NegotiationStart => "negotiation_start",
            IntentKind::Recommendation => "recommendation",
            IntentKind::Farewell => "farewell",
            IntentKind::Help => "help",
            IntentKind::Unknown => "unknown",
        }
    }

    /// Lenient parse used for backend output.
    ///
    /// Accepts snake_case, kebab-case, spaces and a few common aliases.
    /// Anything else becomes `Unknown`.
    pub fn parse(s: &str) -> Self {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "greeting" | "greet" => IntentKind::Greeting,
            "browse_products" | "browse" => IntentKind::BrowseProducts,
            "product_inquiry" | "product_info" => IntentKind::ProductInquiry,
            "price_inquiry" | "price_check" => IntentKind::PriceInquiry,
            "add_to_cart" | "purchase" | "buy" => IntentKind::AddToCart,
            "view_cart" | "show_cart" => IntentKind::ViewCart,
            "negotiation_start" | "negotiate" | "negotiation" => IntentKind::NegotiationStart,
            "recommendation" | "recommend" => IntentKind::Recommendation,
            "farewell" | "goodbye" => IntentKind::Farewell,
            "help" => IntentKind::Help,
            _ => IntentKind::Unknown,
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Quantity,
    Unit,
    ProductName,
    ProductCategory,
    Price,
    Brand,
    #[serde(other)]
    Other,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Quantity => "quantity",
            EntityType::Unit => "unit",
            EntityType::ProductName => "product_name",
            EntityType::ProductCategory => "product_category",
            EntityType::Price => "price",
            EntityType::Brand => "brand",
            EntityType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "quantity" | "qty" => EntityType::Quantity,
            "unit" => EntityType::Unit,
            "product_name" | "product" => EntityType::ProductName,
            "product_category" | "category" => EntityType::ProductCategory,
            "price" | "amount" => EntityType::Price,
            "brand" => EntityType::Brand,
            _ => EntityType::Other,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed span of information pulled from a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub value: String,
    pub confidence: f32,
}

impl Entity {
    pub fn new(entity_type: EntityType, value: impl Into<String>, confidence: f32) -> Self {
        Self {
            entity_type,
            value: value.into(),
            confidence: clamp_confidence(confidence),
        }
    }
}

/// Classified intent with its entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub name: IntentKind,
    pub confidence: f32,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl Intent {
    pub fn new(name: IntentKind, confidence: f32) -> Self {
        Self {
            name,
            confidence: clamp_confidence(confidence),
            entities: Vec::new(),
        }
    }

    pub fn with_entities(mut self, entities: Vec<Entity>) -> Self {
        self.entities = entities;
        self
    }

    pub fn unknown(confidence: f32) -> Self {
        Self::new(IntentKind::Unknown, confidence)
    }

    /// Entities of the given type, in extraction order
    pub fn entities_of(&self, entity_type: EntityType) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(move |e| e.entity_type == entity_type)
    }

    /// First entity value of the given type
    pub fn first_value(&self, entity_type: EntityType) -> Option<&str> {
        self.entities_of(entity_type).next().map(|e| e.value.as_str())
    }
}

/// Result of a provider intent classification call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent: IntentKind,
    pub confidence: f32,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl IntentClassification {
    pub fn new(intent: IntentKind, confidence: f32, reasoning: Option<String>) -> Self {
        Self {
            intent,
            confidence: clamp_confidence(confidence),
            reasoning,
        }
    }
}

/// Result of a provider entity extraction call
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityExtraction {
    pub entities: Vec<Entity>,
    pub confidence: f32,
}

impl EntityExtraction {
    pub fn new(entities: Vec<Entity>, confidence: f32) -> Self {
        Self {
            entities,
            confidence: clamp_confidence(confidence),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Result of a provider response generation call
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeneratedResponse {
    pub text: String,
}

impl GeneratedResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
