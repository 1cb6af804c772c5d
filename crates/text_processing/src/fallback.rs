//! Keyword fallback classifier
//!
//! Deterministic keyword/regex matching used when no provider is available
//! or a provider call fails. Every confidence here is a fixed constant.
//!
//! Intent rules run in priority order: price, greeting, add-to-cart,
//! browse/descriptive. A message that greets and asks for a price is a price
//! inquiry because that rule is checked first.

use once_cell::sync::Lazy;
use regex::Regex;

use sari_sari_core::{
    BusinessContext, Entity, EntityExtraction, EntityType, GeneratedResponse, Intent,
    IntentClassification, IntentKind,
};

/// Provider key under which fallback results are billed
pub const SIMPLE_TEMPLATE_PROVIDER: &str = "simple_template";

pub const PRICE_CONFIDENCE: f32 = 0.85;
pub const GREETING_CONFIDENCE: f32 = 0.9;
pub const ADD_TO_CART_CONFIDENCE: f32 = 0.8;
pub const BROWSE_CONFIDENCE: f32 = 0.7;
pub const UNKNOWN_CONFIDENCE: f32 = 0.3;

pub const QUANTITY_CONFIDENCE: f32 = 0.9;
pub const NAME_CONFIDENCE: f32 = 0.8;
pub const DESCRIPTOR_CONFIDENCE: f32 = 0.7;
pub const CATEGORY_CONFIDENCE: f32 = 0.8;

const PRICE_KEYWORDS: &[&str] = &[
    "how much", "price", "prices", "cost", "costs", "magkano", "presyo", "halaga",
];

const GREETING_KEYWORDS: &[&str] = &[
    "hello", "hi", "hey", "good morning", "good afternoon", "good evening", "kumusta",
    "kamusta", "musta", "magandang umaga", "magandang hapon", "magandang gabi",
];

const ADD_TO_CART_KEYWORDS: &[&str] = &[
    "add", "buy", "i want", "i'd like", "i'll take", "order", "pabili", "bibili", "gusto ko",
    "kukunin ko",
];

const BROWSE_KEYWORDS: &[&str] = &[
    "show", "browse", "what do you have", "available", "looking for", "do you have",
    "do you sell", "meron", "mayroon",
];

/// Known product names, matched longest first
pub const PRODUCT_NAMES: &[&str] = &[
    "rice", "bigas", "eggs", "egg", "sugar", "asukal", "coffee", "kape", "milk", "gatas",
    "bread", "pandesal", "sardines", "noodles", "pancit canton", "canned tuna", "corned beef",
    "soap", "shampoo", "cooking oil", "oil", "mantika", "salt", "asin", "vinegar", "suka",
    "soy sauce", "toyo", "chicken", "pork", "beef", "fish", "chips", "softdrinks", "soda",
    "water", "candy", "biscuits", "banana", "saging", "mango", "tomato", "onion", "garlic",
];

/// Descriptors treated as partial product names
pub const DESCRIPTORS: &[&str] = &[
    "spiced", "spicy", "fresh", "organic", "sweet", "sour", "salty", "ripe", "native",
    "imported", "frozen", "cold", "local",
];

pub const CATEGORIES: &[&str] = &[
    "beverages", "drinks", "snacks", "canned goods", "condiments", "household", "toiletries",
    "personal care", "grains", "dairy", "produce", "vegetables", "fruits", "meat", "seafood",
    "bakery",
];

fn keyword_regex(keywords: &[&str]) -> Regex {
    let mut sorted: Vec<&str> = keywords.to_vec();
    sorted.sort_by_key(|k| std::cmp::Reverse(k.len()));
    let alternation = sorted
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{})\b", alternation)).unwrap()
}

static PRICE_RE: Lazy<Regex> = Lazy::new(|| keyword_regex(PRICE_KEYWORDS));
static GREETING_RE: Lazy<Regex> = Lazy::new(|| keyword_regex(GREETING_KEYWORDS));
static ADD_TO_CART_RE: Lazy<Regex> = Lazy::new(|| keyword_regex(ADD_TO_CART_KEYWORDS));
static BROWSE_RE: Lazy<Regex> = Lazy::new(|| {
    let mut all: Vec<&str> = BROWSE_KEYWORDS.to_vec();
    all.extend_from_slice(DESCRIPTORS);
    keyword_regex(&all)
});

static PRODUCT_RE: Lazy<Regex> = Lazy::new(|| keyword_regex(PRODUCT_NAMES));
static DESCRIPTOR_RE: Lazy<Regex> = Lazy::new(|| keyword_regex(DESCRIPTORS));
static CATEGORY_RE: Lazy<Regex> = Lazy::new(|| keyword_regex(CATEGORIES));

// <number><unit>, e.g. "2kg", "3 pieces", "1.5 liters", "500g"
static QUANTITY_UNIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(\d+(?:\.\d+)?)\s*(kilograms?|kilos?|kgs?|pieces?|pcs?|liters?|litres?|l|grams?|g)\b",
    )
    .unwrap()
});

fn normalize_unit(unit: &str) -> &'static str {
    match unit {
        "kg" | "kgs" | "kilo" | "kilos" | "kilogram" | "kilograms" => "kg",
        "piece" | "pieces" | "pc" | "pcs" => "piece",
        "liter" | "liters" | "litre" | "litres" | "l" => "liter",
        _ => "gram",
    }
}

/// Stateless keyword classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleClassifier;

impl SimpleClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify intent by keyword priority
    pub fn classify_intent(&self, message: &str) -> IntentClassification {
        let text = message.to_lowercase();

        let (intent, confidence, rule) = if PRICE_RE.is_match(&text) {
            (IntentKind::PriceInquiry, PRICE_CONFIDENCE, "price keywords")
        } else if GREETING_RE.is_match(&text) {
            (IntentKind::Greeting, GREETING_CONFIDENCE, "greeting keywords")
        } else if ADD_TO_CART_RE.is_match(&text) {
            (IntentKind::AddToCart, ADD_TO_CART_CONFIDENCE, "add-to-cart keywords")
        } else if BROWSE_RE.is_match(&text) {
            (IntentKind::BrowseProducts, BROWSE_CONFIDENCE, "browse keywords")
        } else {
            (IntentKind::Unknown, UNKNOWN_CONFIDENCE, "no keyword match")
        };

        tracing::debug!(intent = %intent, rule, "Fallback intent classification");
        IntentClassification::new(intent, confidence, Some(format!("fallback: {}", rule)))
    }

    /// Extract quantity/unit pairs, product names, descriptors and categories
    pub fn extract_entities(&self, message: &str) -> EntityExtraction {
        let text = message.to_lowercase();
        let mut entities = Vec::new();

        for caps in QUANTITY_UNIT_RE.captures_iter(&text) {
            entities.push(Entity::new(EntityType::Quantity, &caps[1], QUANTITY_CONFIDENCE));
            entities.push(Entity::new(
                EntityType::Unit,
                normalize_unit(&caps[2]),
                QUANTITY_CONFIDENCE,
            ));
        }

        for m in PRODUCT_RE.find_iter(&text) {
            push_unique(&mut entities, EntityType::ProductName, m.as_str(), NAME_CONFIDENCE);
        }
        for m in DESCRIPTOR_RE.find_iter(&text) {
            push_unique(&mut entities, EntityType::ProductName, m.as_str(), DESCRIPTOR_CONFIDENCE);
        }
        for m in CATEGORY_RE.find_iter(&text) {
            push_unique(&mut entities, EntityType::ProductCategory, m.as_str(), CATEGORY_CONFIDENCE);
        }

        let confidence = if entities.is_empty() { 0.0 } else { NAME_CONFIDENCE };
        EntityExtraction::new(entities, confidence)
    }

    /// Plain template reply used when no provider can generate one
    pub fn generate_response(&self, intent: &Intent, business: &BusinessContext) -> GeneratedResponse {
        let product = intent
            .first_value(EntityType::ProductName)
            .and_then(|name| business.find_product(name));

        let text = match intent.name {
            IntentKind::Greeting => format!(
                "Hello! Welcome to {}. What can I get for you today?",
                business.store_name
            ),
            IntentKind::PriceInquiry => match product {
                Some(p) => format!("{} is ₱{:.2} per {}.", p.name, p.price, p.unit),
                None => "Which product would you like the price of?".to_string(),
            },
            IntentKind::AddToCart => match product {
                Some(p) if p.in_stock() => format!("Sure, I can add {} to your order.", p.name),
                Some(p) => format!("Sorry, we are out of {} right now.", p.name),
                None => "What would you like to add to your order?".to_string(),
            },
            IntentKind::BrowseProducts | IntentKind::ProductInquiry | IntentKind::Recommendation => {
                let names: Vec<&str> = business.in_stock().take(5).map(|p| p.name.as_str()).collect();
                if names.is_empty() {
                    "Let me check what we have in stock for you.".to_string()
                } else {
                    format!("We have {} available.", names.join(", "))
                }
            }
            IntentKind::ViewCart => {
                if business.cart.is_empty() {
                    "Your cart is empty.".to_string()
                } else {
                    format!(
                        "You have {} item(s) in your cart, ₱{:.2} in total.",
                        business.cart.len(),
                        business.cart_total()
                    )
                }
            }
            IntentKind::Farewell => "Thank you for shopping with us!".to_string(),
            IntentKind::Help => {
                "You can ask about prices, browse products, or add items to your order.".to_string()
            }
            IntentKind::NegotiationStart => {
                "Let me see what I can do on the price.".to_string()
            }
            IntentKind::Unknown => {
                "Sorry, I didn't quite get that. Could you say it another way?".to_string()
            }
        };

        GeneratedResponse::new(text)
    }
}

fn push_unique(entities: &mut Vec<Entity>, entity_type: EntityType, value: &str, confidence: f32) {
    if !entities.iter().any(|e| e.entity_type == entity_type && e.value == value) {
        entities.push(Entity::new(entity_type, value, confidence));
    }
}
