//! Customer-facing reply generation

pub mod generator;
pub mod negotiation;
pub mod personality;
pub mod templates;
pub mod truncation;
pub mod upsell;

pub use generator::{GeneratedReply, ResponseGenerator};
pub use negotiation::{Negotiation, NegotiationPolicy};
pub use personality::Personality;
pub use truncation::truncate_response;
pub use upsell::{Upsell, UpsellPolicy};

use chrono::Duration;
use sari_sari_config::MAX_ROLLING_WINDOW_SECS;

/// Cooldown window, clamped to the longest window the config accepts
pub(crate) fn rolling_window(secs: u64) -> Duration {
    let secs = secs.min(MAX_ROLLING_WINDOW_SECS) as i64;
    Duration::try_seconds(secs).unwrap_or_else(Duration::zero)
}


#[cfg(test)]
pub(crate) mod fixtures {
    use sari_sari_core::{BusinessContext, Product, Promotion};

    fn product(id: &str, name: &str, category: &str, price: f64, unit: &str, stock: u32) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            price,
            unit: unit.to_string(),
            stock,
            descriptors: Vec::new(),
            min_price: None,
        }
    }

    pub fn store() -> BusinessContext {
        let mut rice = product("rice", "Rice", "grains", 55.0, "kg", 20);
        rice.min_price = Some(52.0);
        let mut sardines = product("sardines", "Spicy Sardines", "canned goods", 28.0, "can", 12);
        sardines.descriptors = vec!["spicy".to_string()];

        BusinessContext {
            store_name: "Tindahan ni Aling Nena".to_string(),
            inventory: vec![
                rice,
                product("coffee", "Coffee", "beverages", 12.0, "sachet", 30),
                product("sugar", "Sugar", "baking", 45.0, "kg", 10),
                product("eggs", "Eggs", "fresh", 9.0, "piece", 60),
                sardines,
                product("soap", "Soap", "household", 25.0, "piece", 0),
            ],
            promotions: vec![Promotion {
                product_id: "coffee".to_string(),
                description: "Buy 10 sachets, get 1 free".to_string(),
                discount_percent: 9.0,
            }],
            cart: Vec::new(),
        }
    }
}
