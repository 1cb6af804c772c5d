//! Store inventory, promotions and cart

use serde::{Deserialize, Serialize};

/// A product on the shelf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Unit price in pesos
    pub price: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub stock: u32,
    /// Free-form descriptors such as "spicy" or "fresh"
    #[serde(default)]
    pub descriptors: Vec<String>,
    /// Lowest price the store owner accepts when haggling
    #[serde(default)]
    pub min_price: Option<f64>,
}

fn default_unit() -> String {
    "piece".to_string()
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Case-insensitive match against name, category or descriptors
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return false;
        }
        let name = self.name.to_lowercase();
        name.contains(&term)
            || term.contains(&name)
            || self.category.to_lowercase() == term
            || self.descriptors.iter().any(|d| d.to_lowercase() == term)
    }
}

/// Active promotion on a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub product_id: String,
    pub description: String,
    #[serde(default)]
    pub discount_percent: f64,
}

/// Line in the customer's cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// Read-only snapshot of store state passed into response generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessContext {
    #[serde(default = "default_store_name")]
    pub store_name: String,
    #[serde(default)]
    pub inventory: Vec<Product>,
    #[serde(default)]
    pub promotions: Vec<Promotion>,
    #[serde(default)]
    pub cart: Vec<CartItem>,
}

fn default_store_name() -> String {
    "Sari-Sari Store".to_string()
}

impl Default for BusinessContext {
    fn default() -> Self {
        Self {
            store_name: default_store_name(),
            inventory: Vec::new(),
            promotions: Vec::new(),
            cart: Vec::new(),
        }
    }
}

impl BusinessContext {
    pub fn in_stock(&self) -> impl Iterator<Item = &Product> {
        self.inventory.iter().filter(|p| p.in_stock())
    }

    pub fn product_by_id(&self, id: &str) -> Option<&Product> {
        self.inventory.iter().find(|p| p.id == id)
    }

    /// First product whose name, category or descriptor matches `term`
    pub fn find_product(&self, term: &str) -> Option<&Product> {
        let lowered = term.trim().to_lowercase();
        self.inventory
            .iter()
            .find(|p| p.name.to_lowercase() == lowered)
            .or_else(|| self.inventory.iter().find(|p| p.matches(term)))
    }

    pub fn promotion_for(&self, product_id: &str) -> Option<&Promotion> {
        self.promotions.iter().find(|p| p.product_id == product_id)
    }

    pub fn cart_contains(&self, product_id: &str) -> bool {
        self.cart.iter().any(|c| c.product_id == product_id)
    }

    pub fn cart_total(&self) -> f64 {
        self.cart.iter().map(CartItem::line_total).sum()
    }

    /// Sorted, de-duplicated category names
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self.inventory.iter().map(|p| p.category.as_str()).collect();
        categories.sort_unstable();
        categories.dedup();
        categories
    }
}
