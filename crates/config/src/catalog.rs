//! Store catalog loading
//!
//! The catalog is a YAML file with the store name, inventory and active
//! promotions. The cart is per-session and never read from disk.

use std::path::Path;

use sari_sari_core::BusinessContext;

use crate::ConfigError;

/// Load the store catalog from a YAML file
pub fn load_catalog(path: impl AsRef<Path>) -> Result<BusinessContext, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;

    let mut catalog: BusinessContext = serde_yaml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
    catalog.cart.clear();

    for product in &catalog.inventory {
        if product.price < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: format!("inventory.{}.price", product.id),
                message: format!("Price cannot be negative, got {}", product.price),
            });
        }
    }
    for promotion in &catalog.promotions {
        if catalog.product_by_id(&promotion.product_id).is_none() {
            tracing::warn!(
                product_id = %promotion.product_id,
                "Promotion references unknown product"
            );
        }
    }

    tracing::debug!(
        products = catalog.inventory.len(),
        promotions = catalog.promotions.len(),
        "Loaded store catalog"
    );

    Ok(catalog)
}
