//! Intent reply templates
//!
//! One function per intent. Each reads its entities from the intent and fills
//! in live inventory, promotion and cart data.

use std::fmt::Write as _;

use sari_sari_core::{
    BusinessContext, ConversationContext, EntityType, Intent, IntentKind, Product,
};

use super::personality::Personality;

/// Products listed in browse and recommendation replies
const LIST_LIMIT: usize = 5;
const RECOMMENDATION_LIMIT: usize = 3;

pub fn peso(amount: f64) -> String {
    format!("₱{:.2}", amount)
}

/// First product named by the intent's product entities
pub fn anchor_product<'a>(intent: &Intent, business: &'a BusinessContext) -> Option<&'a Product> {
    intent
        .entities_of(EntityType::ProductName)
        .chain(intent.entities_of(EntityType::Brand))
        .find_map(|e| business.find_product(&e.value))
}

fn requested_quantity(intent: &Intent) -> u32 {
    intent
        .first_value(EntityType::Quantity)
        .and_then(|q| q.trim().parse::<f64>().ok())
        .filter(|q| *q > 0.0)
        .map(|q| q.ceil() as u32)
        .unwrap_or(1)
}

fn promo_line(product: &Product, business: &BusinessContext) -> String {
    business
        .promotion_for(&product.id)
        .map(|p| format!(" Promo: {}.", p.description.trim_end_matches('.')))
        .unwrap_or_default()
}

/// Reply for `intent`, before upsell and negotiation text
pub fn render(
    intent: &Intent,
    business: &BusinessContext,
    context: &ConversationContext,
    personality: &Personality,
) -> String {
    match intent.name {
        IntentKind::Greeting => personality.greeting(&business.store_name),
        IntentKind::BrowseProducts => browse(intent, business, personality),
        IntentKind::ProductInquiry => product_inquiry(intent, business, personality),
        IntentKind::PriceInquiry => price_inquiry(intent, business),
        IntentKind::AddToCart => add_to_cart(intent, business, personality),
        IntentKind::ViewCart => view_cart(business),
        IntentKind::NegotiationStart => negotiation_start(intent, business),
        IntentKind::Recommendation => recommendation(business, context),
        IntentKind::Farewell => personality.farewell(),
        IntentKind::Help => help(business),
        IntentKind::Unknown => unknown(personality),
    }
}

fn browse(intent: &Intent, business: &BusinessContext, personality: &Personality) -> String {
    if let Some(category) = intent.first_value(EntityType::ProductCategory) {
        let listed: Vec<String> = business
            .in_stock()
            .filter(|p| p.category.eq_ignore_ascii_case(category))
            .take(LIST_LIMIT)
            .map(|p| format!("{} ({}/{})", p.name, peso(p.price), p.unit))
            .collect();
        return if listed.is_empty() {
            format!(
                "{}, we don't have any {} in stock right now.",
                personality.apologize(),
                category
            )
        } else {
            format!("Here's what we have in {}: {}.", category, listed.join(", "))
        };
    }

    let categories = business.categories();
    if business.in_stock().next().is_none() {
        return format!("{}, our shelves are being restocked right now.", personality.apologize());
    }
    format!(
        "We carry {}. What are you looking for today?",
        categories.join(", ")
    )
}

fn product_inquiry(intent: &Intent, business: &BusinessContext, personality: &Personality) -> String {
    match anchor_product(intent, business) {
        Some(p) if p.in_stock() => format!(
            "Yes, we have {} at {} per {}. {} left in stock.{}",
            p.name,
            peso(p.price),
            p.unit,
            p.stock,
            promo_line(p, business)
        ),
        Some(p) => format!("{}, {} is out of stock right now.", personality.apologize(), p.name),
        None => match intent.first_value(EntityType::ProductName) {
            Some(name) => format!("{}, we don't carry {}.", personality.apologize(), name),
            None => "Which product are you looking for?".to_string(),
        },
    }
}

fn price_inquiry(intent: &Intent, business: &BusinessContext) -> String {
    match anchor_product(intent, business) {
        Some(p) => format!(
            "{} costs {} per {}.{}",
            p.name,
            peso(p.price),
            p.unit,
            promo_line(p, business)
        ),
        None => "Which product would you like the price of?".to_string(),
    }
}

fn add_to_cart(intent: &Intent, business: &BusinessContext, personality: &Personality) -> String {
    let Some(product) = anchor_product(intent, business) else {
        return "What would you like to add to your cart?".to_string();
    };
    if !product.in_stock() {
        return format!("{}, {} is out of stock right now.", personality.apologize(), product.name);
    }

    let quantity = requested_quantity(intent);
    if quantity > product.stock {
        return format!(
            "We only have {} {} of {} left. Should I add all of them?",
            product.stock, product.unit, product.name
        );
    }
    format!(
        "{}, {} {} of {} for {}.",
        personality.acknowledge(),
        quantity,
        product.unit,
        product.name,
        peso(product.price * quantity as f64)
    )
}

fn view_cart(business: &BusinessContext) -> String {
    if business.cart.is_empty() {
        return "Your cart is empty. What can I get for you?".to_string();
    }
    let mut text = String::from("In your cart: ");
    let lines: Vec<String> = business
        .cart
        .iter()
        .map(|item| format!("{} x {} ({})", item.quantity, item.name, peso(item.line_total())))
        .collect();
    text.push_str(&lines.join(", "));
    let _ = write!(text, ". Total: {}.", peso(business.cart_total()));
    text
}

fn negotiation_start(intent: &Intent, business: &BusinessContext) -> String {
    match anchor_product(intent, business) {
        Some(p) => format!("{} is {} per {}.", p.name, peso(p.price), p.unit),
        None => "Which product would you like a better price on?".to_string(),
    }
}

fn recommendation(business: &BusinessContext, context: &ConversationContext) -> String {
    let allowed = |p: &&Product| {
        !context.preferences.dislikes(&p.name)
            && !p
                .descriptors
                .iter()
                .any(|d| context.preferences.dislikes(d))
    };

    // Promoted products first, then the rest in catalog order
    let mut picks: Vec<&Product> = business
        .in_stock()
        .filter(allowed)
        .filter(|p| business.promotion_for(&p.id).is_some())
        .collect();
    picks.extend(
        business
            .in_stock()
            .filter(allowed)
            .filter(|p| business.promotion_for(&p.id).is_none()),
    );
    picks.truncate(RECOMMENDATION_LIMIT);

    if picks.is_empty() {
        return "Let me check what else we have for you.".to_string();
    }
    let names: Vec<String> = picks
        .iter()
        .map(|p| format!("{} ({})", p.name, peso(p.price)))
        .collect();
    format!("I recommend {}.", names.join(", "))
}

fn help(business: &BusinessContext) -> String {
    format!(
        "You can ask for prices, browse what {} carries, add items to your cart, or ask what's in your cart.",
        business.store_name
    )
}

fn unknown(personality: &Personality) -> String {
    format!(
        "{}, I didn't quite get that. You can ask for prices, browse products, or add items to your cart.",
        personality.apologize()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::fixtures::store;
    use sari_sari_core::{CartItem, Entity};

    fn with_product(kind: IntentKind, name: &str) -> Intent {
        Intent::new(kind, 0.9).with_entities(vec![Entity::new(EntityType::ProductName, name, 0.9)])
    }

    fn render_default(intent: &Intent, business: &BusinessContext) -> String {
        render(intent, business, &ConversationContext::new("s1"), &Personality::default())
    }

    #[test]
    fn test_price_inquiry_with_promo() {
        let text = render_default(&with_product(IntentKind::PriceInquiry, "coffee"), &store());
        assert_eq!(text, "Coffee costs ₱12.00 per sachet. Promo: Buy 10 sachets, get 1 free.");
    }

    #[test]
    fn test_product_inquiry_out_of_stock_and_unknown() {
        let business = store();
        let soap = render_default(&with_product(IntentKind::ProductInquiry, "soap"), &business);
        assert!(soap.contains("Soap is out of stock"));

        let missing = render_default(&with_product(IntentKind::ProductInquiry, "durian"), &business);
        assert!(missing.contains("we don't carry durian"));
    }

    #[test]
    fn test_add_to_cart_uses_quantity() {
        let intent = Intent::new(IntentKind::AddToCart, 0.8).with_entities(vec![
            Entity::new(EntityType::Quantity, "2", 0.9),
            Entity::new(EntityType::Unit, "kg", 0.9),
            Entity::new(EntityType::ProductName, "rice", 0.8),
        ]);
        assert_eq!(render_default(&intent, &store()), "Sige po, 2 kg of Rice for ₱110.00.");

        let too_many = Intent::new(IntentKind::AddToCart, 0.8).with_entities(vec![
            Entity::new(EntityType::Quantity, "50", 0.9),
            Entity::new(EntityType::ProductName, "rice", 0.8),
        ]);
        assert!(render_default(&too_many, &store()).starts_with("We only have 20 kg of Rice"));
    }

    #[test]
    fn test_view_cart() {
        let mut business = store();
        assert!(render_default(&Intent::new(IntentKind::ViewCart, 0.9), &business)
            .starts_with("Your cart is empty"));

        business.cart.push(CartItem {
            product_id: "rice".to_string(),
            name: "Rice".to_string(),
            quantity: 2,
            unit_price: 55.0,
        });
        assert_eq!(
            render_default(&Intent::new(IntentKind::ViewCart, 0.9), &business),
            "In your cart: 2 x Rice (₱110.00). Total: ₱110.00."
        );
    }

    #[test]
    fn test_browse_by_category() {
        let intent = Intent::new(IntentKind::BrowseProducts, 0.7)
            .with_entities(vec![Entity::new(EntityType::ProductCategory, "grains", 0.8)]);
        assert_eq!(
            render_default(&intent, &store()),
            "Here's what we have in grains: Rice (₱55.00/kg)."
        );
        let all = render_default(&Intent::new(IntentKind::BrowseProducts, 0.7), &store());
        assert!(all.starts_with("We carry baking, beverages, canned goods, fresh, grains, household."));
    }

    #[test]
    fn test_recommendation_skips_dislikes() {
        let mut ctx = ConversationContext::new("s1");
        ctx.add_dislike("spicy");
        let text = render(
            &Intent::new(IntentKind::Recommendation, 0.8),
            &store(),
            &ctx,
            &Personality::default(),
        );
        assert!(text.starts_with("I recommend Coffee"));
        assert!(!text.contains("Sardines"));
    }

    #[test]
    fn test_every_intent_renders() {
        let business = store();
        for kind in IntentKind::ALL {
            assert!(!render_default(&Intent::new(kind, 0.5), &business).is_empty());
        }
    }
}
