//! Parsing of JSON replies from provider backends
//!
//! Models wrap JSON in prose or markdown fences often enough that the first
//! balanced `{...}` object is pulled out before deserializing. Parse failures
//! return a short description used as the degradation detail.

use serde::Deserialize;

use sari_sari_core::{Entity, EntityExtraction, EntityType, IntentClassification, IntentKind};

/// Locate the first balanced JSON object in `text`
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct RawIntent {
    intent: String,
    confidence: f32,
    #[serde(default)]
    reasoning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEntities {
    entities: Vec<RawEntity>,
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    #[serde(rename = "type")]
    entity_type: String,
    value: serde_json::Value,
    #[serde(default)]
    confidence: Option<f32>,
}

/// Parse `{intent, confidence, reasoning}`
pub fn parse_intent(text: &str) -> Result<IntentClassification, String> {
    let json = extract_json(text).ok_or_else(|| "no JSON object in reply".to_string())?;
    let raw: RawIntent = serde_json::from_str(json).map_err(|e| e.to_string())?;
    if raw.intent.trim().is_empty() {
        return Err("empty intent".to_string());
    }
    Ok(IntentClassification::new(
        IntentKind::parse(&raw.intent),
        raw.confidence,
        raw.reasoning,
    ))
}

/// Parse `{entities: [{type, value, confidence}], confidence}`
pub fn parse_entities(text: &str) -> Result<EntityExtraction, String> {
    let json = extract_json(text).ok_or_else(|| "no JSON object in reply".to_string())?;
    let raw: RawEntities = serde_json::from_str(json).map_err(|e| e.to_string())?;
    let overall = raw.confidence.unwrap_or(0.5);

    let entities = raw
        .entities
        .into_iter()
        .filter_map(|e| {
            let value = match e.value {
                serde_json::Value::String(s) => s.trim().to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            if value.is_empty() {
                return None;
            }
            Some(Entity::new(
                EntityType::parse(&e.entity_type),
                value,
                e.confidence.unwrap_or(overall),
            ))
        })
        .collect();

    Ok(EntityExtraction::new(entities, overall))
}
