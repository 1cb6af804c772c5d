//! Store-keeper voice
//!
//! Deterministic phrasing only: a persona name and optional Taglish
//! openers and closers. Nothing is learned per customer.

use sari_sari_config::PersonalityConfig;

#[derive(Debug, Clone)]
pub struct Personality {
    persona_name: String,
    taglish: bool,
}

impl Personality {
    pub fn new(config: &PersonalityConfig) -> Self {
        Self {
            persona_name: config.persona_name.clone(),
            taglish: config.taglish,
        }
    }

    pub fn greeting(&self, store_name: &str) -> String {
        if self.taglish {
            format!(
                "Magandang araw po! Welcome to {}. Ako si {}, ano po ang hanap ninyo?",
                store_name, self.persona_name
            )
        } else {
            format!(
                "Good day! Welcome to {}. I'm {}, what can I get for you?",
                store_name, self.persona_name
            )
        }
    }

    pub fn farewell(&self) -> String {
        if self.taglish {
            "Salamat po! Balik po kayo ulit.".to_string()
        } else {
            "Thank you for dropping by! See you again.".to_string()
        }
    }

    /// Short acknowledgement before confirming an order
    pub fn acknowledge(&self) -> &'static str {
        if self.taglish {
            "Sige po"
        } else {
            "Sure"
        }
    }

    /// Opening for an apology
    pub fn apologize(&self) -> &'static str {
        if self.taglish {
            "Pasensya na po"
        } else {
            "Sorry"
        }
    }
}

impl Default for Personality {
    fn default() -> Self {
        Self::new(&PersonalityConfig::default())
    }
}
