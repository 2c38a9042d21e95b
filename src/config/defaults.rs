//! Canonical empty configuration used as merge base and migration fallback

use serde_json::{Map, Value};

use super::model::{
    CondensedCardConfig, CondensedCardDimensions, CondensedCardStyles, SectionType,
};
use crate::sections::SectionProps;

pub const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";
pub const DEFAULT_TEXT_COLOR: &str = "#1f2933";
pub const DEFAULT_ACCENT_COLOR: &str = "#2563eb";
pub const DEFAULT_FONT_FAMILY: &str = "Inter";

pub fn default_styles() -> CondensedCardStyles {
    CondensedCardStyles {
        gradient: None,
        background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
        text_color: DEFAULT_TEXT_COLOR.to_string(),
        accent_color: DEFAULT_ACCENT_COLOR.to_string(),
        font_family: DEFAULT_FONT_FAMILY.to_string(),
    }
}

/// `DEFAULT_CONDENSED_CARD_CONFIG`: card preset, default theme, no sections.
pub fn default_card_config() -> CondensedCardConfig {
    CondensedCardConfig {
        dimensions: CondensedCardDimensions::default(),
        styles: default_styles(),
        sections: Vec::new(),
    }
}

impl Default for CondensedCardConfig {
    fn default() -> Self {
        default_card_config()
    }
}

/// Default prop bag for a section kind, as persisted JSON.
pub fn default_props(kind: SectionType) -> Map<String, Value> {
    SectionProps::default_for(kind).to_map()
}
