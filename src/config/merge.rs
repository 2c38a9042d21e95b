//! Merge a partial (possibly stale) configuration with canonical defaults
//!
//! # Invariants
//! - A field present in the partial config is kept verbatim, including
//!   `false`, `0` and empty strings. JSON `null` counts as absent.
//! - Sections are matched against the default set by `id` (or by
//!   `sectionType` when the default set holds one section of that kind),
//!   never by array index.
//! - The result is safe to hand to either renderer without further checks.

use serde_json::{Map, Value};
use std::collections::HashSet;

use super::defaults::{default_card_config, default_props};
use super::model::{
    CondensedCardConfig, CondensedCardDimensions, CondensedCardSectionInstance, CondensedCardStyles,
    CustomObject, DimensionPreset, DimensionValue, GradientStyle, PositionConfig, SectionType,
};

/// `Partial<CondensedCardDimensions>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialDimensions {
    pub preset: Option<DimensionPreset>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// `Partial<CondensedCardStyles>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialStyles {
    pub gradient: Option<GradientStyle>,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
    pub accent_color: Option<String>,
    pub font_family: Option<String>,
}

/// `Partial<PositionConfig>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialPosition {
    pub x: Option<DimensionValue>,
    pub y: Option<DimensionValue>,
    pub width: Option<DimensionValue>,
    pub height: Option<DimensionValue>,
    pub visible: Option<bool>,
    pub z_index: Option<i32>,
}

/// A section whose identity is known but whose fields may be incomplete
#[derive(Debug, Clone, PartialEq)]
pub struct PartialSection {
    pub id: String,
    pub section_type: SectionType,
    pub position: PartialPosition,
    pub props: Map<String, Value>,
    pub layout_objects: Option<Vec<CustomObject>>,
}

/// `Partial<CondensedCardConfig>`, the output of migration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialCardConfig {
    pub dimensions: Option<PartialDimensions>,
    pub styles: Option<PartialStyles>,
    pub sections: Option<Vec<PartialSection>>,
}

impl From<&PositionConfig> for PartialPosition {
    fn from(p: &PositionConfig) -> Self {
        Self {
            x: Some(p.x.clone()),
            y: Some(p.y.clone()),
            width: Some(p.width.clone()),
            height: Some(p.height.clone()),
            visible: Some(p.visible),
            z_index: Some(p.z_index),
        }
    }
}

impl From<&CondensedCardConfig> for PartialCardConfig {
    fn from(cfg: &CondensedCardConfig) -> Self {
        Self {
            dimensions: Some(PartialDimensions {
                preset: Some(cfg.dimensions.preset),
                width: Some(cfg.dimensions.width),
                height: Some(cfg.dimensions.height),
            }),
            styles: Some(PartialStyles {
                gradient: cfg.styles.gradient.clone(),
                background_color: Some(cfg.styles.background_color.clone()),
                text_color: Some(cfg.styles.text_color.clone()),
                accent_color: Some(cfg.styles.accent_color.clone()),
                font_family: Some(cfg.styles.font_family.clone()),
            }),
            sections: Some(
                cfg.sections
                    .iter()
                    .map(|s| PartialSection {
                        id: s.id.clone(),
                        section_type: s.section_type,
                        position: PartialPosition::from(&s.position),
                        props: s.props.clone(),
                        layout_objects: s.layout_objects.clone(),
                    })
                    .collect(),
            ),
        }
    }
}

/// Overlay `top` onto `base`: keys in `top` win, nested objects merge key by
/// key, `null` in `top` leaves `base` untouched.
pub(crate) fn overlay_objects(base: &Map<String, Value>, top: &Map<String, Value>) -> Map<String, Value> {
    let mut out = base.clone();
    for (key, value) in top {
        match value {
            Value::Null => {}
            Value::Object(top_obj) => {
                let merged = match out.get(key) {
                    Some(Value::Object(base_obj)) => overlay_objects(base_obj, top_obj),
                    _ => overlay_objects(&Map::new(), top_obj),
                };
                out.insert(key.clone(), Value::Object(merged));
            }
            other => {
                out.insert(key.clone(), other.clone());
            }
        }
    }
    out
}

/// Merge against `DEFAULT_CONDENSED_CARD_CONFIG`.
pub fn merge_with_defaults(partial: &PartialCardConfig) -> CondensedCardConfig {
    merge_with(partial, &default_card_config())
}

/// Merge against an arbitrary default set (e.g. a starter template).
pub fn merge_with(partial: &PartialCardConfig, defaults: &CondensedCardConfig) -> CondensedCardConfig {
    let dimensions = match &partial.dimensions {
        Some(d) => merge_dimensions(d, &defaults.dimensions),
        None => defaults.dimensions,
    };
    let styles = match &partial.styles {
        Some(s) => merge_styles(s, &defaults.styles),
        None => defaults.styles.clone(),
    };
    let sections = match &partial.sections {
        Some(list) => merge_sections(list, &defaults.sections),
        None => defaults.sections.clone(),
    };
    CondensedCardConfig { dimensions, styles, sections }
}

fn merge_dimensions(d: &PartialDimensions, defaults: &CondensedCardDimensions) -> CondensedCardDimensions {
    let fallback = d
        .preset
        .and_then(DimensionPreset::size)
        .unwrap_or((defaults.width, defaults.height));
    let width = d.width.unwrap_or(fallback.0);
    let height = d.height.unwrap_or(fallback.1);
    let preset = match d.preset {
        Some(p) => p,
        None if d.width.is_some() || d.height.is_some() => DimensionPreset::matching(width, height),
        None => defaults.preset,
    };
    CondensedCardDimensions { preset, width, height }
}

fn merge_styles(s: &PartialStyles, defaults: &CondensedCardStyles) -> CondensedCardStyles {
    CondensedCardStyles {
        gradient: s.gradient.clone().or_else(|| defaults.gradient.clone()),
        background_color: s.background_color.clone().unwrap_or_else(|| defaults.background_color.clone()),
        text_color: s.text_color.clone().unwrap_or_else(|| defaults.text_color.clone()),
        accent_color: s.accent_color.clone().unwrap_or_else(|| defaults.accent_color.clone()),
        font_family: s.font_family.clone().unwrap_or_else(|| defaults.font_family.clone()),
    }
}

fn merge_position(p: &PartialPosition, base: &PositionConfig) -> PositionConfig {
    PositionConfig {
        x: p.x.clone().unwrap_or_else(|| base.x.clone()),
        y: p.y.clone().unwrap_or_else(|| base.y.clone()),
        width: p.width.clone().unwrap_or_else(|| base.width.clone()),
        height: p.height.clone().unwrap_or_else(|| base.height.clone()),
        visible: p.visible.unwrap_or(base.visible),
        z_index: p.z_index.unwrap_or(base.z_index),
    }
}

/// Find the default section a persisted section inherits from.
fn match_default<'a>(
    section: &PartialSection,
    defaults: &'a [CondensedCardSectionInstance],
    partial_ids: &HashSet<&str>,
) -> Option<&'a CondensedCardSectionInstance> {
    if let Some(by_id) = defaults.iter().find(|d| d.id == section.id) {
        return (by_id.section_type == section.section_type).then_some(by_id);
    }
    let mut same_kind = defaults.iter().filter(|d| d.section_type == section.section_type);
    match (same_kind.next(), same_kind.next()) {
        (Some(only), None) if !partial_ids.contains(only.id.as_str()) => Some(only),
        _ => None,
    }
}

fn merge_sections(list: &[PartialSection], defaults: &[CondensedCardSectionInstance]) -> Vec<CondensedCardSectionInstance> {
    let partial_ids: HashSet<&str> = list.iter().map(|s| s.id.as_str()).collect();
    let fallback_position = PositionConfig::default();

    list.iter()
        .map(|section| {
            let matched = match_default(section, defaults, &partial_ids);
            let base_position = matched.map(|m| &m.position).unwrap_or(&fallback_position);
            let kind_props = default_props(section.section_type);
            let base_props = match matched {
                Some(m) => overlay_objects(&kind_props, &m.props),
                None => kind_props,
            };
            CondensedCardSectionInstance {
                id: section.id.clone(),
                section_type: section.section_type,
                position: merge_position(&section.position, base_position),
                props: overlay_objects(&base_props, &section.props),
                layout_objects: section
                    .layout_objects
                    .clone()
                    .or_else(|| matched.and_then(|m| m.layout_objects.clone())),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn section(id: &str, kind: SectionType) -> PartialSection {
        PartialSection {
            id: id.to_string(),
            section_type: kind,
            position: PartialPosition::default(),
            props: Map::new(),
            layout_objects: None,
        }
    }

    #[test]
    fn empty_partial_is_the_default_config() {
        assert_eq!(merge_with_defaults(&PartialCardConfig::default()), default_card_config());
    }

    #[test]
    fn explicit_falsy_values_survive() {
        let mut s = section("bio-1", SectionType::Bio);
        s.position.visible = Some(false);
        s.position.x = Some(DimensionValue::pixels(0.0));
        s.props.insert("heading".into(), json!(""));
        s.props.insert("showHeading".into(), json!(false));
        let partial = PartialCardConfig { sections: Some(vec![s]), ..Default::default() };

        let merged = merge_with_defaults(&partial);
        let bio = &merged.sections[0];
        assert!(!bio.position.visible);
        assert_eq!(bio.position.x, DimensionValue::pixels(0.0));
        assert_eq!(bio.props["heading"], json!(""));
        assert_eq!(bio.props["showHeading"], json!(false));
        assert_eq!(bio.props["maxLines"], json!(6));
    }

    #[test]
    fn dimensions_fill_from_preset() {
        let partial = PartialCardConfig {
            dimensions: Some(PartialDimensions { preset: Some(DimensionPreset::Story), width: None, height: None }),
            ..Default::default()
        };
        let merged = merge_with_defaults(&partial);
        assert_eq!((merged.dimensions.width, merged.dimensions.height), (1080, 1920));

        let partial = PartialCardConfig {
            dimensions: Some(PartialDimensions { preset: None, width: Some(1080), height: Some(1080) }),
            ..Default::default()
        };
        assert_eq!(merge_with_defaults(&partial).dimensions.preset, DimensionPreset::Square);
    }

    #[test]
    fn sections_match_defaults_by_id_not_index() {
        let mut defaults = default_card_config();
        let mut header = CondensedCardSectionInstance::new("hdr", SectionType::Header, PositionConfig::band(0.0, 15.0));
        header.props.insert("subtitle".into(), json!("Realtor"));
        let mut promo = CondensedCardSectionInstance::new("promo", SectionType::Promotions, PositionConfig::band(80.0, 20.0));
        promo.props.insert("headline".into(), json!("Free consult"));
        defaults.sections = vec![promo, header];

        let partial = PartialCardConfig {
            sections: Some(vec![section("hdr", SectionType::Header), section("promo", SectionType::Promotions)]),
            ..Default::default()
        };
        let merged = merge_with(&partial, &defaults);
        assert_eq!(merged.sections[0].props["subtitle"], json!("Realtor"));
        assert!(merged.sections[0].props.get("headline").is_none());
        assert_eq!(merged.sections[1].props["headline"], json!("Free consult"));
        assert_eq!(merged.sections[1].position.y, DimensionValue::percent(80.0));
    }

    #[test]
    fn unmatched_sections_get_fallback_position() {
        let partial = PartialCardConfig {
            sections: Some(vec![section("map-1", SectionType::Map)]),
            ..Default::default()
        };
        let merged = merge_with_defaults(&partial);
        assert_eq!(merged.sections[0].position, PositionConfig::default());
    }

    #[test]
    fn overlay_recurses_into_objects() {
        let base = json!({"a": {"b": 1, "c": 2}, "d": 3});
        let top = json!({"a": {"b": 10}, "d": null, "e": [1]});
        let merged = overlay_objects(base.as_object().unwrap(), top.as_object().unwrap());
        assert_eq!(Value::Object(merged), json!({"a": {"b": 10, "c": 2}, "d": 3, "e": [1]}));
    }
}
