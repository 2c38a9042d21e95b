//! Abstract layout tree: `render(config, profile) -> LayoutTree`
//!
//! The tree is UI-agnostic. Any UI layer can walk it; the export pipeline
//! rasterizes it. Section geometry always comes from `resolve_layout`.

use log::warn;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::position::ResolvedBox;
use super::raster::Bitmap;
use super::resolve_layout;
use crate::config::model::{CondensedCardConfig, GradientStyle, SectionType};
use crate::sections::{merge_props, Location, ProfileData, SectionContext, SectionProps, SectionRegistry, TextAlign};

/// Live override props keyed by section id
pub type LiveOverrides = HashMap<String, Map<String, Value>>;

/// Drawable leaf, positioned in absolute canvas pixels
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Element {
    Fill {
        rect: ResolvedBox,
        color: String,
    },
    Gradient {
        rect: ResolvedBox,
        gradient: GradientStyle,
    },
    Text {
        rect: ResolvedBox,
        lines: Vec<String>,
        font_size: f64,
        color: String,
        align: TextAlign,
    },
    Image {
        rect: ResolvedBox,
        src: String,
        /// Decoded pixels, filled in by export preprocessing
        #[serde(skip)]
        bitmap: Option<Bitmap>,
    },
    Link {
        rect: ResolvedBox,
        label: String,
        href: String,
        font_size: f64,
        color: String,
    },
    Spacer {
        rect: ResolvedBox,
    },
    /// Live map widget; dynamic
    MapWidget {
        rect: ResolvedBox,
        location: Location,
        zoom: u8,
    },
    /// Video player; dynamic
    Video {
        rect: ResolvedBox,
        src: String,
        poster: Option<String>,
        autoplay: bool,
    },
    Placeholder {
        rect: ResolvedBox,
        label: String,
    },
}

impl Element {
    pub fn rect(&self) -> &ResolvedBox {
        match self {
            Element::Fill { rect, .. }
            | Element::Gradient { rect, .. }
            | Element::Text { rect, .. }
            | Element::Image { rect, .. }
            | Element::Link { rect, .. }
            | Element::Spacer { rect }
            | Element::MapWidget { rect, .. }
            | Element::Video { rect, .. }
            | Element::Placeholder { rect, .. } => rect,
        }
    }

    /// Content that changes over time and must be frozen before capture.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Element::MapWidget { .. } | Element::Video { .. })
    }
}

/// One rendered section
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionNode {
    pub id: String,
    pub section_type: SectionType,
    #[serde(rename = "box")]
    pub bx: ResolvedBox,
    pub elements: Vec<Element>,
}

/// Global theme painted behind all sections
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Backdrop {
    pub color: String,
    pub gradient: Option<GradientStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutTree {
    pub width: u32,
    pub height: u32,
    pub backdrop: Backdrop,
    /// Sections in paint order
    pub sections: Vec<SectionNode>,
}

impl LayoutTree {
    pub fn section(&self, id: &str) -> Option<&SectionNode> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// `(id, box)` for every rendered section, in paint order.
    pub fn section_boxes(&self) -> Vec<(&str, ResolvedBox)> {
        self.sections.iter().map(|s| (s.id.as_str(), s.bx)).collect()
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.sections.iter().flat_map(|s| s.elements.iter())
    }
}

/// Render with the standard registry and no live overrides.
pub fn render(config: &CondensedCardConfig, profile: &ProfileData) -> LayoutTree {
    render_with(config, profile, &SectionRegistry::standard(), &LiveOverrides::new())
}

pub fn render_with(
    config: &CondensedCardConfig,
    profile: &ProfileData,
    registry: &SectionRegistry,
    overrides: &LiveOverrides,
) -> LayoutTree {
    let mut sections = Vec::new();
    for resolved in resolve_layout(config) {
        let section = resolved.section;
        let Some(renderer) = registry.get(section.section_type) else {
            warn!("no renderer registered for `{}`; skipping section {}", section.section_type, section.id);
            continue;
        };

        let props_bag = match overrides.get(&section.id) {
            Some(live) => merge_props(&section.props, live),
            None => section.props.clone(),
        };
        let props = SectionProps::decode(section.section_type, &props_bag).unwrap_or_else(|e| {
            warn!("section {}: unreadable props ({}); using defaults", section.id, e);
            SectionProps::default_for(section.section_type)
        });

        let mut elements = Vec::new();
        if let Some(color) = props_bag.get("backgroundColor").and_then(Value::as_str) {
            elements.push(Element::Fill { rect: resolved.bx, color: color.to_string() });
        }
        let ctx = SectionContext {
            id: &section.id,
            bx: resolved.bx,
            profile,
            styles: &config.styles,
            objects: section.objects(),
        };
        elements.extend(renderer.render(&props, &ctx));

        sections.push(SectionNode {
            id: section.id.clone(),
            section_type: section.section_type,
            bx: resolved.bx,
            elements,
        });
    }

    LayoutTree {
        width: config.dimensions.width,
        height: config.dimensions.height,
        backdrop: Backdrop {
            color: config.styles.background_color.clone(),
            gradient: config.styles.gradient.clone(),
        },
        sections,
    }
}
