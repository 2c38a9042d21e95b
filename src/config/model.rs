//! Persisted card configuration types
//!
//! Everything here serializes to the camelCase JSON shape the persistence
//! collaborator stores. Positions are expressed per axis as a value plus a
//! unit; percentages are always relative to the card's single canvas.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Unit attached to a `DimensionValue`
///
/// Unknown unit strings survive a load/save cycle untouched so a bad value
/// can be fixed by an editor instead of being silently rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DimensionUnit {
    Percent,
    Pixel,
    Unknown(String),
}

impl DimensionUnit {
    /// Parse a unit string, accepting the aliases older editors wrote.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "percent" | "percentage" | "%" | "pct" => DimensionUnit::Percent,
            "pixel" | "pixels" | "px" => DimensionUnit::Pixel,
            _ => DimensionUnit::Unknown(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DimensionUnit::Percent => "percent",
            DimensionUnit::Pixel => "pixel",
            DimensionUnit::Unknown(s) => s.as_str(),
        }
    }
}

impl Serialize for DimensionUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DimensionUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(DimensionUnit::parse(&raw))
    }
}

/// One axis of a section placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionValue {
    pub value: f64,
    pub unit: DimensionUnit,
}

impl DimensionValue {
    pub fn percent(value: f64) -> Self {
        Self { value, unit: DimensionUnit::Percent }
    }

    pub fn pixels(value: f64) -> Self {
        Self { value, unit: DimensionUnit::Pixel }
    }

    /// A value is drawable when it is finite, non-negative and carries a known unit.
    pub fn is_valid(&self) -> bool {
        self.value.is_finite() && self.value >= 0.0 && !matches!(self.unit, DimensionUnit::Unknown(_))
    }
}

/// Placement of a section on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionConfig {
    pub x: DimensionValue,
    pub y: DimensionValue,
    pub width: DimensionValue,
    pub height: DimensionValue,
    pub visible: bool,
    /// Paint order among sections; ties keep list order
    #[serde(default, skip_serializing_if = "is_zero")]
    pub z_index: i32,
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

/// Height given to a section placed without an explicit height.
pub const DEFAULT_SECTION_HEIGHT_PERCENT: f64 = 20.0;

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            x: DimensionValue::percent(0.0),
            y: DimensionValue::percent(0.0),
            width: DimensionValue::percent(100.0),
            height: DimensionValue::percent(DEFAULT_SECTION_HEIGHT_PERCENT),
            visible: true,
            z_index: 0,
        }
    }
}

impl PositionConfig {
    /// Full-width band starting at `top_percent`.
    pub fn band(top_percent: f64, height_percent: f64) -> Self {
        Self {
            y: DimensionValue::percent(top_percent),
            height: DimensionValue::percent(height_percent),
            ..Self::default()
        }
    }
}

/// Closed set of canvas sizes an admin can pick from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionPreset {
    /// 4:5 portrait card, the default
    Card,
    Square,
    Story,
    Landscape,
    Custom,
}

impl DimensionPreset {
    pub const ALL: [DimensionPreset; 5] = [
        DimensionPreset::Card,
        DimensionPreset::Square,
        DimensionPreset::Story,
        DimensionPreset::Landscape,
        DimensionPreset::Custom,
    ];

    /// Pixel size of the preset; `None` for `Custom`.
    pub fn size(self) -> Option<(u32, u32)> {
        match self {
            DimensionPreset::Card => Some((1080, 1350)),
            DimensionPreset::Square => Some((1080, 1080)),
            DimensionPreset::Story => Some((1080, 1920)),
            DimensionPreset::Landscape => Some((1200, 628)),
            DimensionPreset::Custom => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DimensionPreset::Card => "card",
            DimensionPreset::Square => "square",
            DimensionPreset::Story => "story",
            DimensionPreset::Landscape => "landscape",
            DimensionPreset::Custom => "custom",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL.iter().copied().find(|p| p.as_str() == name)
    }

    /// The preset whose size is exactly `width`×`height`, else `Custom`.
    pub fn matching(width: u32, height: u32) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.size() == Some((width, height)))
            .unwrap_or(DimensionPreset::Custom)
    }
}

/// Canvas size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CondensedCardDimensions {
    pub preset: DimensionPreset,
    pub width: u32,
    pub height: u32,
}

impl CondensedCardDimensions {
    pub fn from_preset(preset: DimensionPreset) -> Self {
        let (width, height) = preset.size().unwrap_or((1080, 1350));
        Self { preset, width, height }
    }

    pub fn custom(width: u32, height: u32) -> Self {
        Self { preset: DimensionPreset::matching(width, height), width, height }
    }
}

impl Default for CondensedCardDimensions {
    fn default() -> Self {
        Self::from_preset(DimensionPreset::Card)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub color: String,
    /// Position along the gradient line, 0.0..=1.0
    pub offset: f64,
}

/// Linear gradient; `angle` in degrees, 0 = bottom-to-top, 90 = left-to-right
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStyle {
    pub angle: f64,
    pub stops: Vec<GradientStop>,
}

impl GradientStyle {
    pub fn two_stop(angle: f64, from: &str, to: &str) -> Self {
        Self {
            angle,
            stops: vec![
                GradientStop { color: from.to_string(), offset: 0.0 },
                GradientStop { color: to.to_string(), offset: 1.0 },
            ],
        }
    }
}

/// Global theme painted behind every section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CondensedCardStyles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<GradientStyle>,
    pub background_color: String,
    pub text_color: String,
    pub accent_color: String,
    pub font_family: String,
}

/// Closed registry of section kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Header,
    Bio,
    Contact,
    Map,
    Gallery,
    Promotions,
    Hours,
    Social,
    Video,
    Custom,
}

impl SectionType {
    pub const ALL: [SectionType; 10] = [
        SectionType::Header,
        SectionType::Bio,
        SectionType::Contact,
        SectionType::Map,
        SectionType::Gallery,
        SectionType::Promotions,
        SectionType::Hours,
        SectionType::Social,
        SectionType::Video,
        SectionType::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionType::Header => "header",
            SectionType::Bio => "bio",
            SectionType::Contact => "contact",
            SectionType::Map => "map",
            SectionType::Gallery => "gallery",
            SectionType::Promotions => "promotions",
            SectionType::Hours => "hours",
            SectionType::Social => "social",
            SectionType::Video => "video",
            SectionType::Custom => "custom",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionType {
    type Err = Error;

    /// Accepts the canonical names case-insensitively plus the names older
    /// editors persisted (`about`, `location`, `promotion`, ...).
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        let kind = match normalized.as_str() {
            "header" | "hero" => SectionType::Header,
            "bio" | "about" => SectionType::Bio,
            "contact" | "contactinfo" => SectionType::Contact,
            "map" | "location" | "locations" => SectionType::Map,
            "gallery" | "photos" => SectionType::Gallery,
            "promotions" | "promotion" | "promo" => SectionType::Promotions,
            "hours" | "businesshours" => SectionType::Hours,
            "social" | "sociallinks" => SectionType::Social,
            "video" => SectionType::Video,
            "custom" => SectionType::Custom,
            _ => return Err(Error::UnknownSectionType(s.to_string())),
        };
        Ok(kind)
    }
}

/// Placement of a custom object inside its section, in pixels relative to
/// the section's top-left corner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectFrame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub z_index: i32,
}

fn default_object_font_size() -> f64 {
    24.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextObject {
    #[serde(flatten)]
    pub frame: ObjectFrame,
    pub text: String,
    #[serde(default = "default_object_font_size")]
    pub font_size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageObject {
    #[serde(flatten)]
    pub frame: ObjectFrame,
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkObject {
    #[serde(flatten)]
    pub frame: ObjectFrame,
    pub label: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacerObject {
    #[serde(flatten)]
    pub frame: ObjectFrame,
}

/// Free-placed object inside a `custom` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CustomObject {
    Text(TextObject),
    Image(ImageObject),
    Link(LinkObject),
    Spacer(SpacerObject),
}

impl CustomObject {
    pub fn frame(&self) -> &ObjectFrame {
        match self {
            CustomObject::Text(o) => &o.frame,
            CustomObject::Image(o) => &o.frame,
            CustomObject::Link(o) => &o.frame,
            CustomObject::Spacer(o) => &o.frame,
        }
    }

    pub fn z_index(&self) -> i32 {
        self.frame().z_index
    }
}

/// Objects in paint order: ascending `zIndex`, insertion order on ties.
pub fn paint_order(objects: &[CustomObject]) -> Vec<&CustomObject> {
    let mut ordered: Vec<&CustomObject> = objects.iter().collect();
    ordered.sort_by_key(|o| o.z_index());
    ordered
}

/// One placed section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CondensedCardSectionInstance {
    pub id: String,
    pub section_type: SectionType,
    pub position: PositionConfig,
    #[serde(default)]
    pub props: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_objects: Option<Vec<CustomObject>>,
}

impl CondensedCardSectionInstance {
    pub fn new(id: impl Into<String>, section_type: SectionType, position: PositionConfig) -> Self {
        Self {
            id: id.into(),
            section_type,
            position,
            props: Map::new(),
            layout_objects: None,
        }
    }

    pub fn with_props(mut self, props: Map<String, Value>) -> Self {
        self.props = props;
        self
    }

    pub fn with_objects(mut self, objects: Vec<CustomObject>) -> Self {
        self.layout_objects = Some(objects);
        self
    }

    pub fn is_visible(&self) -> bool {
        self.position.visible
    }

    pub fn objects(&self) -> &[CustomObject] {
        self.layout_objects.as_deref().unwrap_or(&[])
    }
}

/// The canonical card configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondensedCardConfig {
    pub dimensions: CondensedCardDimensions,
    pub styles: CondensedCardStyles,
    pub sections: Vec<CondensedCardSectionInstance>,
}

impl CondensedCardConfig {
    pub fn section(&self, id: &str) -> Option<&CondensedCardSectionInstance> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn visible_sections(&self) -> impl Iterator<Item = &CondensedCardSectionInstance> {
        self.sections.iter().filter(|s| s.is_visible())
    }

    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
