//! Strongly typed section props
//!
//! The persisted prop bag is free-form JSON. At render time it is decoded
//! into the variant matching the section's `sectionType`; missing keys fall
//! back to the per-kind defaults below and unknown keys are ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::merge::overlay_objects;
use crate::config::model::SectionType;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderProps {
    pub show_avatar: bool,
    pub title_override: Option<String>,
    pub subtitle: Option<String>,
    pub align: TextAlign,
    pub font_size: f64,
}

impl Default for HeaderProps {
    fn default() -> Self {
        Self { show_avatar: true, title_override: None, subtitle: None, align: TextAlign::Center, font_size: 48.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BioProps {
    pub show_heading: bool,
    pub heading: String,
    pub max_lines: u32,
    pub font_size: f64,
}

impl Default for BioProps {
    fn default() -> Self {
        Self { show_heading: true, heading: "About".to_string(), max_lines: 6, font_size: 24.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactProps {
    pub show_phone: bool,
    pub show_email: bool,
    pub show_website: bool,
    pub font_size: f64,
}

impl Default for ContactProps {
    fn default() -> Self {
        Self { show_phone: true, show_email: true, show_website: true, font_size: 24.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapProps {
    pub zoom: u8,
    pub location_index: usize,
    pub show_address: bool,
}

impl Default for MapProps {
    fn default() -> Self {
        Self { zoom: 14, location_index: 0, show_address: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GalleryProps {
    pub columns: u32,
    pub max_images: u32,
    pub gap: f64,
}

impl Default for GalleryProps {
    fn default() -> Self {
        Self { columns: 3, max_images: 6, gap: 8.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct PromotionsProps {
    pub headline: String,
    pub body: String,
    pub cta_label: Option<String>,
    pub cta_url: Option<String>,
    pub badge_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HoursProps {
    pub compact: bool,
    pub font_size: f64,
}

impl Default for HoursProps {
    fn default() -> Self {
        Self { compact: false, font_size: 22.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SocialProps {
    pub icon_size: f64,
    pub gap: f64,
}

impl Default for SocialProps {
    fn default() -> Self {
        Self { icon_size: 48.0, gap: 16.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoProps {
    pub url: String,
    pub poster_url: Option<String>,
    pub autoplay: bool,
    pub muted: bool,
}

impl Default for VideoProps {
    fn default() -> Self {
        Self { url: String::new(), poster_url: None, autoplay: true, muted: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomProps {
    pub background_color: Option<String>,
}

/// Decoded prop bag, one variant per `SectionType`
#[derive(Debug, Clone, PartialEq)]
pub enum SectionProps {
    Header(HeaderProps),
    Bio(BioProps),
    Contact(ContactProps),
    Map(MapProps),
    Gallery(GalleryProps),
    Promotions(PromotionsProps),
    Hours(HoursProps),
    Social(SocialProps),
    Video(VideoProps),
    Custom(CustomProps),
}

impl SectionProps {
    pub fn default_for(kind: SectionType) -> Self {
        match kind {
            SectionType::Header => SectionProps::Header(HeaderProps::default()),
            SectionType::Bio => SectionProps::Bio(BioProps::default()),
            SectionType::Contact => SectionProps::Contact(ContactProps::default()),
            SectionType::Map => SectionProps::Map(MapProps::default()),
            SectionType::Gallery => SectionProps::Gallery(GalleryProps::default()),
            SectionType::Promotions => SectionProps::Promotions(PromotionsProps::default()),
            SectionType::Hours => SectionProps::Hours(HoursProps::default()),
            SectionType::Social => SectionProps::Social(SocialProps::default()),
            SectionType::Video => SectionProps::Video(VideoProps::default()),
            SectionType::Custom => SectionProps::Custom(CustomProps::default()),
        }
    }

    /// Decode a persisted prop bag for `kind`.
    pub fn decode(kind: SectionType, props: &Map<String, Value>) -> Result<Self> {
        let raw = Value::Object(props.clone());
        let decoded = match kind {
            SectionType::Header => SectionProps::Header(serde_json::from_value(raw)?),
            SectionType::Bio => SectionProps::Bio(serde_json::from_value(raw)?),
            SectionType::Contact => SectionProps::Contact(serde_json::from_value(raw)?),
            SectionType::Map => SectionProps::Map(serde_json::from_value(raw)?),
            SectionType::Gallery => SectionProps::Gallery(serde_json::from_value(raw)?),
            SectionType::Promotions => SectionProps::Promotions(serde_json::from_value(raw)?),
            SectionType::Hours => SectionProps::Hours(serde_json::from_value(raw)?),
            SectionType::Social => SectionProps::Social(serde_json::from_value(raw)?),
            SectionType::Video => SectionProps::Video(serde_json::from_value(raw)?),
            SectionType::Custom => SectionProps::Custom(serde_json::from_value(raw)?),
        };
        Ok(decoded)
    }

    pub fn kind(&self) -> SectionType {
        match self {
            SectionProps::Header(_) => SectionType::Header,
            SectionProps::Bio(_) => SectionType::Bio,
            SectionProps::Contact(_) => SectionType::Contact,
            SectionProps::Map(_) => SectionType::Map,
            SectionProps::Gallery(_) => SectionType::Gallery,
            SectionProps::Promotions(_) => SectionType::Promotions,
            SectionProps::Hours(_) => SectionType::Hours,
            SectionProps::Social(_) => SectionType::Social,
            SectionProps::Video(_) => SectionType::Video,
            SectionProps::Custom(_) => SectionType::Custom,
        }
    }

    /// Encode back to a persisted prop bag.
    pub fn to_map(&self) -> Map<String, Value> {
        let value = match self {
            SectionProps::Header(p) => serde_json::to_value(p),
            SectionProps::Bio(p) => serde_json::to_value(p),
            SectionProps::Contact(p) => serde_json::to_value(p),
            SectionProps::Map(p) => serde_json::to_value(p),
            SectionProps::Gallery(p) => serde_json::to_value(p),
            SectionProps::Promotions(p) => serde_json::to_value(p),
            SectionProps::Hours(p) => serde_json::to_value(p),
            SectionProps::Social(p) => serde_json::to_value(p),
            SectionProps::Video(p) => serde_json::to_value(p),
            SectionProps::Custom(p) => serde_json::to_value(p),
        };
        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Merge live override props over a section's static props.
///
/// Precedence: a key present in `live` wins over the same key in
/// `static_props`; nested objects merge key by key with the same rule; a
/// `null` in `live` leaves the static value in place. Called once per render
/// pass, never accumulated into the persisted config.
pub fn merge_props(static_props: &Map<String, Value>, live: &Map<String, Value>) -> Map<String, Value> {
    overlay_objects(static_props, live)
}
