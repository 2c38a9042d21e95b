//! Card Layout Engine
//!
//! A position-based layout model for digital business cards, with two
//! consumers that must agree on geometry: an interactive editing view and an
//! offline image export.
//!
//! # Features
//!
//! - **Migration**: any previously persisted shape is upgraded on load
//! - **Merge**: partial configs are completed from defaults without
//!   overwriting anything explicitly set
//! - **Render parity**: both views resolve geometry through one entry point
//! - **Export**: cancellable, last-request-wins capture to PNG
//!
//! # Example
//!
//! ```no_run
//! use cardlayout::{migrate, render, segment, ProfileData};
//! use serde_json::json;
//!
//! let config = migrate(&json!({ "sections": ["header", "bio", "contact"] }));
//! let profile = ProfileData { name: "Dana Reyes".into(), ..Default::default() };
//!
//! let tree = render(&config, &profile);
//! assert_eq!(tree.sections.len(), 3);
//!
//! let flow = segment(&config);
//! assert_eq!(flow.segments.len(), 3);
//! ```

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub mod export;
pub mod rendering;
pub mod sections;

pub use config::model::{
    CondensedCardConfig, CondensedCardDimensions, CondensedCardSectionInstance, CondensedCardStyles, CustomObject,
    DimensionPreset, DimensionUnit, DimensionValue, PositionConfig, SectionType,
};
pub use config::{merge_with, merge_with_defaults, migrate, migrate_str, PartialCardConfig};
pub use export::{CardExporter, ExportArtifact, ExportOptions, ExportPhase, ExportProgress};
pub use rendering::segment::{segment, segment_with, LayoutStructure, Segment, SegmentationOptions};
pub use rendering::tree::{render, render_with, Element, LayoutTree, LiveOverrides};
pub use rendering::view::{export_view, interactive_view, InteractiveScene};
pub use rendering::{resolve, resolve_layout, ResolvedBox};
pub use sections::{ProfileData, SectionProps, SectionRegistry, SectionRenderer};

/// Engine-wide tunables, loadable from a partial JSON document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub segmentation: SegmentationOptions,
    pub export: ExportOptions,
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.segmentation.full_width_ratio, rendering::segment::FULL_WIDTH_RATIO);
        assert_eq!(config.export.pixel_ratio, 1.0);
    }

    #[test]
    fn engine_config_from_partial_json() {
        let config = EngineConfig::from_json_str(r#"{"export": {"pixelRatio": 2}}"#).unwrap();
        assert_eq!(config.export.pixel_ratio, 2.0);
        assert_eq!(config.segmentation, SegmentationOptions::default());
        assert!(EngineConfig::from_json_str("[").is_err());
    }
}
