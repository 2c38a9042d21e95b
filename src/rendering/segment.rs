//! Flow segmentation of the absolute canvas
//!
//! Contexts that cannot position sections absolutely (narrow screens,
//! documents) consume the card as a sequence of horizontal bands: a band is
//! either one full-width section or a two-column group.

use serde::{Deserialize, Serialize};

use super::position::ResolvedBox;
use super::resolve_layout;
use crate::config::model::{CondensedCardConfig, SectionType};

/// Width, as a fraction of canvas width, at or above which a section spans
/// both columns.
pub const FULL_WIDTH_RATIO: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SegmentationOptions {
    pub full_width_ratio: f64,
}

impl Default for SegmentationOptions {
    fn default() -> Self {
        Self { full_width_ratio: FULL_WIDTH_RATIO }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Left,
    Right,
    Full,
}

impl Column {
    /// Classify a resolved box against a canvas of `canvas_width` pixels.
    pub fn classify(bx: &ResolvedBox, canvas_width: f64, full_width_ratio: f64) -> Self {
        if bx.width >= full_width_ratio * canvas_width {
            Column::Full
        } else if bx.center_x() < canvas_width / 2.0 {
            Column::Left
        } else {
            Column::Right
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentedSection {
    pub id: String,
    pub section_type: SectionType,
    pub column: Column,
    #[serde(rename = "box")]
    pub bx: ResolvedBox,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Segment {
    Full(SegmentedSection),
    /// Sections in sort order; each is tagged `Left` or `Right`. Either
    /// column may be empty, never both.
    TwoColumn { sections: Vec<SegmentedSection> },
}

impl Segment {
    pub fn sections(&self) -> &[SegmentedSection] {
        match self {
            Segment::Full(s) => std::slice::from_ref(s),
            Segment::TwoColumn { sections } => sections,
        }
    }

    pub fn left(&self) -> impl Iterator<Item = &SegmentedSection> {
        self.in_column(Column::Left)
    }

    pub fn right(&self) -> impl Iterator<Item = &SegmentedSection> {
        self.in_column(Column::Right)
    }

    fn in_column(&self, column: Column) -> impl Iterator<Item = &SegmentedSection> {
        self.sections().iter().filter(move |s| s.column == column)
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Segment::Full(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct LayoutStructure {
    pub segments: Vec<Segment>,
}

impl LayoutStructure {
    /// All sections in emission order; equals the `(top, id)` sort order.
    pub fn flatten(&self) -> impl Iterator<Item = &SegmentedSection> {
        self.segments.iter().flat_map(|s| s.sections().iter())
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

pub fn segment(config: &CondensedCardConfig) -> LayoutStructure {
    segment_with(config, &SegmentationOptions::default())
}

pub fn segment_with(config: &CondensedCardConfig, options: &SegmentationOptions) -> LayoutStructure {
    let canvas_width = config.dimensions.width as f64;
    let mut ordered: Vec<SegmentedSection> = resolve_layout(config)
        .into_iter()
        .map(|r| SegmentedSection {
            id: r.section.id.clone(),
            section_type: r.section.section_type,
            column: Column::classify(&r.bx, canvas_width, options.full_width_ratio),
            bx: r.bx,
        })
        .collect();
    ordered.sort_by(|a, b| a.bx.top.total_cmp(&b.bx.top).then_with(|| a.id.cmp(&b.id)));

    let mut segments = Vec::new();
    let mut pending: Vec<SegmentedSection> = Vec::new();
    for section in ordered {
        if section.column == Column::Full {
            if !pending.is_empty() {
                segments.push(Segment::TwoColumn { sections: std::mem::take(&mut pending) });
            }
            segments.push(Segment::Full(section));
        } else {
            pending.push(section);
        }
    }
    if !pending.is_empty() {
        segments.push(Segment::TwoColumn { sections: pending });
    }

    LayoutStructure { segments }
}
