//! The two consumers of a layout tree
//!
//! The interactive view decorates the tree for editing; the export view
//! hands it to the capture pipeline untouched. Both build the tree through
//! `render_with`, which is what keeps their geometry identical.

use serde::Serialize;

use super::position::ResolvedBox;
use super::tree::{render_with, LayoutTree, LiveOverrides};
use crate::config::model::CondensedCardConfig;
use crate::sections::{ProfileData, SectionRegistry};

/// Size of the square drag handle in the top-right corner of a selection
pub const DRAG_HANDLE_SIZE: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DecorationKind {
    Outline,
    DragHandle,
    Hover,
}

/// Editor chrome painted above a section. Never feeds back into layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decoration {
    pub section_id: String,
    pub kind: DecorationKind,
    pub rect: ResolvedBox,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractiveScene {
    pub tree: LayoutTree,
    pub decorations: Vec<Decoration>,
}

/// Build the editing view: the layout tree plus selection and hover chrome.
pub fn interactive_view(
    config: &CondensedCardConfig,
    profile: &ProfileData,
    registry: &SectionRegistry,
    overrides: &LiveOverrides,
    selected: Option<&str>,
    hovered: Option<&str>,
) -> InteractiveScene {
    let tree = render_with(config, profile, registry, overrides);
    let mut decorations = Vec::new();

    if let Some(node) = hovered.filter(|h| Some(*h) != selected).and_then(|id| tree.section(id)) {
        decorations.push(Decoration { section_id: node.id.clone(), kind: DecorationKind::Hover, rect: node.bx });
    }
    if let Some(node) = selected.and_then(|id| tree.section(id)) {
        decorations.push(Decoration { section_id: node.id.clone(), kind: DecorationKind::Outline, rect: node.bx });
        let size = DRAG_HANDLE_SIZE.min(node.bx.width).min(node.bx.height);
        decorations.push(Decoration {
            section_id: node.id.clone(),
            kind: DecorationKind::DragHandle,
            rect: ResolvedBox::new(node.bx.right() - size, node.bx.top, size, size),
        });
    }

    InteractiveScene { tree, decorations }
}

/// Build the tree the export pipeline captures.
pub fn export_view(
    config: &CondensedCardConfig,
    profile: &ProfileData,
    registry: &SectionRegistry,
    overrides: &LiveOverrides,
) -> LayoutTree {
    render_with(config, profile, registry, overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{CondensedCardSectionInstance, PositionConfig, SectionType};

    fn config() -> CondensedCardConfig {
        let mut cfg = CondensedCardConfig::default();
        cfg.sections.push(CondensedCardSectionInstance::new("h", SectionType::Header, PositionConfig::band(0.0, 25.0)));
        cfg.sections.push(CondensedCardSectionInstance::new("b", SectionType::Bio, PositionConfig::band(25.0, 25.0)));
        cfg
    }

    #[test]
    fn decorations_do_not_move_sections() {
        let cfg = config();
        let profile = ProfileData::default();
        let registry = SectionRegistry::standard();
        let overrides = LiveOverrides::new();

        let scene = interactive_view(&cfg, &profile, &registry, &overrides, Some("b"), Some("h"));
        let exported = export_view(&cfg, &profile, &registry, &overrides);
        assert_eq!(scene.tree, exported);
        assert_eq!(scene.decorations.len(), 3);
        assert_eq!(scene.decorations[0].kind, DecorationKind::Hover);
    }

    #[test]
    fn hovering_the_selection_adds_no_hover() {
        let cfg = config();
        let scene = interactive_view(
            &cfg,
            &ProfileData::default(),
            &SectionRegistry::standard(),
            &LiveOverrides::new(),
            Some("h"),
            Some("h"),
        );
        assert!(scene.decorations.iter().all(|d| d.kind != DecorationKind::Hover));
    }

    #[test]
    fn unknown_selection_is_ignored() {
        let cfg = config();
        let scene = interactive_view(
            &cfg,
            &ProfileData::default(),
            &SectionRegistry::standard(),
            &LiveOverrides::new(),
            Some("missing"),
            None,
        );
        assert!(scene.decorations.is_empty());
    }
}
