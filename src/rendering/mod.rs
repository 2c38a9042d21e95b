//! Rendering: geometry, layout tree, segmentation, paint and raster
//!
//! `resolve_layout` is the shared read path. The interactive view, the
//! export view and the flow segmentation all start from it, so section
//! geometry cannot diverge between consumers.

pub mod layout;
pub mod paint;
pub mod position;
pub mod raster;
pub mod segment;
pub mod tree;
pub mod view;

use crate::config::model::{CondensedCardConfig, CondensedCardSectionInstance};
pub use position::{resolve, ResolvedBox};

/// A visible section together with its resolved box
#[derive(Debug, Clone, Copy)]
pub struct ResolvedSection<'a> {
    pub section: &'a CondensedCardSectionInstance,
    pub bx: ResolvedBox,
}

/// Resolve every visible section, in paint order (ascending `zIndex`,
/// list order on ties).
pub fn resolve_layout(config: &CondensedCardConfig) -> Vec<ResolvedSection<'_>> {
    let mut resolved: Vec<ResolvedSection<'_>> = config
        .visible_sections()
        .map(|section| ResolvedSection { section, bx: resolve(&section.position, &config.dimensions) })
        .collect();
    resolved.sort_by_key(|r| r.section.position.z_index);
    resolved
}
