//! Section renderer trait and the registry both views dispatch through

use std::collections::BTreeMap;

use super::profile::ProfileData;
use super::props::SectionProps;
use super::renderers;
use crate::config::model::{CondensedCardStyles, CustomObject, SectionType};
use crate::rendering::position::ResolvedBox;
use crate::rendering::tree::Element;

/// Everything a renderer may read besides its own props
pub struct SectionContext<'a> {
    pub id: &'a str,
    /// Resolved box of the section; renderers must stay inside it
    pub bx: ResolvedBox,
    pub profile: &'a ProfileData,
    pub styles: &'a CondensedCardStyles,
    pub objects: &'a [CustomObject],
}

/// One implementation per section kind.
///
/// Renderers only place content inside `ctx.bx`; they never compute the
/// section's own geometry.
pub trait SectionRenderer: Send + Sync {
    fn kind(&self) -> SectionType;
    fn render(&self, props: &SectionProps, ctx: &SectionContext<'_>) -> Vec<Element>;
}

/// Renderers indexed by `SectionType`
pub struct SectionRegistry {
    renderers: BTreeMap<SectionType, Box<dyn SectionRenderer>>,
}

impl SectionRegistry {
    pub fn empty() -> Self {
        Self { renderers: BTreeMap::new() }
    }

    /// Registry with a renderer for every known kind.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(renderers::HeaderRenderer));
        registry.register(Box::new(renderers::BioRenderer));
        registry.register(Box::new(renderers::ContactRenderer));
        registry.register(Box::new(renderers::MapRenderer));
        registry.register(Box::new(renderers::GalleryRenderer));
        registry.register(Box::new(renderers::PromotionsRenderer));
        registry.register(Box::new(renderers::HoursRenderer));
        registry.register(Box::new(renderers::SocialRenderer));
        registry.register(Box::new(renderers::VideoRenderer));
        registry.register(Box::new(renderers::CustomRenderer));
        registry
    }

    /// Register (or replace) the renderer for its kind.
    pub fn register(&mut self, renderer: Box<dyn SectionRenderer>) {
        self.renderers.insert(renderer.kind(), renderer);
    }

    pub fn unregister(&mut self, kind: SectionType) -> Option<Box<dyn SectionRenderer>> {
        self.renderers.remove(&kind)
    }

    pub fn get(&self, kind: SectionType) -> Option<&dyn SectionRenderer> {
        self.renderers.get(&kind).map(|r| r.as_ref())
    }

    pub fn kinds(&self) -> impl Iterator<Item = SectionType> + '_ {
        self.renderers.keys().copied()
    }
}

impl Default for SectionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
