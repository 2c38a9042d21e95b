//! Canonical configuration store, editor operations and persistence seam
//!
//! Editor operations are pure functions from one config to the next; the
//! store swaps in the result as a whole. Readers take an `Arc` snapshot and
//! never observe a config halfway through a mutation.

use log::{debug, info};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use super::migrate::migrate;
use super::model::{
    CondensedCardConfig, CondensedCardDimensions, CondensedCardSectionInstance, DimensionUnit, DimensionValue,
    PositionConfig, SectionType,
};
use crate::{Error, Result};

/// Smallest unused `<type>-<n>` id.
pub fn next_section_id(config: &CondensedCardConfig, kind: SectionType) -> String {
    let mut n = 1u32;
    loop {
        let candidate = format!("{}-{}", kind, n);
        if config.section(&candidate).is_none() {
            return candidate;
        }
        n += 1;
    }
}

pub fn add_section(config: &CondensedCardConfig, section: CondensedCardSectionInstance) -> Result<CondensedCardConfig> {
    if config.section(&section.id).is_some() {
        return Err(Error::DuplicateSection(section.id));
    }
    let mut next = config.clone();
    next.sections.push(section);
    Ok(next)
}

/// Replace the section with `id` by `f(section)`. The id may not change.
pub fn update_section<F>(config: &CondensedCardConfig, id: &str, f: F) -> Result<CondensedCardConfig>
where
    F: FnOnce(CondensedCardSectionInstance) -> CondensedCardSectionInstance,
{
    let index = index_of(config, id)?;
    let mut next = config.clone();
    let updated = f(next.sections[index].clone());
    if updated.id != id {
        return Err(Error::ConfigError(format!("section id `{}` cannot be changed to `{}`", id, updated.id)));
    }
    next.sections[index] = updated;
    Ok(next)
}

pub fn remove_section(config: &CondensedCardConfig, id: &str) -> Result<CondensedCardConfig> {
    let index = index_of(config, id)?;
    let mut next = config.clone();
    next.sections.remove(index);
    Ok(next)
}

/// Reorder sections to match `order`, which must name every section once.
pub fn reorder_sections(config: &CondensedCardConfig, order: &[&str]) -> Result<CondensedCardConfig> {
    if order.len() != config.sections.len() {
        return Err(Error::ConfigError(format!(
            "reorder names {} sections but the card has {}",
            order.len(),
            config.sections.len()
        )));
    }
    let mut by_id: HashMap<&str, &CondensedCardSectionInstance> =
        config.sections.iter().map(|s| (s.id.as_str(), s)).collect();
    let mut sections = Vec::with_capacity(order.len());
    for id in order {
        let section = by_id.remove(id).ok_or_else(|| Error::SectionNotFound(id.to_string()))?;
        sections.push(section.clone());
    }
    Ok(CondensedCardConfig { sections, ..config.clone() })
}

/// Non-destructive show/hide toggle.
pub fn set_visibility(config: &CondensedCardConfig, id: &str, visible: bool) -> Result<CondensedCardConfig> {
    update_section(config, id, |mut s| {
        s.position.visible = visible;
        s
    })
}

/// Re-express every pixel position as a percentage of the current canvas,
/// so a later dimension change keeps the relative layout.
pub fn rescale_to_percent(config: &CondensedCardConfig) -> CondensedCardConfig {
    let canvas = config.dimensions;
    let to_percent = |v: &DimensionValue, axis: u32| -> DimensionValue {
        match v.unit {
            DimensionUnit::Pixel if axis > 0 => DimensionValue::percent(v.value / axis as f64 * 100.0),
            _ => v.clone(),
        }
    };
    let mut next = config.clone();
    for section in &mut next.sections {
        let p = &section.position;
        section.position = PositionConfig {
            x: to_percent(&p.x, canvas.width),
            y: to_percent(&p.y, canvas.height),
            width: to_percent(&p.width, canvas.width),
            height: to_percent(&p.height, canvas.height),
            ..p.clone()
        };
    }
    next
}

/// Change the canvas size; pass `keep_relative` to rescale pixel positions first.
pub fn set_dimensions(
    config: &CondensedCardConfig,
    dimensions: CondensedCardDimensions,
    keep_relative: bool,
) -> CondensedCardConfig {
    let mut next = if keep_relative { rescale_to_percent(config) } else { config.clone() };
    next.dimensions = dimensions;
    next
}

fn index_of(config: &CondensedCardConfig, id: &str) -> Result<usize> {
    config
        .sections
        .iter()
        .position(|s| s.id == id)
        .ok_or_else(|| Error::SectionNotFound(id.to_string()))
}

/// Single-writer holder of the in-memory canonical config
pub struct CardStore {
    current: RwLock<Arc<CondensedCardConfig>>,
}

impl CardStore {
    pub fn new(config: CondensedCardConfig) -> Self {
        Self { current: RwLock::new(Arc::new(config)) }
    }

    /// Immutable snapshot shared by the interactive view and the exporter.
    pub fn snapshot(&self) -> Arc<CondensedCardConfig> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Apply an editor operation and swap in its result as a whole.
    /// On error the stored config is unchanged.
    pub fn apply<F>(&self, op: F) -> Result<Arc<CondensedCardConfig>>
    where
        F: FnOnce(&CondensedCardConfig) -> Result<CondensedCardConfig>,
    {
        let mut guard = self
            .current
            .write()
            .map_err(|_| Error::Other("card store lock poisoned".into()))?;
        let next = Arc::new(op(guard.as_ref())?);
        *guard = next.clone();
        debug!("card store updated: {} sections", next.sections.len());
        Ok(next)
    }

    pub fn replace(&self, config: CondensedCardConfig) -> Result<Arc<CondensedCardConfig>> {
        self.apply(move |_| Ok(config))
    }
}

impl Default for CardStore {
    fn default() -> Self {
        Self::new(CondensedCardConfig::default())
    }
}

/// Persistence collaborator, keyed by the owning professional's id
pub trait ConfigRepository: Send + Sync {
    fn load(&self, professional_id: &str) -> Result<Option<Value>>;
    fn save(&self, professional_id: &str, config: &Value) -> Result<()>;
}

/// In-memory repository used by tests and the CLI
#[derive(Default)]
pub struct InMemoryRepository {
    entries: Mutex<HashMap<String, Value>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw persisted document, bypassing migration.
    pub fn insert_raw(&self, professional_id: &str, raw: Value) -> Result<()> {
        self.save(professional_id, &raw)
    }
}

impl ConfigRepository for InMemoryRepository {
    fn load(&self, professional_id: &str) -> Result<Option<Value>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::PersistenceError("repository lock poisoned".into()))?;
        Ok(entries.get(professional_id).cloned())
    }

    fn save(&self, professional_id: &str, config: &Value) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::PersistenceError("repository lock poisoned".into()))?;
        entries.insert(professional_id.to_string(), config.clone());
        Ok(())
    }
}

/// Load path (migrate then merge) and save path over a repository.
pub struct CardConfigService<R: ConfigRepository> {
    repo: R,
}

impl<R: ConfigRepository> CardConfigService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Re-hydrate a card; a professional without a saved card gets the default.
    pub fn load(&self, professional_id: &str) -> Result<CondensedCardConfig> {
        match self.repo.load(professional_id)? {
            Some(raw) => Ok(migrate(&raw)),
            None => {
                info!("no saved card for {}; using defaults", professional_id);
                Ok(CondensedCardConfig::default())
            }
        }
    }

    pub fn save(&self, professional_id: &str, config: &CondensedCardConfig) -> Result<()> {
        self.repo.save(professional_id, &config.to_json()?)
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }
}
