//! Upgrade persisted configurations to the current shape
//!
//! The persisted JSON carries no version number. The shape is detected
//! structurally:
//!
//! - **single column**: sections carry neither `position` nor grid keys and
//!   are ordered by array index only; they are stacked top to bottom at full
//!   width.
//! - **grid**: sections carry `row` / `column` / `rowSpan`; rows become
//!   equal horizontal bands and columns become half or full width.
//! - **current**: sections carry `position`; loose values (bare numbers,
//!   unit aliases, `hidden` flags) are normalized. Entries saved before
//!   positions existed keep their list slot as a full-width band.
//!
//! Every entry is handled in isolation: a malformed or unknown section is
//! dropped with a warning and the rest of the card still loads. Running the
//! migration on its own output changes nothing.

use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

use super::merge::{
    merge_with_defaults, PartialCardConfig, PartialDimensions, PartialPosition, PartialSection, PartialStyles,
};
use super::model::{
    CondensedCardConfig, CustomObject, DimensionPreset, DimensionUnit, DimensionValue, GradientStyle, SectionType,
};
use crate::{Error, Result};

/// Structural shape of a persisted configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaShape {
    /// Nothing usable; defaults are returned
    Empty,
    SingleColumn,
    Grid,
    Current,
}

/// What happened during a migration
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub shape: Option<SchemaShape>,
    /// Entries excluded from the result
    pub dropped: Vec<Error>,
    /// Ids created for sections that had none (or a duplicate one)
    pub synthesized_ids: Vec<String>,
}

/// `migrate(raw) -> CondensedCardConfig`
pub fn migrate(raw: &Value) -> CondensedCardConfig {
    migrate_with_report(raw).0
}

/// Parse persisted JSON text and migrate it.
pub fn migrate_str(raw: &str) -> Result<CondensedCardConfig> {
    let value: Value = serde_json::from_str(raw)?;
    Ok(migrate(&value))
}

pub fn migrate_with_report(raw: &Value) -> (CondensedCardConfig, MigrationReport) {
    let mut report = MigrationReport::default();
    let partial = migrate_partial(raw, &mut report);
    debug!(
        "migrated card config: shape={:?} sections={} dropped={}",
        report.shape,
        partial.sections.as_ref().map_or(0, Vec::len),
        report.dropped.len()
    );
    (merge_with_defaults(&partial), report)
}

/// Detect which persisted shape `raw` was written under.
pub fn detect_shape(raw: &Value) -> SchemaShape {
    let entries = match section_entries(raw) {
        Some(entries) if !entries.is_empty() => entries,
        _ => {
            return if raw.is_object() { SchemaShape::Current } else { SchemaShape::Empty };
        }
    };
    let has_key = |key: &str| entries.iter().any(|e| e.get(key).is_some());
    if has_key("position") {
        SchemaShape::Current
    } else if has_key("row") || has_key("column") {
        SchemaShape::Grid
    } else {
        SchemaShape::SingleColumn
    }
}

fn section_entries(raw: &Value) -> Option<&Vec<Value>> {
    match raw {
        // earliest editors persisted the bare section list
        Value::Array(entries) => Some(entries),
        Value::Object(obj) => obj.get("sections").and_then(Value::as_array),
        _ => None,
    }
}

/// Structural upgrade without defaulting; see `merge_with_defaults`.
pub fn migrate_partial(raw: &Value, report: &mut MigrationReport) -> PartialCardConfig {
    let shape = detect_shape(raw);
    report.shape = Some(shape);
    if shape == SchemaShape::Empty {
        warn!("card config is not an object or section list; using defaults");
        return PartialCardConfig::default();
    }

    let obj = raw.as_object();
    let dimensions = obj.and_then(|o| o.get("dimensions").or_else(|| o.get("canvas"))).and_then(parse_dimensions);
    let styles = obj.and_then(|o| o.get("styles").or_else(|| o.get("theme"))).and_then(parse_styles);

    let sections = section_entries(raw).map(|entries| {
        let mut drafts = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            match parse_entry(index, entry, shape) {
                Ok(draft) => drafts.push(draft),
                Err(err) => {
                    warn!("dropping card section: {}", err);
                    report.dropped.push(err);
                }
            }
        }
        match shape {
            SchemaShape::SingleColumn => stack_single_column(&mut drafts),
            SchemaShape::Grid => place_grid(&mut drafts),
            SchemaShape::Current => stack_unpositioned(&mut drafts),
            SchemaShape::Empty => {}
        }
        assign_ids(drafts, report)
    });

    PartialCardConfig { dimensions, styles, sections }
}

/// Section being migrated, before id assignment
struct Draft {
    id: Option<String>,
    kind: SectionType,
    position: PartialPosition,
    /// Entry carried its own `position` object
    positioned: bool,
    props: Map<String, Value>,
    layout_objects: Option<Vec<CustomObject>>,
    grid: Option<GridCell>,
}

#[derive(Clone, Copy)]
struct GridCell {
    row: u64,
    span: u64,
    column: GridColumn,
}

#[derive(Clone, Copy)]
enum GridColumn {
    Left,
    Right,
    Full,
}

fn malformed(index: usize, reason: impl Into<String>) -> Error {
    Error::MalformedSection { index, reason: reason.into() }
}

fn parse_entry(index: usize, entry: &Value, shape: SchemaShape) -> Result<Draft> {
    let obj = match entry {
        Value::String(name) => {
            let kind = name.parse::<SectionType>()?;
            return Ok(Draft {
                id: None,
                kind,
                position: PartialPosition::default(),
                positioned: false,
                props: Map::new(),
                layout_objects: None,
                grid: None,
            });
        }
        Value::Object(obj) => obj,
        _ => return Err(malformed(index, "entry is neither an object nor a section name")),
    };

    let kind_name = ["sectionType", "type", "kind"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .ok_or_else(|| malformed(index, "missing sectionType"))?;
    let kind = kind_name.parse::<SectionType>()?;

    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    let mut position = match obj.get("position") {
        Some(Value::Object(p)) => parse_position(index, p),
        Some(Value::Null) | None => PartialPosition::default(),
        Some(_) => return Err(malformed(index, "position is not an object")),
    };
    let positioned = matches!(obj.get("position"), Some(Value::Object(_)));
    if position.visible.is_none() {
        position.visible = legacy_visibility(obj);
    }
    if position.z_index.is_none() {
        position.z_index = obj.get("zIndex").and_then(Value::as_i64).map(|z| z as i32);
    }

    let props = match ["props", "settings", "data"].iter().find_map(|k| obj.get(*k)) {
        Some(Value::Object(p)) => p.clone(),
        Some(Value::Null) | None => Map::new(),
        Some(_) => {
            warn!("section {} ({}): props is not an object; ignoring it", index, kind);
            Map::new()
        }
    };

    let layout_objects = obj
        .get("layoutObjects")
        .or_else(|| obj.get("objects"))
        .and_then(Value::as_array)
        .map(|raw_objects| parse_objects(index, raw_objects));

    let grid = if shape == SchemaShape::Grid { Some(parse_grid_cell(index, obj)?) } else { None };

    Ok(Draft { id, kind, position, positioned, props, layout_objects, grid })
}

fn legacy_visibility(obj: &Map<String, Value>) -> Option<bool> {
    if let Some(v) = obj.get("visible").and_then(Value::as_bool) {
        return Some(v);
    }
    if let Some(v) = obj.get("enabled").and_then(Value::as_bool) {
        return Some(v);
    }
    obj.get("hidden").and_then(Value::as_bool).map(|h| !h)
}

fn parse_position(index: usize, p: &Map<String, Value>) -> PartialPosition {
    let axis = |names: &[&str]| -> Option<DimensionValue> {
        let raw = names.iter().find_map(|n| p.get(*n))?;
        let parsed = parse_dimension_value(raw);
        if parsed.is_none() && !raw.is_null() {
            warn!("section {}: unreadable {} value {}; using default", index, names[0], raw);
        }
        parsed
    };
    PartialPosition {
        x: axis(&["x", "left"]),
        y: axis(&["y", "top"]),
        width: axis(&["width", "w"]),
        height: axis(&["height", "h"]),
        visible: p
            .get("visible")
            .and_then(Value::as_bool)
            .or_else(|| p.get("hidden").and_then(Value::as_bool).map(|h| !h)),
        z_index: p.get("zIndex").and_then(Value::as_i64).map(|z| z as i32),
    }
}

/// `{value, unit}`, a bare number (pixels) or a string such as `"50%"`.
fn parse_dimension_value(raw: &Value) -> Option<DimensionValue> {
    match raw {
        Value::Number(n) => n.as_f64().map(DimensionValue::pixels),
        Value::Object(o) => {
            let value = o.get("value").and_then(Value::as_f64)?;
            let unit = match o.get("unit") {
                Some(Value::String(u)) => DimensionUnit::parse(u),
                _ => DimensionUnit::Pixel,
            };
            Some(DimensionValue { value, unit })
        }
        Value::String(s) => {
            let s = s.trim();
            if let Some(num) = s.strip_suffix('%') {
                num.trim().parse().ok().map(DimensionValue::percent)
            } else {
                s.trim_end_matches("px").trim().parse().ok().map(DimensionValue::pixels)
            }
        }
        _ => None,
    }
}

fn parse_objects(index: usize, raw_objects: &[Value]) -> Vec<CustomObject> {
    raw_objects
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| match serde_json::from_value::<CustomObject>(raw.clone()) {
            Ok(obj) => Some(obj),
            Err(e) => {
                warn!("section {}: dropping layout object {}: {}", index, i, e);
                None
            }
        })
        .collect()
}

fn parse_grid_cell(index: usize, obj: &Map<String, Value>) -> Result<GridCell> {
    let row = match obj.get("row") {
        Some(v) => v.as_u64().ok_or_else(|| malformed(index, "row is not a non-negative integer"))?,
        None => 0,
    };
    let span = obj.get("rowSpan").and_then(Value::as_u64).unwrap_or(1).max(1);
    let column = match obj.get("column").and_then(Value::as_str).map(str::to_ascii_lowercase).as_deref() {
        Some("left") => GridColumn::Left,
        Some("right") => GridColumn::Right,
        Some("full") | None => GridColumn::Full,
        Some(other) => return Err(malformed(index, format!("unknown grid column `{}`", other))),
    };
    Ok(GridCell { row, span, column })
}

fn stack_single_column(drafts: &mut [Draft]) {
    let n = drafts.len() as f64;
    for (i, draft) in drafts.iter_mut().enumerate() {
        let band = 100.0 / n;
        fill_missing(&mut draft.position, 0.0, i as f64 * band, 100.0, band);
    }
}

/// Stack entries without a `position` by list index, leaving the
/// positioned ones untouched.
fn stack_unpositioned(drafts: &mut [Draft]) {
    let band = 100.0 / drafts.len() as f64;
    for (i, draft) in drafts.iter_mut().enumerate().filter(|(_, d)| !d.positioned) {
        fill_missing(&mut draft.position, 0.0, i as f64 * band, 100.0, band);
    }
}

fn place_grid(drafts: &mut [Draft]) {
    // bare section names have no cell; each takes a full-width row below the grid
    let mut next_row = drafts.iter().filter_map(|d| d.grid.map(|g| g.row + g.span)).max().unwrap_or(0);
    for draft in drafts.iter_mut().filter(|d| d.grid.is_none()) {
        draft.grid = Some(GridCell { row: next_row, span: 1, column: GridColumn::Full });
        next_row += 1;
    }
    let rows = next_row.max(1) as f64;
    for draft in drafts.iter_mut() {
        let Some(cell) = draft.grid else { continue };
        let (x, width) = match cell.column {
            GridColumn::Left => (0.0, 50.0),
            GridColumn::Right => (50.0, 50.0),
            GridColumn::Full => (0.0, 100.0),
        };
        let y = cell.row as f64 / rows * 100.0;
        let height = cell.span as f64 / rows * 100.0;
        fill_missing(&mut draft.position, x, y, width, height);
    }
}

fn fill_missing(p: &mut PartialPosition, x: f64, y: f64, width: f64, height: f64) {
    p.x.get_or_insert(DimensionValue::percent(x));
    p.y.get_or_insert(DimensionValue::percent(y));
    p.width.get_or_insert(DimensionValue::percent(width));
    p.height.get_or_insert(DimensionValue::percent(height));
}

/// Keep first-seen ids, then synthesize `<type>-<n>` for the rest.
fn assign_ids(drafts: Vec<Draft>, report: &mut MigrationReport) -> Vec<PartialSection> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut ids: Vec<Option<String>> = Vec::with_capacity(drafts.len());
    for draft in &drafts {
        match &draft.id {
            Some(id) if taken.insert(id.clone()) => ids.push(Some(id.clone())),
            Some(id) => {
                warn!("duplicate section id `{}`; assigning a new one", id);
                ids.push(None);
            }
            None => ids.push(None),
        }
    }

    let mut counters: HashMap<SectionType, u32> = HashMap::new();
    drafts
        .into_iter()
        .zip(ids)
        .map(|(draft, id)| {
            let id = id.unwrap_or_else(|| {
                let counter = counters.entry(draft.kind).or_insert(0);
                loop {
                    *counter += 1;
                    let candidate = format!("{}-{}", draft.kind, counter);
                    if taken.insert(candidate.clone()) {
                        report.synthesized_ids.push(candidate.clone());
                        break candidate;
                    }
                }
            });
            PartialSection {
                id,
                section_type: draft.kind,
                position: draft.position,
                props: draft.props,
                layout_objects: draft.layout_objects,
            }
        })
        .collect()
}

fn parse_dimensions(raw: &Value) -> Option<PartialDimensions> {
    let obj = raw.as_object()?;
    let preset = match obj.get("preset").and_then(Value::as_str) {
        Some(name) => {
            let preset = DimensionPreset::from_name(name);
            if preset.is_none() {
                warn!("unknown canvas preset `{}`; inferring from size", name);
            }
            preset
        }
        None => None,
    };
    let size = |key: &str| {
        obj.get(key)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite() && *v >= 1.0)
            .map(|v| v.round() as u32)
    };
    Some(PartialDimensions { preset, width: size("width"), height: size("height") })
}

fn parse_styles(raw: &Value) -> Option<PartialStyles> {
    let obj = raw.as_object()?;
    let color = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
    let gradient = match obj.get("gradient") {
        None | Some(Value::Null) => None,
        Some(g) => parse_gradient(g),
    };
    Some(PartialStyles {
        gradient,
        background_color: color("backgroundColor"),
        text_color: color("textColor"),
        accent_color: color("accentColor"),
        font_family: color("fontFamily"),
    })
}

fn parse_gradient(raw: &Value) -> Option<GradientStyle> {
    if let Ok(g) = serde_json::from_value::<GradientStyle>(raw.clone()) {
        return Some(g);
    }
    // older editors stored `{from, to, angle}`
    let obj = raw.as_object()?;
    let from = obj.get("from").and_then(Value::as_str);
    let to = obj.get("to").and_then(Value::as_str);
    match (from, to) {
        (Some(from), Some(to)) => {
            let angle = obj.get("angle").and_then(Value::as_f64).unwrap_or(180.0);
            Some(GradientStyle::two_stop(angle, from, to))
        }
        _ => {
            warn!("unreadable gradient {}; ignoring it", raw);
            None
        }
    }
}
