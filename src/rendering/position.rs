//! Position resolution: `PositionConfig` + canvas -> absolute pixel box
//!
//! This is the only code that turns a stored position into geometry. Both
//! the interactive view and the export path go through it.

use log::warn;
use serde::Serialize;

use crate::config::model::{CondensedCardDimensions, DimensionUnit, DimensionValue, PositionConfig};
use crate::{Error, Result};

/// Absolute box in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ResolvedBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ResolvedBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Shrink by `pad` on every side, never below zero size.
    pub fn inset(&self, pad: f64) -> Self {
        Self {
            left: self.left + pad,
            top: self.top + pad,
            width: (self.width - 2.0 * pad).max(0.0),
            height: (self.height - 2.0 * pad).max(0.0),
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self { left: self.left + dx, top: self.top + dy, ..*self }
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self {
            left: self.left * factor,
            top: self.top * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }
}

/// Resolve one axis value against the canvas extent along that axis.
pub fn resolve_axis(value: &DimensionValue, extent: u32) -> Result<f64> {
    if !value.value.is_finite() || value.value < 0.0 {
        return Err(Error::ResolutionError(format!("value {} is not a non-negative number", value.value)));
    }
    match &value.unit {
        DimensionUnit::Percent => Ok(value.value / 100.0 * extent as f64),
        DimensionUnit::Pixel => Ok(value.value),
        DimensionUnit::Unknown(unit) => Err(Error::ResolutionError(format!("unknown unit `{}`", unit))),
    }
}

/// Strict resolution; any invalid axis is an error.
pub fn try_resolve(position: &PositionConfig, canvas: &CondensedCardDimensions) -> Result<ResolvedBox> {
    Ok(ResolvedBox {
        left: resolve_axis(&position.x, canvas.width)?,
        top: resolve_axis(&position.y, canvas.height)?,
        width: resolve_axis(&position.width, canvas.width)?,
        height: resolve_axis(&position.height, canvas.height)?,
    })
}

/// `resolve(position, canvas) -> ResolvedBox`
///
/// Off-canvas placements are returned as-is. An invalid position yields a
/// zero-size box so one bad section cannot blank the card.
pub fn resolve(position: &PositionConfig, canvas: &CondensedCardDimensions) -> ResolvedBox {
    match try_resolve(position, canvas) {
        Ok(bx) => bx,
        Err(e) => {
            warn!("substituting empty box: {}", e);
            ResolvedBox::zero()
        }
    }
}
