//! Image export pipeline
//!
//! `CardExporter::export` is the only path from a layout tree to a raster
//! artifact. It runs three phases (preprocessing, capture, completion),
//! reports progress at each boundary, and commits a result only if no newer
//! request was issued in the meantime.

pub mod capture;
pub mod exporter;
pub mod preprocess;
pub mod providers;

use serde::{Deserialize, Serialize};

pub use capture::{capture_blocking, CaptureBackend, SoftwareCapture};
pub use exporter::{CardExporter, ExportArtifact};
pub use preprocess::{preprocess, DegradedElement, PreprocessReport};
pub use providers::{DefaultProviders, ImageLoader, NoopProviders, PreprocessProviders, StaticMapRenderer};

/// Per-export knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
    /// Device pixels per canvas pixel
    pub pixel_ratio: f64,
    pub capture_timeout_ms: u64,
    pub replace_maps: bool,
    pub replace_videos: bool,
    pub load_images: bool,
    pub normalize_gradients: bool,
    /// Gradients thinner than this (canvas pixels) are painted as fills
    pub min_gradient_extent: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            pixel_ratio: 1.0,
            capture_timeout_ms: 30_000,
            replace_maps: true,
            replace_videos: true,
            load_images: true,
            normalize_gradients: true,
            min_gradient_extent: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportPhase {
    Preprocessing,
    Capture,
    Completion,
}

/// Progress event emitted at each phase boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExportProgress {
    pub request: u64,
    pub phase: ExportPhase,
    /// 0.0..=1.0, non-decreasing within one request
    pub fraction: f64,
}
