//! Export phase 1: freeze dynamic content
//!
//! Map widgets and videos become static images, unloaded images get their
//! pixels, and gradients too thin to rasterize reliably become fills. Each
//! element is handled on its own: a failure turns that element into a
//! placeholder and the rest of the card is unaffected.

use futures::future::{join_all, BoxFuture, FutureExt};
use log::{debug, warn};
use serde::Serialize;

use super::providers::PreprocessProviders;
use super::ExportOptions;
use crate::rendering::position::ResolvedBox;
use crate::rendering::raster::MAX_CAPTURE_PIXELS;
use crate::rendering::tree::{Element, LayoutTree};
use crate::{Error, Result};

/// An element that could not be frozen and was replaced by a placeholder
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DegradedElement {
    pub section_id: String,
    pub element_index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprocessReport {
    /// Elements successfully swapped for a static bitmap
    pub replaced: usize,
    pub normalized_gradients: usize,
    pub degraded: Vec<DegradedElement>,
}

type Job<'a> = BoxFuture<'a, (usize, usize, Result<Element>)>;

/// Device-pixel size of a box, at least 1x1. Boxes may extend past the
/// canvas; one whose tile would exceed `MAX_CAPTURE_PIXELS` is refused.
fn device_size(rect: &ResolvedBox, pixel_ratio: f64) -> Result<(u32, u32)> {
    let w = (rect.width * pixel_ratio).round().max(1.0);
    let h = (rect.height * pixel_ratio).round().max(1.0);
    if !(w.is_finite() && h.is_finite()) || w * h > MAX_CAPTURE_PIXELS as f64 {
        return Err(Error::ImageError(format!("{}x{} tile exceeds the pixel limit", w, h)));
    }
    Ok((w as u32, h as u32))
}

fn placeholder_label(element: &Element) -> &'static str {
    match element {
        Element::MapWidget { .. } => "Map unavailable",
        Element::Video { .. } => "Video unavailable",
        _ => "Image unavailable",
    }
}

fn job_for<'a>(
    si: usize,
    ei: usize,
    element: &'a Element,
    options: &ExportOptions,
    providers: &'a dyn PreprocessProviders,
) -> Option<Job<'a>> {
    match element {
        Element::MapWidget { rect, location, zoom } if options.replace_maps => {
            let size = device_size(rect, options.pixel_ratio);
            let rect = *rect;
            let zoom = *zoom;
            Some(
                async move {
                    let bitmap = match size {
                        Ok((w, h)) => providers.map_renderer().render_map(location, zoom, w, h).await,
                        Err(e) => Err(e),
                    };
                    let result = bitmap.map(|bitmap| Element::Image {
                        rect,
                        src: format!("map:{},{}", location.lat, location.lng),
                        bitmap: Some(bitmap),
                    });
                    (si, ei, result)
                }
                .boxed(),
            )
        }
        Element::Video { rect, poster, .. } if options.replace_videos => {
            let rect = *rect;
            Some(
                async move {
                    let result = match poster.as_deref() {
                        Some(src) => providers
                            .image_loader()
                            .load(src)
                            .await
                            .map(|bitmap| Element::Image { rect, src: src.to_string(), bitmap: Some(bitmap) }),
                        None => Err(Error::ImageError("video has no poster".to_string())),
                    };
                    (si, ei, result)
                }
                .boxed(),
            )
        }
        Element::Image { rect, src, bitmap: None } if options.load_images => {
            let rect = *rect;
            Some(
                async move {
                    let result = providers
                        .image_loader()
                        .load(src)
                        .await
                        .map(|bitmap| Element::Image { rect, src: src.clone(), bitmap: Some(bitmap) });
                    (si, ei, result)
                }
                .boxed(),
            )
        }
        _ => None,
    }
}

/// Replace a gradient thinner than `min_extent` on either axis with a fill
/// of its first stop color.
fn normalize_gradient(element: &Element, min_extent: f64) -> Option<Element> {
    let Element::Gradient { rect, gradient } = element else { return None };
    if rect.width >= min_extent && rect.height >= min_extent {
        return None;
    }
    let color = gradient
        .stops
        .iter()
        .min_by(|a, b| a.offset.total_cmp(&b.offset))
        .map(|s| s.color.clone())
        .unwrap_or_else(|| "#00000000".to_string());
    Some(Element::Fill { rect: *rect, color })
}

/// Produce a capture-ready copy of `tree`. The input is left untouched.
pub async fn preprocess(
    tree: &LayoutTree,
    options: &ExportOptions,
    providers: &dyn PreprocessProviders,
) -> (LayoutTree, PreprocessReport) {
    let mut report = PreprocessReport::default();

    let jobs: Vec<Job<'_>> = tree
        .sections
        .iter()
        .enumerate()
        .flat_map(|(si, section)| section.elements.iter().enumerate().map(move |(ei, el)| (si, ei, el)))
        .filter_map(|(si, ei, el)| job_for(si, ei, el, options, providers))
        .collect();
    debug!("preprocessing {} dynamic element(s)", jobs.len());
    let results = join_all(jobs).await;

    let mut prepared = tree.clone();
    for (si, ei, result) in results {
        let section = &mut prepared.sections[si];
        let slot = &mut section.elements[ei];
        match result {
            Ok(element) => {
                *slot = element;
                report.replaced += 1;
            }
            Err(e) => {
                warn!("section {}: element {} degraded to placeholder: {}", section.id, ei, e);
                report.degraded.push(DegradedElement {
                    section_id: section.id.clone(),
                    element_index: ei,
                    reason: e.to_string(),
                });
                *slot = Element::Placeholder { rect: *slot.rect(), label: placeholder_label(slot).to_string() };
            }
        }
    }

    if options.normalize_gradients {
        for element in prepared.sections.iter_mut().flat_map(|s| s.elements.iter_mut()) {
            if let Some(fill) = normalize_gradient(element, options.min_gradient_extent) {
                *element = fill;
                report.normalized_gradients += 1;
            }
        }
    }

    (prepared, report)
}
