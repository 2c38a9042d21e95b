//! Export phase 2: turn a prepared layout tree into PNG bytes

use futures::future::{BoxFuture, FutureExt};
use log::debug;
use std::thread;
use tokio::sync::oneshot;

use crate::rendering::paint::build_display_list;
use crate::rendering::raster::{rasterize, RasterImage};
use crate::rendering::tree::LayoutTree;
use crate::{Error, Result};

/// Something that can snapshot a layout tree into a raster image.
///
/// Implementations must either return the complete image or an error;
/// there is no partial result.
pub trait CaptureBackend: Send + Sync {
    fn capture<'a>(&'a self, tree: &'a LayoutTree, pixel_ratio: f64) -> BoxFuture<'a, Result<RasterImage>>;
}

/// Rasterize on the calling thread.
pub fn capture_blocking(tree: &LayoutTree, pixel_ratio: f64) -> Result<RasterImage> {
    let commands = build_display_list(tree);
    debug!("rasterizing {} paint command(s) at {}x", commands.len(), pixel_ratio);
    let bitmap = rasterize(&commands, tree.width, tree.height, pixel_ratio)?;
    RasterImage::from_bitmap(&bitmap)
}

/// Built-in software rasterizer.
///
/// Rasterization runs on a dedicated worker thread and the result comes
/// back over a oneshot channel, so the async caller is never blocked.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftwareCapture;

impl CaptureBackend for SoftwareCapture {
    fn capture<'a>(&'a self, tree: &'a LayoutTree, pixel_ratio: f64) -> BoxFuture<'a, Result<RasterImage>> {
        let tree = tree.clone();
        async move {
            let (tx, rx) = oneshot::channel();
            thread::spawn(move || {
                // receiver gone means the export was dropped; nothing to report
                let _ = tx.send(capture_blocking(&tree, pixel_ratio));
            });
            rx.await.map_err(|e| Error::ExportFailed(format!("capture worker exited: {}", e)))?
        }
        .boxed()
    }
}
