//! Pluggable sources of static content for export preprocessing
//!
//! A map widget or a remote image has no deterministic frame of its own.
//! Preprocessing asks these providers for a bitmap instead; a provider error
//! only degrades the one element it was asked about.

use base64::Engine as Base64Engine;
use futures::future::{BoxFuture, FutureExt};

use crate::rendering::paint::Rgba;
use crate::rendering::position::ResolvedBox;
use crate::rendering::raster::{decode_png, Bitmap};
use crate::sections::Location;
use crate::{Error, Result};

pub trait StaticMapRenderer: Send + Sync {
    /// Render a static map tile of `width x height` device pixels.
    fn render_map<'a>(&'a self, location: &'a Location, zoom: u8, width: u32, height: u32)
        -> BoxFuture<'a, Result<Bitmap>>;
}

pub trait ImageLoader: Send + Sync {
    fn load<'a>(&'a self, src: &'a str) -> BoxFuture<'a, Result<Bitmap>>;
}

/// The set of providers one export run uses.
pub trait PreprocessProviders: Send + Sync {
    fn map_renderer(&self) -> &dyn StaticMapRenderer;
    fn image_loader(&self) -> &dyn ImageLoader;
}

/// Offline map: street grid and a pin, derived only from the coordinates
#[derive(Default)]
pub struct SchematicMapRenderer;

const MAP_LAND: Rgba = Rgba(232, 240, 226, 255);
const MAP_ROAD: Rgba = Rgba(255, 255, 255, 255);
const MAP_PIN: Rgba = Rgba(220, 38, 38, 255);

impl StaticMapRenderer for SchematicMapRenderer {
    fn render_map<'a>(&'a self, location: &'a Location, zoom: u8, width: u32, height: u32)
        -> BoxFuture<'a, Result<Bitmap>> {
        async move {
            if !(location.lat.is_finite() && location.lng.is_finite()) || location.lat.abs() > 90.0 {
                return Err(Error::ImageError(format!("invalid coordinates for `{}`", location.label)));
            }
            let mut map = Bitmap::filled(width, height, MAP_LAND)?;

            // Grid spacing shrinks as the zoom level drops; the offset moves
            // with the coordinates so different places look different.
            let spacing = (8.0 * (zoom.clamp(1, 20) as f64)).max(16.0);
            let offset_x = (location.lng.abs().fract() * spacing).floor();
            let offset_y = (location.lat.abs().fract() * spacing).floor();
            let road = (spacing / 10.0).max(2.0);
            let mut x = offset_x;
            while x < width as f64 {
                map.fill_rect(&ResolvedBox::new(x, 0.0, road, height as f64), MAP_ROAD);
                x += spacing;
            }
            let mut y = offset_y;
            while y < height as f64 {
                map.fill_rect(&ResolvedBox::new(0.0, y, width as f64, road), MAP_ROAD);
                y += spacing;
            }

            let pin = (width.min(height) as f64 * 0.08).max(4.0);
            let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
            map.fill_rect(&ResolvedBox::new(cx - pin / 2.0, cy - pin, pin, pin), MAP_PIN);
            map.fill_rect(&ResolvedBox::new(cx - pin / 8.0, cy, pin / 4.0, pin / 2.0), MAP_PIN);
            Ok(map)
        }
        .boxed()
    }
}

/// Loads `data:image/png;base64,` URLs and local PNG files. Remote URLs
/// are refused; fetching is left to the embedding application.
#[derive(Default)]
pub struct LocalImageLoader;

impl ImageLoader for LocalImageLoader {
    fn load<'a>(&'a self, src: &'a str) -> BoxFuture<'a, Result<Bitmap>> {
        async move {
            if let Some(payload) = src.strip_prefix("data:image/png;base64,") {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(payload.trim())
                    .map_err(|e| Error::ImageError(format!("bad data URL: {}", e)))?;
                return decode_png(&bytes);
            }
            if src.starts_with("http://") || src.starts_with("https://") {
                return Err(Error::ImageError(format!("remote image not available offline: {}", src)));
            }
            let path = src.strip_prefix("file://").unwrap_or(src);
            let bytes = std::fs::read(path).map_err(|e| Error::ImageError(format!("{}: {}", path, e)))?;
            decode_png(&bytes)
        }
        .boxed()
    }
}

/// Schematic maps plus local images
#[derive(Default)]
pub struct DefaultProviders {
    maps: SchematicMapRenderer,
    images: LocalImageLoader,
}

impl PreprocessProviders for DefaultProviders {
    fn map_renderer(&self) -> &dyn StaticMapRenderer {
        &self.maps
    }

    fn image_loader(&self) -> &dyn ImageLoader {
        &self.images
    }
}

/// Providers that fail every request; every dynamic element degrades.
pub struct NoopProviders;

impl StaticMapRenderer for NoopProviders {
    fn render_map<'a>(&'a self, location: &'a Location, _zoom: u8, _width: u32, _height: u32)
        -> BoxFuture<'a, Result<Bitmap>> {
        async move { Err(Error::ImageError(format!("no map renderer for `{}`", location.label))) }.boxed()
    }
}

impl ImageLoader for NoopProviders {
    fn load<'a>(&'a self, src: &'a str) -> BoxFuture<'a, Result<Bitmap>> {
        async move { Err(Error::ImageError(format!("no image loader for {}", src))) }.boxed()
    }
}

impl PreprocessProviders for NoopProviders {
    fn map_renderer(&self) -> &dyn StaticMapRenderer {
        self
    }

    fn image_loader(&self) -> &dyn ImageLoader {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::raster::RasterImage;

    #[tokio::test]
    async fn schematic_map_has_requested_size_and_pin() {
        let loc = Location { label: "Office".into(), address: String::new(), lat: 40.71, lng: -74.0 };
        let map = SchematicMapRenderer.render_map(&loc, 14, 200, 100).await.unwrap();
        assert_eq!((map.width, map.height), (200, 100));
        assert_eq!(map.pixel(100, 45), Some(MAP_PIN));
    }

    #[tokio::test]
    async fn schematic_map_rejects_bad_coordinates() {
        let loc = Location { label: "Nowhere".into(), lat: f64::NAN, ..Default::default() };
        assert!(SchematicMapRenderer.render_map(&loc, 14, 10, 10).await.is_err());
    }

    #[tokio::test]
    async fn loads_png_data_urls() {
        let src = RasterImage::from_bitmap(&Bitmap::filled(2, 2, Rgba::BLACK).unwrap()).unwrap().to_data_url();
        let bitmap = LocalImageLoader.load(&src).await.unwrap();
        assert_eq!(bitmap.pixel(1, 1), Some(Rgba::BLACK));
        assert!(LocalImageLoader.load("https://cdn.example.com/a.png").await.is_err());
    }

    #[tokio::test]
    async fn noop_providers_always_fail() {
        let p = NoopProviders;
        assert!(p.image_loader().load("a.png").await.is_err());
    }
}
