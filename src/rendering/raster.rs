//! Software rasterizer and PNG codec
//!
//! Text is drawn as fixed-advance glyph blocks using the same metrics as
//! the layout code, so output is deterministic across machines and needs
//! no font files.

use std::io::Cursor;

use base64::Engine as Base64Engine;
use sha2::{Digest, Sha256};

use super::layout::CHAR_WIDTH_RATIO;
use super::paint::{PaintCommand, Rgba};
use super::position::ResolvedBox;
use crate::{Error, Result};

/// Upper bound on captured pixels (about 8K x 8K)
pub const MAX_CAPTURE_PIXELS: u64 = 64 * 1024 * 1024;

/// Straight-alpha RGBA8 pixel buffer
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bitmap({}x{})", self.width, self.height)
    }
}

impl Bitmap {
    /// Transparent bitmap. Sizes above `MAX_CAPTURE_PIXELS` are refused.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let len = (width as u64)
            .checked_mul(height as u64)
            .filter(|&pixels| pixels <= MAX_CAPTURE_PIXELS)
            .and_then(|pixels| usize::try_from(pixels * 4).ok())
            .ok_or_else(|| Error::ImageError(format!("bitmap of {}x{} exceeds the pixel limit", width, height)))?;
        Ok(Self { width, height, rgba: vec![0; len] })
    }

    pub fn filled(width: u32, height: u32, color: Rgba) -> Result<Self> {
        let mut b = Self::new(width, height)?;
        for px in b.rgba.chunks_exact_mut(4) {
            px.copy_from_slice(&[color.0, color.1, color.2, color.3]);
        }
        Ok(b)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some(Rgba(self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]))
    }

    /// Source-over blend of one pixel; out-of-bounds writes are dropped.
    pub fn blend(&mut self, x: i64, y: i64, src: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 || src.3 == 0 {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        if src.3 == 255 {
            self.rgba[i..i + 4].copy_from_slice(&[src.0, src.1, src.2, 255]);
            return;
        }
        let sa = src.3 as f64 / 255.0;
        let da = self.rgba[i + 3] as f64 / 255.0;
        let oa = sa + da * (1.0 - sa);
        if oa <= 0.0 {
            return;
        }
        let mix = |s: u8, d: u8| ((s as f64 * sa + d as f64 * da * (1.0 - sa)) / oa).round() as u8;
        self.rgba[i] = mix(src.0, self.rgba[i]);
        self.rgba[i + 1] = mix(src.1, self.rgba[i + 1]);
        self.rgba[i + 2] = mix(src.2, self.rgba[i + 2]);
        self.rgba[i + 3] = (oa * 255.0).round() as u8;
    }

    /// Pixel span covered by `rect`, clipped to the bitmap. Edges round to
    /// the nearest pixel so adjacent boxes neither overlap nor leave gaps.
    fn span(&self, rect: &ResolvedBox) -> Option<(i64, i64, i64, i64)> {
        if !(rect.left.is_finite() && rect.top.is_finite() && rect.width.is_finite() && rect.height.is_finite()) {
            return None;
        }
        let x0 = (rect.left.round() as i64).max(0);
        let y0 = (rect.top.round() as i64).max(0);
        let x1 = (rect.right().round() as i64).min(self.width as i64);
        let y1 = (rect.bottom().round() as i64).min(self.height as i64);
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }

    pub fn fill_rect(&mut self, rect: &ResolvedBox, color: Rgba) {
        let Some((x0, y0, x1, y1)) = self.span(rect) else { return };
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, color);
            }
        }
    }

    pub fn fill_linear_gradient(&mut self, rect: &ResolvedBox, angle: f64, stops: &[(f64, Rgba)]) {
        let Some((x0, y0, x1, y1)) = self.span(rect) else { return };
        if stops.is_empty() {
            return;
        }
        let mut stops = stops.to_vec();
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));

        let rad = angle.to_radians();
        let (dx, dy) = (rad.sin(), -rad.cos());
        let length = (rect.width * dx).abs() + (rect.height * dy).abs();
        let (cx, cy) = (rect.left + rect.width / 2.0, rect.top + rect.height / 2.0);

        for y in y0..y1 {
            for x in x0..x1 {
                let (px, py) = (x as f64 + 0.5 - cx, y as f64 + 0.5 - cy);
                let t = if length > 0.0 { (px * dx + py * dy) / length + 0.5 } else { 0.0 };
                self.blend(x, y, sample_stops(&stops, t));
            }
        }
    }

    /// Diagonal stripes every 8px.
    pub fn hatch(&mut self, rect: &ResolvedBox, color: Rgba) {
        let Some((x0, y0, x1, y1)) = self.span(rect) else { return };
        for y in y0..y1 {
            for x in x0..x1 {
                if (x + y).rem_euclid(8) < 2 {
                    self.blend(x, y, color);
                }
            }
        }
    }

    /// Nearest-neighbour scale of `src` into `rect`.
    pub fn blit_scaled(&mut self, src: &Bitmap, rect: &ResolvedBox) {
        let Some((x0, y0, x1, y1)) = self.span(rect) else { return };
        if src.width == 0 || src.height == 0 || rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        let sx = src.width as f64 / rect.width;
        let sy = src.height as f64 / rect.height;
        for y in y0..y1 {
            let v = (((y as f64 + 0.5 - rect.top) * sy) as u32).min(src.height - 1);
            for x in x0..x1 {
                let u = (((x as f64 + 0.5 - rect.left) * sx) as u32).min(src.width - 1);
                if let Some(px) = src.pixel(u, v) {
                    self.blend(x, y, px);
                }
            }
        }
    }

    /// Draw one line of text as glyph blocks: each non-space character is a
    /// box of cap height inside its advance cell.
    pub fn draw_glyphs(&mut self, x: f64, y: f64, text: &str, font_size: f64, color: Rgba) {
        let advance = font_size * CHAR_WIDTH_RATIO;
        let inset = advance * 0.15;
        let cap_top = y + font_size * 0.25;
        let cap_height = font_size * 0.7;
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let left = x + i as f64 * advance + inset;
            self.fill_rect(&ResolvedBox::new(left, cap_top, advance - 2.0 * inset, cap_height), color);
        }
    }
}

fn sample_stops(stops: &[(f64, Rgba)], t: f64) -> Rgba {
    let first = stops[0];
    let last = stops[stops.len() - 1];
    if t <= first.0 {
        return first.1;
    }
    if t >= last.0 {
        return last.1;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t >= a.0 && t <= b.0 {
            let span = b.0 - a.0;
            let local = if span > 0.0 { (t - a.0) / span } else { 1.0 };
            return a.1.lerp(b.1, local);
        }
    }
    last.1
}

/// Rasterize a display list onto a `width x height` canvas scaled by
/// `scale` (device pixel ratio).
pub fn rasterize(commands: &[PaintCommand], width: u32, height: u32, scale: f64) -> Result<Bitmap> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(Error::ImageError(format!("invalid pixel ratio {}", scale)));
    }
    let w = (width as f64 * scale).round() as u64;
    let h = (height as f64 * scale).round() as u64;
    if w == 0 || h == 0 || w * h > MAX_CAPTURE_PIXELS {
        return Err(Error::ImageError(format!("cannot capture a {}x{} canvas", w, h)));
    }

    let mut canvas = Bitmap::new(w as u32, h as u32)?;
    for cmd in commands {
        match cmd {
            PaintCommand::SolidRect { rect, rgba } => canvas.fill_rect(&rect.scale(scale), *rgba),
            PaintCommand::LinearGradient { rect, angle, stops } => {
                canvas.fill_linear_gradient(&rect.scale(scale), *angle, stops)
            }
            PaintCommand::Glyphs { x, y, text, font_size, rgba } => {
                canvas.draw_glyphs(x * scale, y * scale, text, font_size * scale, *rgba)
            }
            PaintCommand::Bitmap { rect, bitmap } => canvas.blit_scaled(bitmap, &rect.scale(scale)),
            PaintCommand::Hatch { rect, rgba } => canvas.hatch(&rect.scale(scale), *rgba),
        }
    }
    Ok(canvas)
}

pub fn encode_png(bitmap: &Bitmap) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, bitmap.width, bitmap.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().map_err(|e| Error::ImageError(e.to_string()))?;
    writer.write_image_data(&bitmap.rgba).map_err(|e| Error::ImageError(e.to_string()))?;
    writer.finish().map_err(|e| Error::ImageError(e.to_string()))?;
    Ok(out)
}

/// Decode any 8/16-bit PNG into RGBA8.
pub fn decode_png(bytes: &[u8]) -> Result<Bitmap> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(|e| Error::ImageError(e.to_string()))?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(|e| Error::ImageError(e.to_string()))?;
    let data = &buf[..info.buffer_size()];

    let rgba = match info.color_type {
        png::ColorType::Rgba => data.to_vec(),
        png::ColorType::Rgb => data.chunks_exact(3).flat_map(|c| [c[0], c[1], c[2], 255]).collect(),
        png::ColorType::GrayscaleAlpha => data.chunks_exact(2).flat_map(|c| [c[0], c[0], c[0], c[1]]).collect(),
        png::ColorType::Grayscale => data.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        other => return Err(Error::ImageError(format!("unsupported PNG color type {:?}", other))),
    };
    Ok(Bitmap { width: info.width, height: info.height, rgba })
}

/// Encoded capture result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
    /// Hex SHA-256 of `png_data`
    pub digest: String,
}

impl RasterImage {
    pub fn from_bitmap(bitmap: &Bitmap) -> Result<Self> {
        let png_data = encode_png(bitmap)?;
        let digest = hex::encode(Sha256::digest(&png_data));
        Ok(Self { width: bitmap.width, height: bitmap.height, png_data, digest })
    }

    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", base64::engine::general_purpose::STANDARD.encode(&self.png_data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rect_rounds_edges_and_clips() {
        let mut b = Bitmap::new(10, 10).unwrap();
        b.fill_rect(&ResolvedBox::new(-5.0, 2.4, 8.0, 3.0), Rgba::BLACK);
        assert_eq!(b.pixel(0, 2), Some(Rgba::BLACK));
        assert_eq!(b.pixel(2, 4), Some(Rgba::BLACK));
        assert_eq!(b.pixel(3, 2), Some(Rgba::TRANSPARENT));
        assert_eq!(b.pixel(0, 5), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn half_alpha_blends_over_white() {
        let mut b = Bitmap::filled(1, 1, Rgba::WHITE).unwrap();
        b.blend(0, 0, Rgba(0, 0, 0, 128));
        let Rgba(r, _, _, a) = b.pixel(0, 0).unwrap();
        assert_eq!(a, 255);
        assert!((126..=128).contains(&r));
    }

    #[test]
    fn horizontal_gradient_runs_left_to_right() {
        let mut b = Bitmap::new(100, 1).unwrap();
        b.fill_linear_gradient(&ResolvedBox::new(0.0, 0.0, 100.0, 1.0), 90.0, &[(0.0, Rgba::BLACK), (1.0, Rgba::WHITE)]);
        let left = b.pixel(0, 0).unwrap().0;
        let right = b.pixel(99, 0).unwrap().0;
        assert!(left < 10 && right > 245);
    }

    #[test]
    fn rasterize_scales_by_pixel_ratio() {
        let cmds = vec![PaintCommand::SolidRect { rect: ResolvedBox::new(0.0, 0.0, 10.0, 10.0), rgba: Rgba::BLACK }];
        let b = rasterize(&cmds, 10, 5, 2.0).unwrap();
        assert_eq!((b.width, b.height), (20, 10));
        assert_eq!(b.pixel(19, 9), Some(Rgba::BLACK));
        assert!(rasterize(&cmds, 10, 5, 0.0).is_err());
    }

    #[test]
    fn png_survives_encode_decode() {
        let mut b = Bitmap::filled(4, 3, Rgba(10, 20, 30, 255)).unwrap();
        b.blend(1, 1, Rgba(200, 0, 0, 255));
        let image = RasterImage::from_bitmap(&b).unwrap();
        assert_eq!(image.digest.len(), 64);
        assert!(image.to_data_url().starts_with("data:image/png;base64,"));
        assert_eq!(decode_png(&image.png_data).unwrap(), b);
    }

    #[test]
    fn oversized_bitmaps_are_refused() {
        assert!(matches!(Bitmap::new(u32::MAX, u32::MAX), Err(Error::ImageError(_))));
        assert!(Bitmap::new(20_000, 20_000).is_err());
        assert_eq!(Bitmap::new(3, 2).map(|b| b.rgba.len()).ok(), Some(24));
    }

    #[test]
    fn garbage_is_not_a_png() {
        assert!(decode_png(b"not a png").is_err());
    }
}
