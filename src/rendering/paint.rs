//! Display list built from a layout tree
//!
//! The list is the only thing the rasterizer sees. Colors are parsed here
//! once; an unparseable color falls back instead of failing the paint.

use log::warn;

use super::layout::{line_height, text_width};
use super::position::ResolvedBox;
use super::raster::Bitmap;
use super::tree::{Element, LayoutTree};
use crate::config::model::GradientStyle;
use crate::sections::TextAlign;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub const BLACK: Rgba = Rgba(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba(255, 255, 255, 255);
    pub const TRANSPARENT: Rgba = Rgba(0, 0, 0, 0);
    pub const PLACEHOLDER: Rgba = Rgba(229, 231, 235, 255);
    pub const PLACEHOLDER_INK: Rgba = Rgba(156, 163, 175, 255);

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse_hex(raw: &str) -> Option<Rgba> {
        let hex = raw.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let byte = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut it = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
                Some(Rgba(it.next()??, it.next()??, it.next()??, 255))
            }
            6 => Some(Rgba(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?, 255)),
            8 => Some(Rgba(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?, byte(&hex[6..8])?)),
            _ => None,
        }
    }

    pub fn parse_or(raw: &str, fallback: Rgba) -> Rgba {
        Rgba::parse_hex(raw).unwrap_or_else(|| {
            warn!("unsupported color `{}`; using fallback", raw);
            fallback
        })
    }

    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgba(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2), mix(self.3, other.3))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        rect: ResolvedBox,
        rgba: Rgba,
    },
    LinearGradient {
        rect: ResolvedBox,
        /// CSS convention: 0deg points up, 90deg points right
        angle: f64,
        stops: Vec<(f64, Rgba)>,
    },
    /// One line of text, top-left anchored
    Glyphs {
        x: f64,
        y: f64,
        text: String,
        font_size: f64,
        rgba: Rgba,
    },
    Bitmap {
        rect: ResolvedBox,
        bitmap: Bitmap,
    },
    /// Diagonal stripes marking content that is not available in the frame
    Hatch {
        rect: ResolvedBox,
        rgba: Rgba,
    },
}

impl PaintCommand {
    pub fn gradient(rect: ResolvedBox, gradient: &GradientStyle) -> PaintCommand {
        let stops = gradient
            .stops
            .iter()
            .map(|s| (s.offset, Rgba::parse_or(&s.color, Rgba::TRANSPARENT)))
            .collect();
        PaintCommand::LinearGradient { rect, angle: gradient.angle, stops }
    }
}

fn placeholder(rect: ResolvedBox, label: Option<&str>, out: &mut Vec<PaintCommand>) {
    out.push(PaintCommand::SolidRect { rect, rgba: Rgba::PLACEHOLDER });
    out.push(PaintCommand::Hatch { rect, rgba: Rgba::PLACEHOLDER_INK });
    if let Some(label) = label.filter(|l| !l.is_empty()) {
        let font_size = (rect.height * 0.2).clamp(8.0, 24.0);
        let w = text_width(label, font_size);
        if w <= rect.width {
            out.push(PaintCommand::Glyphs {
                x: rect.left + (rect.width - w) / 2.0,
                y: rect.top + (rect.height - font_size) / 2.0,
                text: label.to_string(),
                font_size,
                rgba: Rgba::PLACEHOLDER_INK,
            });
        }
    }
}

/// Flatten a layout tree into paint order: backdrop, then each section's
/// elements in tree order.
pub fn build_display_list(tree: &LayoutTree) -> Vec<PaintCommand> {
    let canvas = ResolvedBox::new(0.0, 0.0, tree.width as f64, tree.height as f64);
    let mut out = vec![PaintCommand::SolidRect {
        rect: canvas,
        rgba: Rgba::parse_or(&tree.backdrop.color, Rgba::WHITE),
    }];
    if let Some(gradient) = &tree.backdrop.gradient {
        out.push(PaintCommand::gradient(canvas, gradient));
    }

    for element in tree.elements() {
        match element {
            Element::Fill { rect, color } => {
                out.push(PaintCommand::SolidRect { rect: *rect, rgba: Rgba::parse_or(color, Rgba::TRANSPARENT) })
            }
            Element::Gradient { rect, gradient } => out.push(PaintCommand::gradient(*rect, gradient)),
            Element::Text { rect, lines, font_size, color, align } => {
                let rgba = Rgba::parse_or(color, Rgba::BLACK);
                for (i, line) in lines.iter().enumerate() {
                    let free = (rect.width - text_width(line, *font_size)).max(0.0);
                    let x = match align {
                        TextAlign::Left => rect.left,
                        TextAlign::Center => rect.left + free / 2.0,
                        TextAlign::Right => rect.left + free,
                    };
                    out.push(PaintCommand::Glyphs {
                        x,
                        y: rect.top + i as f64 * line_height(*font_size),
                        text: line.clone(),
                        font_size: *font_size,
                        rgba,
                    });
                }
            }
            Element::Image { rect, bitmap: Some(bitmap), .. } => {
                out.push(PaintCommand::Bitmap { rect: *rect, bitmap: bitmap.clone() })
            }
            Element::Image { rect, .. } => placeholder(*rect, None, &mut out),
            Element::Link { rect, label, font_size, color, .. } => {
                let rgba = Rgba::parse_or(color, Rgba::BLACK);
                out.push(PaintCommand::Glyphs { x: rect.left, y: rect.top, text: label.clone(), font_size: *font_size, rgba });
                let underline = text_width(label, *font_size).min(rect.width);
                let thickness = (font_size / 12.0).max(1.0);
                out.push(PaintCommand::SolidRect {
                    rect: ResolvedBox::new(rect.left, rect.top + font_size * 1.1, underline, thickness),
                    rgba,
                });
            }
            Element::Spacer { .. } => {}
            // Live widgets have no static frame until preprocessing replaces them.
            Element::MapWidget { rect, .. } => placeholder(*rect, Some("Map"), &mut out),
            Element::Video { rect, .. } => placeholder(*rect, Some("Video"), &mut out),
            Element::Placeholder { rect, label } => placeholder(*rect, Some(label), &mut out),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::tree::{Backdrop, SectionNode};
    use crate::config::model::SectionType;

    fn tree(elements: Vec<Element>) -> LayoutTree {
        LayoutTree {
            width: 100,
            height: 100,
            backdrop: Backdrop { color: "#fff".into(), gradient: None },
            sections: vec![SectionNode {
                id: "s".into(),
                section_type: SectionType::Custom,
                bx: ResolvedBox::new(0.0, 0.0, 100.0, 100.0),
                elements,
            }],
        }
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Rgba::parse_hex("#fff"), Some(Rgba::WHITE));
        assert_eq!(Rgba::parse_hex("#2563eb"), Some(Rgba(0x25, 0x63, 0xeb, 255)));
        assert_eq!(Rgba::parse_hex("#00000080"), Some(Rgba(0, 0, 0, 128)));
        assert_eq!(Rgba::parse_hex("red"), None);
        assert_eq!(Rgba::parse_hex("#12345"), None);
    }

    #[test]
    fn backdrop_is_painted_first() {
        let list = build_display_list(&tree(vec![]));
        assert_eq!(list.len(), 1);
        assert!(matches!(list[0], PaintCommand::SolidRect { rgba: Rgba::WHITE, .. }));
    }

    #[test]
    fn centered_text_is_offset() {
        let el = Element::Text {
            rect: ResolvedBox::new(0.0, 0.0, 100.0, 20.0),
            lines: vec!["ab".into()],
            font_size: 10.0,
            color: "#000".into(),
            align: TextAlign::Center,
        };
        let list = build_display_list(&tree(vec![el]));
        // two chars at 6px each leave 88px, split evenly
        assert!(matches!(&list[1], PaintCommand::Glyphs { x, .. } if *x == 44.0));
    }

    #[test]
    fn unresolved_dynamic_content_is_hatched() {
        let el = Element::Video { rect: ResolvedBox::new(0.0, 0.0, 50.0, 50.0), src: "v.mp4".into(), poster: None, autoplay: true };
        let list = build_display_list(&tree(vec![el]));
        assert!(list.iter().any(|c| matches!(c, PaintCommand::Hatch { .. })));
    }
}
