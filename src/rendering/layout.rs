//! Text metrics and vertical stacking inside a section box
//!
//! Glyph metrics are estimated (fixed advance per character) so that the
//! same text always wraps the same way in both renderers.

use super::position::ResolvedBox;
use super::tree::Element;
use crate::sections::TextAlign;

/// Advance width of one character as a fraction of the font size
pub const CHAR_WIDTH_RATIO: f64 = 0.6;
/// Line height as a multiple of the font size
pub const LINE_HEIGHT_RATIO: f64 = 1.3;

pub fn line_height(font_size: f64) -> f64 {
    font_size * LINE_HEIGHT_RATIO
}

pub fn text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * CHAR_WIDTH_RATIO
}

/// Greedy word wrap to `max_width` pixels.
pub fn wrap_text(text: &str, font_size: f64, max_width: f64) -> Vec<String> {
    let char_w = font_size * CHAR_WIDTH_RATIO;
    let chars_per_line = if char_w > 0.0 && max_width >= char_w { (max_width / char_w) as usize } else { 1 };

    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut cur = String::new();
        for word in paragraph.split_whitespace() {
            let cur_len = cur.chars().count();
            if cur_len + word.chars().count() + 1 > chars_per_line && !cur.is_empty() {
                lines.push(cur);
                cur = word.to_string();
            } else {
                if !cur.is_empty() {
                    cur.push(' ');
                }
                cur.push_str(word);
            }
        }
        if !cur.is_empty() {
            lines.push(cur);
        }
    }
    lines
}

/// Cursor that stacks blocks top to bottom inside a box and stops when the
/// box is full.
pub struct Stack {
    area: ResolvedBox,
    cursor: f64,
    gap: f64,
}

impl Stack {
    pub fn new(area: ResolvedBox, gap: f64) -> Self {
        Self { area, cursor: area.top, gap }
    }

    pub fn remaining(&self) -> f64 {
        (self.area.bottom() - self.cursor).max(0.0)
    }

    /// Reserve a full-width block of `height`; `None` once the box is full.
    pub fn block(&mut self, height: f64) -> Option<ResolvedBox> {
        if height <= 0.0 || self.remaining() < height {
            return None;
        }
        let bx = ResolvedBox::new(self.area.left, self.cursor, self.area.width, height);
        self.cursor += height + self.gap;
        Some(bx)
    }

    /// Wrapped text block, truncated to the lines that fit (and `max_lines`).
    pub fn text(
        &mut self,
        text: &str,
        font_size: f64,
        color: &str,
        align: TextAlign,
        max_lines: Option<usize>,
    ) -> Option<Element> {
        let mut lines = wrap_text(text, font_size, self.area.width);
        let fit = (self.remaining() / line_height(font_size)).floor() as usize;
        lines.truncate(fit.min(max_lines.unwrap_or(usize::MAX)));
        if lines.is_empty() {
            return None;
        }
        let rect = self.block(lines.len() as f64 * line_height(font_size))?;
        Some(Element::Text { rect, lines, font_size, color: color.to_string(), align })
    }
}

/// Inner padding for a section box: 5% of its shorter side, at most 24px.
pub fn section_padding(bx: &ResolvedBox) -> f64 {
    (bx.width.min(bx.height) * 0.05).clamp(0.0, 24.0)
}
