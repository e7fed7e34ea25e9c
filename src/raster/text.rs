use std::fmt;
use std::path::Path;

use anyhow::Context;
use fontdue::{Font, FontSettings};

use crate::foundation::core::Point;
use crate::foundation::error::{CaptionError, CaptionResult};
use crate::raster::color::Rgba8;
use crate::raster::draw::blend_pixel;
use crate::raster::frame::FrameRGBA;

/// Vertical gap between wrapped caption lines, in pixels.
pub const BLOCK_LINE_SPACING_PX: f64 = 4.0;

/// Where a text position sits relative to the drawn line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAnchor {
    /// Horizontally centered, `y` is the baseline.
    MiddleBaseline,
    /// Horizontally centered, `y` is halfway between ascender and descender.
    MiddleMiddle,
    /// Horizontally centered, `y` is the ascender line.
    MiddleTop,
    /// `x` is the pen start, `y` is the baseline.
    LeftBaseline,
}

/// Font size, fill and outline used for one draw call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    /// Pixel size.
    pub size_px: f32,
    /// Glyph fill.
    pub fill: Rgba8,
    /// Outline (stroke) color.
    pub outline: Rgba8,
    /// Outline thickness in pixels; 0 disables it.
    pub outline_width: u32,
}

impl TextStyle {
    pub fn with_fill(self, fill: Rgba8) -> Self {
        Self { fill, ..self }
    }

    pub fn with_outline(self, outline: Rgba8) -> Self {
        Self { outline, ..self }
    }

    pub fn with_size(self, size_px: f32) -> Self {
        Self { size_px, ..self }
    }

    /// Fill and outline alpha multiplied by `factor`.
    pub fn faded(self, factor: f32) -> Self {
        Self {
            fill: self.fill.scale_alpha(factor),
            outline: self.outline.scale_alpha(factor),
            ..self
        }
    }
}

enum Face {
    Font(Box<Font>),
    Block,
}

/// Text measurement and rasterization.
///
/// Backed either by a TrueType/OpenType face (`fontdue`) or by the built-in block face, which
/// draws every visible character as a solid box on a fixed advance. The block face needs no font
/// file and gives identical pixels everywhere, so it is what tests and fontless renders use.
pub struct TextRenderer {
    face: Face,
}

impl fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let face = match self.face {
            Face::Font(_) => "font",
            Face::Block => "block",
        };
        f.debug_struct("TextRenderer").field("face", &face).finish()
    }
}

/// Rasterized coverage of one line relative to its pen origin.
struct Coverage {
    width: usize,
    height: usize,
    data: Vec<u8>,
    /// Left edge relative to the pen start.
    left: i32,
    /// Top edge relative to the baseline (negative is above).
    top: i32,
}

const BLOCK_ADVANCE: f32 = 0.6;
const BLOCK_ASCENT: f32 = 0.8;
const BLOCK_DESCENT: f32 = 0.2;
const BLOCK_CAP: f32 = 0.7;

impl TextRenderer {
    /// The built-in block face.
    pub fn block() -> Self {
        Self { face: Face::Block }
    }

    /// Parse a TrueType/OpenType face.
    pub fn from_font_bytes(bytes: &[u8]) -> CaptionResult<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| CaptionError::config(format!("parse font: {e}")))?;
        Ok(Self {
            face: Face::Font(Box::new(font)),
        })
    }

    /// Read and parse a font file.
    pub fn from_font_file(path: &Path) -> CaptionResult<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("read font {}", path.display()))?;
        Self::from_font_bytes(&bytes)
    }

    /// Load `path` if given, falling back to the block face (with a warning on failure).
    pub fn load_or_block(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::block();
        };
        match Self::from_font_file(path) {
            Ok(r) => r,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "font unavailable, using block face");
                Self::block()
            }
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self.face, Face::Block)
    }

    /// Horizontal advance of one character.
    pub fn advance(&self, ch: char, size: f32) -> f32 {
        match &self.face {
            Face::Font(font) => font.metrics(ch, size).advance_width,
            Face::Block => BLOCK_ADVANCE * size,
        }
    }

    /// Advance width of a single line of text, including kerning.
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        let mut width = 0.0;
        let mut prev = None;
        for ch in text.chars() {
            width += self.kern(prev, ch, size) + self.advance(ch, size);
            prev = Some(ch);
        }
        width
    }

    fn kern(&self, prev: Option<char>, ch: char, size: f32) -> f32 {
        match (&self.face, prev) {
            (Face::Font(font), Some(p)) => font.horizontal_kern(p, ch, size).unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Distance from baseline to the ascender line.
    pub fn ascent(&self, size: f32) -> f32 {
        match &self.face {
            Face::Font(font) => font
                .horizontal_line_metrics(size)
                .map_or(size * BLOCK_ASCENT, |m| m.ascent),
            Face::Block => size * BLOCK_ASCENT,
        }
    }

    /// Distance from baseline to the descender line (positive).
    pub fn descent(&self, size: f32) -> f32 {
        match &self.face {
            Face::Font(font) => font
                .horizontal_line_metrics(size)
                .map_or(size * BLOCK_DESCENT, |m| m.descent.abs()),
            Face::Block => size * BLOCK_DESCENT,
        }
    }

    /// Height of the inked pixels of `text`, 0 when nothing is visible.
    pub fn ink_height(&self, text: &str, size: f32) -> f32 {
        self.rasterize(text, size).map_or(0.0, |c| c.height as f32)
    }

    /// Height used to stack wrapped lines: the ink height of "Ay".
    pub fn line_height(&self, size: f32) -> f32 {
        self.ink_height("Ay", size)
    }

    /// Greedy word wrap. A word wider than `max_width` gets a line of its own.
    pub fn wrap(&self, text: &str, size: f32, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        for word in text.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if self.measure(&candidate, size) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    /// Pen start and baseline for a single line drawn at `at` with `anchor`.
    pub fn origin(&self, text: &str, at: Point, anchor: TextAnchor, size: f32) -> (f64, f64) {
        let width = f64::from(self.measure(text, size));
        let ascent = f64::from(self.ascent(size));
        let descent = f64::from(self.descent(size));
        match anchor {
            TextAnchor::MiddleBaseline => (at.x - width / 2.0, at.y),
            TextAnchor::MiddleMiddle => (at.x - width / 2.0, at.y + (ascent - descent) / 2.0),
            TextAnchor::MiddleTop => (at.x - width / 2.0, at.y + ascent),
            TextAnchor::LeftBaseline => (at.x, at.y),
        }
    }

    /// Draw one line of text with its outline.
    pub fn draw(
        &self,
        frame: &mut FrameRGBA,
        text: &str,
        at: Point,
        anchor: TextAnchor,
        style: &TextStyle,
    ) {
        let Some(cov) = self.rasterize(text, style.size_px) else {
            return;
        };
        let (pen_x, baseline) = self.origin(text, at, anchor, style.size_px);
        let ox = pen_x.round() as i64 + i64::from(cov.left);
        let oy = baseline.round() as i64 + i64::from(cov.top);

        if style.outline_width > 0 && style.outline.a > 0 {
            let w = style.outline_width;
            let stroke = dilate(&cov, w);
            blit(frame, &stroke, ox - i64::from(w), oy - i64::from(w), style.outline);
        }
        blit(frame, &cov, ox, oy, style.fill);
    }

    /// Draw `text` wrapped to `max_width`, stacking lines with [`BLOCK_LINE_SPACING_PX`].
    ///
    /// The vertical part of `anchor` positions the whole block: baseline anchors put its bottom
    /// on `at.y`, middle anchors center it there, top anchors hang it from there.
    pub fn draw_block(
        &self,
        frame: &mut FrameRGBA,
        text: &str,
        at: Point,
        anchor: TextAnchor,
        style: &TextStyle,
        max_width: f32,
    ) {
        let lines = self.wrap(text, style.size_px, max_width);
        if lines.is_empty() {
            return;
        }
        let line_h = f64::from(self.line_height(style.size_px));
        let n = lines.len() as f64;
        let total = n * line_h + (n - 1.0) * BLOCK_LINE_SPACING_PX;
        let start_y = match anchor {
            TextAnchor::MiddleBaseline | TextAnchor::LeftBaseline => at.y - total,
            TextAnchor::MiddleMiddle => at.y - total / 2.0,
            TextAnchor::MiddleTop => at.y,
        };
        let line_anchor = match anchor {
            TextAnchor::LeftBaseline => TextAnchor::LeftBaseline,
            _ => TextAnchor::MiddleTop,
        };
        let ascent = f64::from(self.ascent(style.size_px));
        for (i, line) in lines.iter().enumerate() {
            let mut y = start_y + (i as f64) * (line_h + BLOCK_LINE_SPACING_PX);
            if line_anchor == TextAnchor::LeftBaseline {
                y += ascent;
            }
            self.draw(frame, line, Point::new(at.x, y), line_anchor, style);
        }
    }

    fn rasterize(&self, text: &str, size: f32) -> Option<Coverage> {
        struct Placed {
            x: i32,
            y: i32,
            w: usize,
            h: usize,
            bitmap: Vec<u8>,
        }

        let mut placed = Vec::new();
        let mut pen = 0.0f32;
        let mut prev = None;
        for ch in text.chars() {
            pen += self.kern(prev, ch, size);
            prev = Some(ch);
            match &self.face {
                Face::Font(font) => {
                    let (m, bitmap) = font.rasterize(ch, size);
                    if m.width > 0 && m.height > 0 {
                        placed.push(Placed {
                            x: pen.round() as i32 + m.xmin,
                            y: -(m.height as i32 + m.ymin),
                            w: m.width,
                            h: m.height,
                            bitmap,
                        });
                    }
                    pen += m.advance_width;
                }
                Face::Block => {
                    if !ch.is_whitespace() {
                        let inset = (size * 0.05).round() as i32;
                        let w = ((size * (BLOCK_ADVANCE - 0.1)).round() as usize).max(1);
                        let cap = (size * BLOCK_CAP).round() as i32;
                        let below = if "gjpqy,;".contains(ch) {
                            (size * BLOCK_DESCENT).round() as i32
                        } else {
                            0
                        };
                        let h = (cap + below).max(1) as usize;
                        placed.push(Placed {
                            x: pen.round() as i32 + inset,
                            y: -cap,
                            w,
                            h,
                            bitmap: vec![255; w * h],
                        });
                    }
                    pen += size * BLOCK_ADVANCE;
                }
            }
        }

        let left = placed.iter().map(|g| g.x).min()?;
        let top = placed.iter().map(|g| g.y).min()?;
        let right = placed.iter().map(|g| g.x + g.w as i32).max()?;
        let bottom = placed.iter().map(|g| g.y + g.h as i32).max()?;
        let width = (right - left) as usize;
        let height = (bottom - top) as usize;
        let mut data = vec![0u8; width * height];
        for g in &placed {
            let gx = (g.x - left) as usize;
            let gy = (g.y - top) as usize;
            for row in 0..g.h {
                let dst = (gy + row) * width + gx;
                let src = row * g.w;
                for col in 0..g.w {
                    let d = &mut data[dst + col];
                    *d = (*d).max(g.bitmap[src + col]);
                }
            }
        }
        Some(Coverage {
            width,
            height,
            data,
            left,
            top,
        })
    }
}

/// Grow coverage by a disk of `radius` pixels (max filter).
fn dilate(cov: &Coverage, radius: u32) -> Coverage {
    let r = radius as i32;
    let width = cov.width + 2 * radius as usize;
    let height = cov.height + 2 * radius as usize;
    let offsets: Vec<(i32, i32)> = (-r..=r)
        .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
        .filter(|(dx, dy)| dx * dx + dy * dy <= r * r)
        .collect();

    let mut data = vec![0u8; width * height];
    for sy in 0..cov.height {
        for sx in 0..cov.width {
            let v = cov.data[sy * cov.width + sx];
            if v == 0 {
                continue;
            }
            for &(dx, dy) in &offsets {
                let x = (sx as i32 + r + dx) as usize;
                let y = (sy as i32 + r + dy) as usize;
                let d = &mut data[y * width + x];
                *d = (*d).max(v);
            }
        }
    }
    Coverage {
        width,
        height,
        data,
        left: cov.left - r,
        top: cov.top - r,
    }
}

fn blit(frame: &mut FrameRGBA, cov: &Coverage, ox: i64, oy: i64, color: Rgba8) {
    for row in 0..cov.height {
        for col in 0..cov.width {
            let c = cov.data[row * cov.width + col];
            if c != 0 {
                blend_pixel(frame, ox + col as i64, oy + row as i64, color, c);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/text.rs"]
mod tests;
