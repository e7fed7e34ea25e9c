use crate::foundation::core::{Canvas, Point};
use crate::raster::text::TextRenderer;
use crate::timing::word::WordTimestamp;

/// Horizontal inset when the active word effect jitters (shake needs room to move).
pub const SHAKE_PADDING_PX: f64 = 8.0;
/// Horizontal inset for every other word effect.
pub const DEFAULT_PADDING_PX: f64 = 5.0;
/// Gap between stacked word lines.
pub const WORD_LINE_SPACING_PX: f64 = 8.0;

/// Where one word is drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct WordPlacement {
    /// Index into the caption's word list.
    pub word_index: usize,
    /// Trimmed word text.
    pub text: String,
    /// Middle-middle anchor of the word.
    pub center: Point,
    /// Advance width.
    pub width: f64,
}

/// Result of [`layout_words`].
#[derive(Clone, Debug, PartialEq)]
pub struct WordLayout {
    pub placements: Vec<WordPlacement>,
    pub line_count: usize,
    /// Height of one line ("Ay" ink height).
    pub line_height: f64,
}

/// Wrap `words` into centered lines.
///
/// Lines fit within `0.9 * width - 2 * padding`; a word wider than that still gets a line. The
/// block is centered vertically on `center_y`, then moved so its edges stay inside
/// `[padding + line_height / 2, height - padding - line_height / 2]`.
pub fn layout_words(
    words: &[WordTimestamp],
    canvas: Canvas,
    center_y: f64,
    padding: f64,
    renderer: &TextRenderer,
    size_px: f32,
) -> WordLayout {
    let width = f64::from(canvas.width);
    let height = f64::from(canvas.height);
    let max_line_width = (width * 0.9).floor() - 2.0 * padding;
    let space = f64::from(renderer.measure(" ", size_px));
    let line_height = f64::from(renderer.line_height(size_px));

    let mut lines: Vec<Vec<(usize, String, f64)>> = Vec::new();
    let mut current: Vec<(usize, String, f64)> = Vec::new();
    let mut current_width = 0.0;
    for (i, w) in words.iter().enumerate() {
        let text = w.text.trim();
        if text.is_empty() {
            continue;
        }
        let ww = f64::from(renderer.measure(text, size_px));
        let candidate = current_width + if current.is_empty() { 0.0 } else { space } + ww;
        if current.is_empty() || candidate <= max_line_width {
            current.push((i, text.to_owned(), ww));
            current_width = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push((i, text.to_owned(), ww));
            current_width = ww;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    let n = lines.len() as f64;
    let total_height = n * line_height + (n - 1.0).max(0.0) * WORD_LINE_SPACING_PX;
    let safe_top = padding + line_height / 2.0;
    let safe_bottom = height - padding - line_height / 2.0;
    let mut block_center = center_y;
    if block_center + total_height / 2.0 > safe_bottom {
        block_center = safe_bottom - total_height / 2.0;
    }
    if block_center - total_height / 2.0 < safe_top {
        block_center = safe_top + total_height / 2.0;
    }
    let block_top = block_center - total_height / 2.0;

    let mut placements = Vec::new();
    for (li, line) in lines.iter().enumerate() {
        let line_width: f64 =
            line.iter().map(|(_, _, w)| w).sum::<f64>() + space * (line.len() as f64 - 1.0);
        let y = block_top + li as f64 * (line_height + WORD_LINE_SPACING_PX) + line_height / 2.0;
        let mut x = ((width - line_width) / 2.0).floor();
        for (word_index, text, ww) in line {
            let cx = (x + ww / 2.0).clamp(ww / 2.0, (width - ww / 2.0).max(ww / 2.0));
            placements.push(WordPlacement {
                word_index: *word_index,
                text: text.clone(),
                center: Point::new(cx, y),
                width: *ww,
            });
            x += ww + space;
        }
    }

    WordLayout {
        placements,
        line_count: lines.len(),
        line_height,
    }
}
