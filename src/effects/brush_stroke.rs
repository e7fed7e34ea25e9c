use crate::foundation::error::CaptionResult;
use crate::foundation::math::{Rng64, mul_div255_u8, stable_hash64};
use crate::raster::frame::FrameRGBA;

use super::{Effect, PrepareParams, TransformParams, prepared};

/// Caption painted on left to right behind a soft, streaky brush edge.
#[derive(Debug, Default)]
pub struct BrushStroke {
    state: Option<BrushState>,
}

#[derive(Clone, Debug, PartialEq)]
struct BrushState {
    fps: f64,
    /// Seconds from caption start until the text is fully painted.
    stroke_sec: f64,
    seed: u64,
}

/// Margin around the text box covered by the reveal mask, in px.
const MASK_PAD_X: u32 = 20;
const MASK_PAD_Y: u32 = 10;

impl BrushState {
    fn new(text: &str, fps: f64, duration_sec: f64, strength: f64) -> Self {
        let duration = duration_sec.max(0.0);
        // Stronger strokes finish sooner: 80% of the caption at most, 40% at least.
        let speed = 0.4 + 0.4 * strength;
        Self {
            fps: if fps > 0.0 { fps } else { 12.0 },
            stroke_sec: (duration * speed).max(0.5).min(duration),
            seed: stable_hash64(0xB125, text),
        }
    }

    /// Eased reveal fraction at caption-relative `frame`.
    fn progress(&self, frame: u64) -> f64 {
        let t = frame as f64 / self.fps;
        if t >= self.stroke_sec {
            return 1.0;
        }
        let p = t / self.stroke_sec.max(0.1);
        let eased = if p < 0.5 {
            4.0 * p * p * p
        } else {
            1.0 - 4.0 * (1.0 - p).powi(3)
        };
        eased.clamp(0.0, 1.0)
    }
}

/// `width x height` coverage mask revealing `progress` of the width, with a feathered edge and
/// a few brighter bristle streaks.
fn reveal_mask(width: u32, height: u32, progress: f64, rng: &mut Rng64) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    let mut mask = vec![0u8; w * h];
    if progress <= 0.0 || w == 0 || h == 0 {
        return mask;
    }
    let reveal = (f64::from(width) * progress) as usize;
    let column = |mask: &mut [u8], x: usize, value: u8| {
        for y in 0..h {
            mask[y * w + x] = value;
        }
    };
    for x in 0..=reveal.min(w - 1) {
        column(&mut mask, x, 255);
    }
    let edge = ((f64::from(width) * 0.04) as usize).max(6);
    for i in 0..edge {
        let x = reveal + i;
        if x >= w {
            break;
        }
        let fade = (1.0 - i as f64 / edge as f64).powf(1.5);
        column(&mut mask, x, (255.0 * fade) as u8);
    }

    if progress > 0.1 {
        let streaks = ((reveal as f64 * 0.015) as usize).max(2);
        let (lo, hi) = ((h / 6) as i32, (h / 3) as i32);
        for _ in 0..streaks {
            let x = rng.range_i32(0, reveal.min(w - 1) as i32) as usize;
            let len = rng.range_i32(lo, hi) as usize;
            let y0 = rng.range_i32(0, (h - len.min(h)) as i32) as usize;
            let opacity = rng.range_i32(180, 220) as u8;
            for y in y0..(y0 + len).min(h) {
                let m = &mut mask[y * w + x];
                *m = (*m).max(opacity);
            }
        }
    }
    mask
}

impl Effect for BrushStroke {
    fn slug(&self) -> &'static str {
        "brush-stroke"
    }

    fn display_name(&self) -> &'static str {
        "Brush Stroke"
    }

    fn default_intensity(&self) -> u8 {
        75
    }

    fn prepare(&mut self, params: &PrepareParams<'_>) -> CaptionResult<()> {
        self.state = Some(BrushState::new(
            params.text,
            params.fps,
            params.duration_sec,
            f64::from(params.intensity) / 100.0,
        ));
        Ok(())
    }

    fn transform(
        &self,
        input: &FrameRGBA,
        params: &TransformParams<'_>,
    ) -> CaptionResult<FrameRGBA> {
        let state = prepared(&self.state, self.slug())?;
        if params.text.is_empty() || params.intensity == 0 {
            return Ok(input.clone());
        }
        let mut painted = input.blank_like();
        params.renderer.draw_block(
            &mut painted,
            params.text,
            params.anchor,
            params.text_anchor,
            params.style,
            input.width as f32 * 0.9,
        );

        let progress = state.progress(params.frame_index);
        if progress >= 1.0 {
            return Ok(painted);
        }
        let Some(bounds) = painted.content_bounds().filter(|_| progress > 0.0) else {
            return Ok(input.blank_like());
        };

        let mask_w = (bounds.x1 - bounds.x0) as u32 + 2 * MASK_PAD_X;
        let mask_h = (bounds.y1 - bounds.y0) as u32 + 2 * MASK_PAD_Y;
        let mask_x = (bounds.x0 as u32).saturating_sub(MASK_PAD_X);
        let mask_y = (bounds.y0 as u32).saturating_sub(MASK_PAD_Y);
        let mut rng = Rng64::for_frame(state.seed, params.frame_index);
        let mask = reveal_mask(mask_w, mask_h, progress, &mut rng);

        for y in 0..painted.height {
            for x in 0..painted.width {
                let coverage = match (x.checked_sub(mask_x), y.checked_sub(mask_y)) {
                    (Some(mx), Some(my)) if mx < mask_w && my < mask_h => {
                        mask[(my * mask_w + mx) as usize]
                    }
                    _ => 0,
                };
                if coverage == 255 {
                    continue;
                }
                let px = painted
                    .pixel(x, y)
                    .map(|c| mul_div255_u8(u16::from(c), u16::from(coverage)));
                painted.put_pixel(x, y, px);
            }
        }
        Ok(painted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::test_support::{caption_params, layer};

    #[test]
    fn stroke_length_follows_intensity_and_caption() {
        let slow = BrushState::new("HI", 12.0, 2.0, 0.0);
        let fast = BrushState::new("HI", 12.0, 2.0, 1.0);
        assert!((slow.stroke_sec - 0.8).abs() < 1e-9);
        assert!((fast.stroke_sec - 1.6).abs() < 1e-9);
        // Floor of 0.5s, never past the caption end.
        assert!((BrushState::new("HI", 12.0, 1.0, 0.0).stroke_sec - 0.5).abs() < 1e-9);
        assert!((BrushState::new("HI", 12.0, 0.3, 1.0).stroke_sec - 0.3).abs() < 1e-9);
    }

    #[test]
    fn progress_eases_from_zero_to_one() {
        let s = BrushState::new("HI", 10.0, 2.0, 0.5);
        // 1.2s stroke: 12 frames at 10 fps.
        assert_eq!(s.progress(0), 0.0);
        assert!((s.progress(6) - 0.5).abs() < 1e-9);
        assert!(s.progress(3) < 0.25);
        assert_eq!(s.progress(12), 1.0);
        let ps: Vec<f64> = (0..=12).map(|f| s.progress(f)).collect();
        assert!(ps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn mask_reveals_left_part_with_feathered_edge() {
        let mut rng = Rng64::new(1);
        let mask = reveal_mask(100, 10, 0.05, &mut rng);
        let at = |x: usize, y: usize| mask[y * 100 + x];
        assert_eq!(at(0, 0), 255);
        assert_eq!(at(5, 9), 255);
        assert!(at(7, 0) < 255 && at(7, 0) > 0);
        assert_eq!(at(11, 0), 0);
        assert_eq!(at(99, 5), 0);
        assert!(reveal_mask(100, 10, 0.0, &mut rng).iter().all(|&m| m == 0));
    }

    #[test]
    fn text_is_painted_on_left_to_right() {
        let mut b = BrushStroke::default();
        b.prepare(&PrepareParams {
            fps: 12.0,
            duration_sec: 2.0,
            text: "PAINT ME",
            intensity: 75,
        })
        .unwrap();
        let input = layer();
        let at = |f: u64| b.transform(&input, &caption_params("PAINT ME", f, 75)).unwrap();

        assert!(at(0).is_blank());
        let full = at(24);
        let half = at(8);
        let fb = full.content_bounds().unwrap();
        let hb = half.content_bounds().unwrap();
        assert_eq!(hb.x0, fb.x0);
        assert!(hb.x1 < fb.x1, "{hb:?} vs {fb:?}");
        assert_eq!(at(8), half);
    }
}
