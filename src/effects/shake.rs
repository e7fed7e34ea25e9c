use std::f64::consts::PI;

use crate::foundation::core::Point;
use crate::foundation::error::CaptionResult;
use crate::foundation::math::{Rng64, stable_hash64};
use crate::raster::frame::FrameRGBA;

use super::{Effect, PrepareParams, TransformParams, prepared};

/// Multi-frequency jitter of the whole line.
#[derive(Debug, Default)]
pub struct Shake {
    state: Option<ShakeState>,
}

/// `(frequency_hz, amplitude_scale)` of the summed sine components.
const COMPONENTS: [(f64, f64); 3] = [(8.0, 1.0), (15.0, 0.6), (25.0, 0.3)];
const MAX_AMPLITUDE_PX: f64 = 8.0;
const NOISE_FACTOR: f64 = 0.15;

#[derive(Clone, Debug, PartialEq)]
struct ShakeState {
    fps: f64,
    seed: u64,
    /// Per-component `(x_phase, y_phase)`.
    phases: [(f64, f64); 3],
}

impl ShakeState {
    fn offset(&self, frame: u64, strength: f64) -> (f64, f64) {
        if strength <= 0.0 {
            return (0.0, 0.0);
        }
        let t = frame as f64 / self.fps;
        let base = strength * MAX_AMPLITUDE_PX;
        let (mut x, mut y) = (0.0, 0.0);
        for ((freq, scale), (px, py)) in COMPONENTS.iter().zip(self.phases.iter()) {
            let w = 2.0 * PI * freq * t;
            x += (w + px).sin() * base * scale;
            y += (w + py).sin() * base * scale;
        }
        let mut rng = Rng64::for_frame(self.seed, frame);
        x += (rng.next_f64() - 0.5) * base * NOISE_FACTOR;
        y += (rng.next_f64() - 0.5) * base * NOISE_FACTOR;
        (x, y)
    }
}

impl Effect for Shake {
    fn slug(&self) -> &'static str {
        "shake"
    }

    fn display_name(&self) -> &'static str {
        "Shake"
    }

    fn default_intensity(&self) -> u8 {
        50
    }

    fn prepare(&mut self, params: &PrepareParams<'_>) -> CaptionResult<()> {
        let seed = stable_hash64(0x5A4E, params.text);
        let mut rng = Rng64::new(seed);
        let mut phases = [(0.0, 0.0); 3];
        for p in &mut phases {
            *p = (rng.range_f64(0.0, 2.0 * PI), rng.range_f64(0.0, 2.0 * PI));
        }
        self.state = Some(ShakeState {
            fps: if params.fps > 0.0 { params.fps } else { 12.0 },
            seed,
            phases,
        });
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
        let (dx, dy) = state.offset(params.frame_index, params.strength());
        let at = Point::new(
            (params.anchor.x + dx).trunc(),
            (params.anchor.y + dy).trunc(),
        );
        let mut layer = input.blank_like();
        params
            .renderer
            .draw(&mut layer, params.text, at, params.text_anchor, params.style);
        Ok(layer)
    }
}
