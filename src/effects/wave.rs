use crate::foundation::core::Point;
use crate::foundation::error::CaptionResult;
use crate::raster::frame::FrameRGBA;
use crate::raster::text::TextAnchor;

use super::{Effect, PrepareParams, TransformParams, char_origins, prepared};

/// Characters ride a travelling sine wave.
#[derive(Debug, Default)]
pub struct Wave {
    state: Option<WaveState>,
}

const MAX_AMPLITUDE_PX: f64 = 30.0;
/// Phase step between neighbouring characters.
const PHASE_PER_CHAR: f64 = 0.15;
/// Phase advance per second.
const SPEED: f64 = 2.0;

#[derive(Clone, Debug, PartialEq)]
struct WaveState {
    fps: f64,
}

impl WaveState {
    fn offset(&self, char_index: usize, frame: u64, strength: f64) -> f64 {
        let t = frame as f64 / self.fps * SPEED;
        (char_index as f64 * PHASE_PER_CHAR + t).sin() * strength * MAX_AMPLITUDE_PX
    }
}

impl Effect for Wave {
    fn slug(&self) -> &'static str {
        "wave"
    }

    fn display_name(&self) -> &'static str {
        "Wave"
    }

    fn default_intensity(&self) -> u8 {
        60
    }

    fn prepare(&mut self, params: &PrepareParams<'_>) -> CaptionResult<()> {
        self.state = Some(WaveState {
            fps: if params.fps > 0.0 { params.fps } else { 12.0 },
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
        let mut layer = input.blank_like();
        let (chars, baseline) = char_origins(params);
        for (i, (ch, x)) in chars.into_iter().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let dy = state.offset(i, params.frame_index, params.strength());
            params.renderer.draw(
                &mut layer,
                ch.encode_utf8(&mut [0; 4]),
                Point::new(x, baseline + dy),
                TextAnchor::LeftBaseline,
                params.style,
            );
        }
        Ok(layer)
    }
}
