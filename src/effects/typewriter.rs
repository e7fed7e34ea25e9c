use crate::foundation::error::CaptionResult;
use crate::foundation::math::{Rng64, stable_hash64};
use crate::raster::frame::FrameRGBA;

use super::{Effect, PrepareParams, TransformParams, plain_layer, prepared};

/// Characters appear one at a time with a human rhythm and a blinking cursor.
#[derive(Debug, Default)]
pub struct Typewriter {
    state: Option<TypewriterState>,
}

const START_DELAY_SEC: f64 = 0.2;
const PUNCTUATION_PAUSE_SEC: f64 = 0.3;
const SPACE_PAUSE_SEC: f64 = 0.1;
/// Typing must finish within this share of the caption.
const FIT_FRACTION: f64 = 0.9;
const CURSOR_BLINK_FRAMES: u64 = 20;
const CURSOR: char = '|';

#[derive(Clone, Debug, PartialEq)]
struct TypewriterState {
    /// Caption-relative frame at which each character appears.
    char_frames: Vec<u64>,
}

impl TypewriterState {
    fn schedule(text: &str, fps: f64, duration_sec: f64, strength: f64) -> Self {
        if text.is_empty() || duration_sec <= 0.0 {
            return Self {
                char_frames: Vec::new(),
            };
        }
        let cps = 2.0 + 6.0 * strength;
        let mut rng = Rng64::new(stable_hash64(0x7E7E, text));
        let mut t = START_DELAY_SEC;
        let mut times = Vec::with_capacity(text.len());
        for ch in text.chars() {
            times.push(t);
            let mut delay = 1.0 / cps;
            if ".,!?;:".contains(ch) {
                delay += PUNCTUATION_PAUSE_SEC;
            } else if ch == ' ' {
                delay += SPACE_PAUSE_SEC;
            }
            t += delay * rng.range_f64(0.8, 1.2);
        }
        let available = duration_sec * FIT_FRACTION;
        let scale = if t > available { available / t } else { 1.0 };
        let char_frames = times
            .into_iter()
            .map(|secs| ((secs * fps) as u64 as f64 * scale) as u64)
            .collect();
        Self { char_frames }
    }

    fn visible_chars(&self, frame: u64) -> usize {
        self.char_frames.iter().take_while(|&&f| frame >= f).count()
    }
}

impl Effect for Typewriter {
    fn slug(&self) -> &'static str {
        "typewriter"
    }

    fn display_name(&self) -> &'static str {
        "Typewriter"
    }

    fn default_intensity(&self) -> u8 {
        70
    }

    fn hides_base_text(&self) -> bool {
        true
    }

    fn prepare(&mut self, params: &PrepareParams<'_>) -> CaptionResult<()> {
        self.state = Some(TypewriterState::schedule(
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
        if state.char_frames.is_empty() {
            return Ok(plain_layer(input, params));
        }

        let total = params.text.chars().count();
        let shown = state.visible_chars(params.frame_index).min(total);
        let mut visible: String = params.text.chars().take(shown).collect();
        if shown < total && (params.frame_index / CURSOR_BLINK_FRAMES) % 2 == 0 {
            visible.push(CURSOR);
        }

        let mut layer = input.blank_like();
        params.renderer.draw(
            &mut layer,
            &visible,
            params.anchor,
            params.text_anchor,
            params.style,
        );
        Ok(layer)
    }
}
