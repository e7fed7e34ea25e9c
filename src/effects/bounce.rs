use std::f64::consts::PI;

use crate::foundation::core::Point;
use crate::foundation::error::CaptionResult;
use crate::raster::frame::FrameRGBA;
use crate::raster::text::TextAnchor;

use super::{Effect, PrepareParams, TransformParams, char_origins, prepared};

/// Letters drop in and bounce to rest, staggered left to right.
#[derive(Debug, Default)]
pub struct Bounce {
    state: Option<BounceState>,
}

#[derive(Clone, Debug, PartialEq)]
struct BounceState {
    fps: f64,
    bounce_frames: u64,
    /// Frames the last character waits before starting.
    max_delay_frames: u64,
}

impl BounceState {
    fn char_delay(&self, index: usize, count: usize) -> u64 {
        if count <= 1 {
            return 0;
        }
        ((index as f64 / (count - 1) as f64) * self.max_delay_frames as f64) as u64
    }

    /// Vertical offset (negative is up) of a character `char_frame` frames into its bounce.
    fn offset(&self, char_frame: u64, strength: f64) -> f64 {
        if char_frame >= self.bounce_frames {
            return 0.0;
        }
        let t = char_frame as f64 / self.fps;
        let height = 100.0 + 50.0 * strength;
        -height * (-3.0 * t).exp() * (3.0 * PI * t).sin().abs()
    }
}

impl Effect for Bounce {
    fn slug(&self) -> &'static str {
        "bounce"
    }

    fn display_name(&self) -> &'static str {
        "Bounce"
    }

    fn default_intensity(&self) -> u8 {
        60
    }

    fn prepare(&mut self, params: &PrepareParams<'_>) -> CaptionResult<()> {
        let fps = params.fps.max(1.0);
        let strength = f64::from(params.intensity) / 100.0;
        let total = (params.duration_sec * params.fps).ceil().max(1.0);
        let bounce_frames = ((total * (0.5 + 0.4 * strength)) as u64).max(1);
        let max_delay_frames = ((bounce_frames as f64 * 0.3) as u64).max(1);
        self.state = Some(BounceState {
            fps,
            bounce_frames,
            max_delay_frames,
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
        let count = chars.len();
        for (i, (ch, x)) in chars.into_iter().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let char_frame = params
                .frame_index
                .saturating_sub(state.char_delay(i, count));
            let dy = state.offset(char_frame, params.strength());
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::plain_layer;
    use crate::effects::test_support::{caption_params, layer};

    fn prepared_bounce(intensity: u8) -> Bounce {
        let mut b = Bounce::default();
        b.prepare(&PrepareParams {
            fps: 12.0,
            duration_sec: 2.0,
            text: "HELLO",
            intensity,
        })
        .unwrap();
        b
    }

    #[test]
    fn timing_scales_with_intensity() {
        let b = prepared_bounce(100);
        let s = b.state.as_ref().unwrap();
        // 24 frames * 0.9
        assert_eq!(s.bounce_frames, 21);
        assert_eq!(s.max_delay_frames, 6);
        assert_eq!(s.char_delay(0, 5), 0);
        assert_eq!(s.char_delay(4, 5), 6);
    }

    #[test]
    fn letters_start_at_rest_and_settle() {
        let b = prepared_bounce(60);
        let s = b.state.as_ref().unwrap();
        assert_eq!(s.offset(0, 0.6), 0.0);
        assert!(s.offset(1, 0.6) < 0.0);
        assert_eq!(s.offset(s.bounce_frames, 0.6), 0.0);
    }

    #[test]
    fn mid_bounce_layer_differs_from_plain_text() {
        let b = prepared_bounce(60);
        let input = layer();
        let p = caption_params("HELLO", 2, 60);
        let out = b.transform(&input, &p).unwrap();
        assert_ne!(out, plain_layer(&input, &p));
        let settled = b.transform(&input, &caption_params("HELLO", 200, 60)).unwrap();
        assert_eq!(settled, plain_layer(&input, &caption_params("HELLO", 200, 60)));
    }

    #[test]
    fn unprepared_transform_is_an_error() {
        let b = Bounce::default();
        assert!(b.transform(&layer(), &caption_params("HI", 0, 60)).is_err());
    }
}
