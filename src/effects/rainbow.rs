use crate::foundation::core::Point;
use crate::foundation::error::CaptionResult;
use crate::raster::color::Rgba8;
use crate::raster::frame::FrameRGBA;
use crate::raster::text::{TextAnchor, TextStyle};

use super::{Effect, PrepareParams, TransformParams, char_origins, prepared};

/// Per-character hues cycling over time.
#[derive(Debug, Default)]
pub struct Rainbow {
    state: Option<RainbowState>,
}

#[derive(Clone, Debug, PartialEq)]
struct RainbowState {
    fps: f64,
}

impl RainbowState {
    /// Hue in `[0, 1)` of the `visible_index`-th non-blank character.
    fn hue(&self, visible_index: usize, visible_count: usize, frame: u64, strength: f64) -> f64 {
        let spread = if visible_count > 1 {
            visible_index as f64 / (visible_count - 1) as f64
        } else {
            0.0
        };
        let cycle = strength * 3.0;
        (spread + frame as f64 / self.fps * cycle).rem_euclid(1.0)
    }
}

impl Effect for Rainbow {
    fn slug(&self) -> &'static str {
        "rainbow"
    }

    fn display_name(&self) -> &'static str {
        "Rainbow"
    }

    fn default_intensity(&self) -> u8 {
        80
    }

    fn prepare(&mut self, params: &PrepareParams<'_>) -> CaptionResult<()> {
        self.state = Some(RainbowState {
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
        let visible = chars.iter().filter(|(c, _)| !c.is_whitespace()).count();
        let mut vi = 0;
        for (ch, x) in chars {
            if ch.is_whitespace() {
                continue;
            }
            let h = state.hue(vi, visible, params.frame_index, params.strength());
            vi += 1;
            let style = TextStyle {
                fill: Rgba8::from_hsv(h, 1.0, 1.0),
                outline: Rgba8::from_hsv(h, 1.0, 0.5),
                ..*params.style
            };
            params.renderer.draw(
                &mut layer,
                ch.encode_utf8(&mut [0; 4]),
                Point::new(x, baseline),
                TextAnchor::LeftBaseline,
                &style,
            );
        }
        Ok(layer)
    }
}
