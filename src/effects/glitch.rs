use crate::foundation::core::Point;
use crate::foundation::error::CaptionResult;
use crate::foundation::math::{Rng64, stable_hash64};
use crate::raster::color::Rgba8;
use crate::raster::composite::add_in_place;
use crate::raster::draw::fill_rect;
use crate::raster::frame::FrameRGBA;
use crate::raster::text::TextStyle;

use super::{Effect, PrepareParams, TransformParams, plain_layer, prepared};

/// Intermittent RGB channel split with corrupt blocks.
#[derive(Debug, Default)]
pub struct Glitch {
    state: Option<GlitchState>,
}

#[derive(Clone, Debug, PartialEq)]
struct GlitchState {
    seed: u64,
}

impl Effect for Glitch {
    fn slug(&self) -> &'static str {
        "glitch"
    }

    fn display_name(&self) -> &'static str {
        "Glitch"
    }

    fn default_intensity(&self) -> u8 {
        50
    }

    fn prepare(&mut self, params: &PrepareParams<'_>) -> CaptionResult<()> {
        self.state = Some(GlitchState {
            seed: stable_hash64(0x611C, params.text),
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

        let mut rng = Rng64::for_frame(state.seed, params.frame_index);
        let strength = params.strength();
        if rng.next_f64() >= strength * 0.5 {
            return Ok(plain_layer(input, params));
        }

        let max_offset = (5.0 + strength * 15.0) as i32;
        let mut out = input.blank_like();
        let channels = [
            Rgba8::opaque(255, 0, 0),
            Rgba8::opaque(0, 255, 0),
            Rgba8::opaque(0, 0, 255),
        ];
        for color in channels {
            let dx = rng.range_i32(-max_offset, max_offset);
            let dy = rng.range_i32(-max_offset / 2, max_offset / 2);
            let style = TextStyle {
                fill: color,
                outline_width: 0,
                ..*params.style
            };
            let mut channel = input.blank_like();
            params.renderer.draw(
                &mut channel,
                params.text,
                Point::new(
                    params.anchor.x + f64::from(dx),
                    params.anchor.y + f64::from(dy),
                ),
                params.text_anchor,
                &style,
            );
            add_in_place(&mut out, &channel)?;
        }

        if rng.next_f64() < 0.5 {
            let ax = params.anchor.x as i64;
            let ay = params.anchor.y as i64;
            for _ in 0..rng.range_i32(1, 3) {
                let x = ax + i64::from(rng.range_i32(-50, 50));
                let y = ay + i64::from(rng.range_i32(-20, 20));
                let w = i64::from(rng.range_i32(20, 60));
                let h = i64::from(rng.range_i32(5, 15));
                let color = Rgba8::new(
                    rng.range_i32(0, 255) as u8,
                    rng.range_i32(0, 255) as u8,
                    rng.range_i32(0, 255) as u8,
                    rng.range_i32(100, 200) as u8,
                );
                fill_rect(&mut out, x, y, x + w + 1, y + h + 1, color);
            }
        }
        Ok(out)
    }
}
