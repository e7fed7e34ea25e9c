use std::f64::consts::PI;

use crate::foundation::error::CaptionResult;
use crate::raster::blur::gaussian_blur;
use crate::raster::color::Rgba8;
use crate::raster::composite::over_in_place;
use crate::raster::frame::FrameRGBA;
use crate::raster::text::{TextAnchor, TextStyle};

use super::{Effect, PrepareParams, TransformParams, prepared};

/// Pulsing halo: blurred outer, inner and core layers under crisp text.
///
/// Text is centered on the anchor (middle-middle) regardless of the caller's anchor mode, and is
/// wrapped at 90% of the layer width.
#[derive(Debug, Default)]
pub struct Glow {
    state: Option<GlowState>,
}

#[derive(Clone, Debug, PartialEq)]
struct GlowState {
    fps: f64,
}

const PULSE_HZ: f64 = 2.0;

impl GlowState {
    /// Pulsed glow strength in `0..=strength`.
    fn glow_strength(&self, frame: u64, strength: f64) -> f64 {
        let phase = (frame as f64 / self.fps) * PULSE_HZ * 2.0 * PI;
        strength * (0.5 + 0.5 * (phase.sin() + 1.0) / 2.0)
    }
}

impl Effect for Glow {
    fn slug(&self) -> &'static str {
        "glow"
    }

    fn display_name(&self) -> &'static str {
        "Glow"
    }

    fn default_intensity(&self) -> u8 {
        70
    }

    fn supports_word_level(&self) -> bool {
        true
    }

    fn prepare(&mut self, params: &PrepareParams<'_>) -> CaptionResult<()> {
        self.state = Some(GlowState {
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
        let mut out = input.blank_like();
        let max_width = input.width as f32 * 0.9;
        let draw = |style: &TextStyle| {
            let mut layer = input.blank_like();
            params.renderer.draw_block(
                &mut layer,
                params.text,
                params.anchor,
                TextAnchor::MiddleMiddle,
                style,
                max_width,
            );
            layer
        };
        let s = state.glow_strength(params.frame_index, params.strength());
        let fill = params.style.fill;
        let halo = |color: Rgba8, outline_width: u32, sigma: f64, opacity: f64| {
            let style = TextStyle {
                fill: color,
                outline: color,
                outline_width,
                ..*params.style
            };
            let mut layer = gaussian_blur(&draw(&style), sigma as f32)?;
            layer.scale_opacity(opacity as f32);
            CaptionResult::Ok(layer)
        };

        let outer = halo(fill, 3, 8.0 + 6.0 * s, 0.5 + 0.3 * s)?;
        over_in_place(&mut out, &outer, 1.0)?;

        let inner_color = fill.brighten(1.2, 30.0);
        let inner = halo(
            inner_color,
            params.style.outline_width.max(2),
            4.0 + 3.0 * s,
            0.6 + 0.3 * s,
        )?;
        over_in_place(&mut out, &inner, 1.0)?;

        if s > 0.4 {
            let core = halo(Rgba8::WHITE, 1, 2.0 + s, 0.3 + 0.2 * s)?;
            over_in_place(&mut out, &core, 1.0)?;
        }

        over_in_place(&mut out, &draw(params.style), 1.0)?;
        Ok(out)
    }
}
