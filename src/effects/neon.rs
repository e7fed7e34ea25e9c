use crate::foundation::error::CaptionResult;
use crate::raster::blur::gaussian_blur;
use crate::raster::color::Rgba8;
use crate::raster::composite::over_in_place;
use crate::raster::frame::FrameRGBA;
use crate::raster::text::{TextAnchor, TextStyle};

use super::{Effect, PrepareParams, TransformParams, prepared};

/// Steady neon tube: a soft outer halo and a bright inner halo under crisp text.
///
/// Like glow, text is centered on the anchor and wrapped at 90% of the layer width.
#[derive(Debug, Default)]
pub struct Neon {
    state: Option<NeonState>,
}

#[derive(Clone, Debug, PartialEq)]
struct NeonState {
    outer: Option<Halo>,
    inner: Option<Halo>,
    /// Crisp outline takes the tube color instead of the style outline.
    bright_outline: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Halo {
    sigma: f64,
    opacity: f64,
}

impl NeonState {
    fn new(strength: f64) -> Self {
        Self {
            outer: (strength > 0.2).then_some(Halo {
                sigma: 3.0 + 2.0 * strength,
                opacity: 0.6,
            }),
            inner: (strength > 0.3).then_some(Halo {
                sigma: 1.5 + 1.5 * strength,
                opacity: 0.4 + 0.2 * strength,
            }),
            bright_outline: strength >= 0.5,
        }
    }
}

/// Fill pushed about 10% brighter, used for the inner halo.
fn tube_color(fill: Rgba8) -> Rgba8 {
    fill.brighten(1.1, 20.0)
}

impl Effect for Neon {
    fn slug(&self) -> &'static str {
        "neon"
    }

    fn display_name(&self) -> &'static str {
        "Neon"
    }

    fn default_intensity(&self) -> u8 {
        80
    }

    fn supports_word_level(&self) -> bool {
        true
    }

    fn prepare(&mut self, params: &PrepareParams<'_>) -> CaptionResult<()> {
        self.state = Some(NeonState::new(f64::from(params.intensity) / 100.0));
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
        let fill = params.style.fill;
        let bright = tube_color(fill);
        let mut out = input.blank_like();

        if let Some(halo) = state.outer {
            let style = TextStyle {
                outline: fill,
                outline_width: params.style.outline_width.max(2),
                ..*params.style
            };
            let mut layer = gaussian_blur(&draw(&style), halo.sigma as f32)?;
            layer.scale_opacity(halo.opacity as f32);
            over_in_place(&mut out, &layer, 1.0)?;
        }
        if let Some(halo) = state.inner {
            let style = TextStyle {
                fill: bright,
                outline: bright,
                ..*params.style
            };
            let mut layer = gaussian_blur(&draw(&style), halo.sigma as f32)?;
            layer.scale_opacity(halo.opacity as f32);
            over_in_place(&mut out, &layer, 1.0)?;
        }

        let crisp = if state.bright_outline {
            params.style.with_outline(bright)
        } else {
            *params.style
        };
        over_in_place(&mut out, &draw(&crisp), 1.0)?;
        Ok(out)
    }
}
