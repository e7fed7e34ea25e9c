use crate::foundation::error::CaptionResult;
use crate::raster::frame::FrameRGBA;

use super::{Effect, PrepareParams, TransformParams, prepared};

/// Eased fade in at the start of the caption and out at its end.
#[derive(Debug, Default)]
pub struct Fade {
    state: Option<FadeState>,
}

#[derive(Clone, Debug, PartialEq)]
struct FadeState {
    total_frames: u64,
    fade_in_frames: u64,
    fade_out_frames: u64,
}

impl FadeState {
    fn new(total_frames: u64, strength: f64) -> Self {
        let total_frames = total_frames.max(1);
        let mut fade_in_frames = (total_frames as f64 * strength / 2.0).ceil() as u64;
        let mut fade_out_frames = fade_in_frames;
        if fade_in_frames + fade_out_frames > total_frames {
            fade_in_frames = total_frames / 2;
            fade_out_frames = total_frames - fade_in_frames;
        }
        Self {
            total_frames,
            fade_in_frames,
            fade_out_frames,
        }
    }

    /// Opacity multiplier for caption-relative `frame`.
    fn alpha(&self, frame: u64) -> f64 {
        let fade_out_start = self.total_frames - self.fade_out_frames;
        let a = if frame < self.fade_in_frames {
            let p = frame as f64 / self.fade_in_frames as f64;
            p * p
        } else if frame >= fade_out_start {
            if self.fade_out_frames == 0 {
                0.0
            } else {
                let p = (frame - fade_out_start) as f64 / self.fade_out_frames as f64;
                1.0 - p * p
            }
        } else {
            1.0
        };
        a.clamp(0.0, 1.0)
    }
}

impl Effect for Fade {
    fn slug(&self) -> &'static str {
        "fade"
    }

    fn display_name(&self) -> &'static str {
        "Fade"
    }

    fn default_intensity(&self) -> u8 {
        50
    }

    fn prepare(&mut self, params: &PrepareParams<'_>) -> CaptionResult<()> {
        let total = (params.duration_sec * params.fps).ceil().max(0.0) as u64;
        self.state = Some(FadeState::new(total, f64::from(params.intensity) / 100.0));
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
        let alpha = state.alpha(params.frame_index);
        if alpha <= 0.0 {
            return Ok(layer);
        }
        let max_width = input.width as f32 * 0.9;
        params.renderer.draw_block(
            &mut layer,
            params.text,
            params.anchor,
            params.text_anchor,
            params.style,
            max_width,
        );
        layer.scale_opacity(alpha as f32);
        Ok(layer)
    }
}
