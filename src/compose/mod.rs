//! Per-frame compositing: caption/word text layers, then whole-frame effects.

/// Whole-frame effect pass.
pub mod full_frame;
/// Caption layer rendering, text effects and bounds correction.
pub mod text_layer;
/// Word-by-word line layout.
pub mod words;

pub use full_frame::FullFrameCompositor;
pub use text_layer::{CAPTION_ANCHOR_Y_FRACTION, CaptionCompositor, TextMode};
pub use words::{WordLayout, WordPlacement, layout_words};

use crate::effects::{ActiveEffect, PrepareParams, TransformParams};
use crate::raster::frame::FrameRGBA;

/// An effect instance plus whether its last `prepare` succeeded.
pub(crate) struct EffectSlot {
    pub(crate) active: ActiveEffect,
    pub(crate) ready: bool,
}

impl EffectSlot {
    pub(crate) fn new(active: ActiveEffect) -> Self {
        Self {
            active,
            ready: false,
        }
    }

    pub(crate) fn slug(&self) -> &'static str {
        self.active.effect.slug()
    }

    /// Prepare, logging and disabling the slot on failure.
    pub(crate) fn prepare(&mut self, fps: f64, duration_sec: f64, text: &str) -> bool {
        let params = PrepareParams {
            fps,
            duration_sec,
            text,
            intensity: self.active.intensity,
        };
        self.ready = match self.active.effect.prepare(&params) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(effect = self.slug(), %err, "effect prepare failed, disabling");
                false
            }
        };
        self.ready
    }

    /// Transform `input`, or `None` (after a warning) when the effect is unprepared or fails.
    pub(crate) fn transform(
        &self,
        input: &FrameRGBA,
        params: &TransformParams<'_>,
    ) -> Option<FrameRGBA> {
        if !self.ready {
            return None;
        }
        match self.active.effect.transform(input, params) {
            Ok(out) => Some(out),
            Err(err) => {
                tracing::warn!(
                    effect = self.slug(),
                    frame = params.frame_index,
                    %err,
                    "effect transform failed, skipping"
                );
                None
            }
        }
    }
}
