use crate::compose::EffectSlot;
use crate::effects::{ActiveEffect, TransformParams};
use crate::foundation::core::Point;
use crate::raster::frame::FrameRGBA;
use crate::raster::text::{TextAnchor, TextRenderer, TextStyle};

/// Nominal duration full-frame effects are prepared with.
pub const FULL_FRAME_DURATION_SEC: f64 = 2.0;

/// Applies whole-frame effects after captions, animated by the absolute output frame index.
pub struct FullFrameCompositor {
    slots: Vec<EffectSlot>,
}

impl FullFrameCompositor {
    /// Prepares every effect once; an effect whose prepare fails is skipped for the whole pass.
    pub fn new(fps: f64, effects: Vec<ActiveEffect>) -> Self {
        let mut slots: Vec<EffectSlot> = effects.into_iter().map(EffectSlot::new).collect();
        for slot in &mut slots {
            slot.prepare(fps, FULL_FRAME_DURATION_SEC, "");
        }
        Self { slots }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Run every effect in order. A failing effect leaves the frame as it was.
    pub fn apply(
        &self,
        mut frame: FrameRGBA,
        output_index: u64,
        style: &TextStyle,
        renderer: &TextRenderer,
    ) -> FrameRGBA {
        let anchor = Point::new(
            f64::from(frame.width) / 2.0,
            f64::from(frame.height) / 2.0,
        );
        for slot in &self.slots {
            let params = TransformParams {
                text: "",
                anchor,
                text_anchor: TextAnchor::MiddleMiddle,
                frame_index: output_index,
                intensity: slot.active.intensity,
                style,
                renderer,
            };
            if let Some(out) = slot.transform(&frame, &params) {
                frame = out;
            }
        }
        frame
    }
}
