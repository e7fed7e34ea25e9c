use crate::clock::FrameClockState;
use crate::compose::EffectSlot;
use crate::compose::words::{DEFAULT_PADDING_PX, SHAKE_PADDING_PX, layout_words};
use crate::effects::{ActiveEffect, TransformParams};
use crate::foundation::core::{Canvas, Point};
use crate::foundation::error::CaptionResult;
use crate::raster::composite::over_in_place;
use crate::raster::frame::FrameRGBA;
use crate::raster::text::{TextAnchor, TextRenderer, TextStyle};
use crate::timing::caption::Caption;
use crate::timing::word::WordTimestamp;

/// Caption baseline as a fraction of the frame height.
pub const CAPTION_ANCHOR_Y_FRACTION: f64 = 0.90;
/// Caption wrap width as a fraction of the frame width.
pub const CAPTION_WRAP_FRACTION: f64 = 0.90;
/// Nominal duration handed to word effects, which are prepared per word.
pub const WORD_EFFECT_DURATION_SEC: f64 = 2.0;

/// How a caption's text reaches the layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextMode {
    /// One wrapped block, bottom-center anchored.
    Caption,
    /// Word by word, so effects and colors can differ per word.
    WordLevel,
}

/// Renders the active caption onto a transparent layer and composites it.
///
/// Owns the render pass's text effects. Caption-level effects are re-prepared only when the
/// active caption changes.
pub struct CaptionCompositor {
    style: TextStyle,
    fps: f64,
    slots: Vec<EffectSlot>,
    word_level: Option<usize>,
    prepared_for: Option<usize>,
}

impl CaptionCompositor {
    /// `effects` are text-scope effects in registration order.
    pub fn new(style: TextStyle, fps: f64, effects: Vec<ActiveEffect>) -> Self {
        let word_level = effects.iter().position(ActiveEffect::runs_per_word);
        Self {
            style,
            fps,
            slots: effects.into_iter().map(EffectSlot::new).collect(),
            word_level,
            prepared_for: None,
        }
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    /// Slug of the effect that runs per word, if any.
    pub fn word_effect(&self) -> Option<&'static str> {
        self.word_level.map(|i| self.slots[i].slug())
    }

    pub fn mode_for(&self, caption: &Caption) -> TextMode {
        if self.word_level.is_some() || caption.words.iter().any(WordTimestamp::has_explicit_effects)
        {
            TextMode::WordLevel
        } else {
            TextMode::Caption
        }
    }

    fn ensure_prepared(&mut self, caption_index: usize, caption: &Caption) {
        if self.prepared_for == Some(caption_index) {
            return;
        }
        tracing::debug!(
            caption = caption_index,
            duration = caption.natural_duration_sec,
            "preparing caption effects"
        );
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if Some(i) != self.word_level {
                slot.prepare(self.fps, caption.natural_duration_sec, &caption.text);
            }
        }
        self.prepared_for = Some(caption_index);
    }

    /// Transparent layer with the caption drawn and its text effects applied.
    pub fn render_layer(
        &mut self,
        canvas: Canvas,
        caption_index: usize,
        caption: &Caption,
        relative_frame: u64,
        renderer: &TextRenderer,
    ) -> CaptionResult<FrameRGBA> {
        self.ensure_prepared(caption_index, caption);
        let width = f64::from(canvas.width);
        let anchor = Point::new(
            width / 2.0,
            f64::from(canvas.height) * CAPTION_ANCHOR_Y_FRACTION,
        );
        let mut layer = FrameRGBA::new_transparent(canvas.width, canvas.height);

        match self.mode_for(caption) {
            TextMode::WordLevel => {
                self.draw_words(&mut layer, caption, anchor.y, relative_frame, renderer)?;
            }
            TextMode::Caption => {
                if !self.slots.iter().any(|s| s.active.hides_base_text()) {
                    renderer.draw_block(
                        &mut layer,
                        &caption.text,
                        anchor,
                        TextAnchor::MiddleBaseline,
                        &self.style,
                        (width * CAPTION_WRAP_FRACTION) as f32,
                    );
                }
            }
        }

        for (i, slot) in self.slots.iter().enumerate() {
            if Some(i) == self.word_level {
                continue;
            }
            let params = TransformParams {
                text: &caption.text,
                anchor,
                text_anchor: TextAnchor::MiddleBaseline,
                frame_index: relative_frame,
                intensity: slot.active.intensity,
                style: &self.style,
                renderer,
            };
            if let Some(out) = slot.transform(&layer, &params) {
                layer = out;
            }
        }

        Ok(keep_inside(layer))
    }

    fn draw_words(
        &mut self,
        layer: &mut FrameRGBA,
        caption: &Caption,
        center_y: f64,
        relative_frame: u64,
        renderer: &TextRenderer,
    ) -> CaptionResult<()> {
        let slug = self.word_effect();
        let padding = if slug == Some("shake") {
            SHAKE_PADDING_PX
        } else {
            DEFAULT_PADDING_PX
        };
        let layout = layout_words(
            &caption.words,
            layer.canvas(),
            center_y,
            padding,
            renderer,
            self.style.size_px,
        );

        for placement in &layout.placements {
            let word = &caption.words[placement.word_index];
            let overrides = word.effects.as_ref();
            let style = match overrides.and_then(|o| o.color_for(slug)) {
                Some(color) => self.style.with_fill(color),
                None => self.style,
            };
            let apply = match slug {
                Some(slug) => {
                    if word.has_explicit_effects() {
                        overrides.and_then(|o| o.enabled(slug)).unwrap_or(false)
                    } else {
                        true
                    }
                }
                None => false,
            };

            if apply && let Some(idx) = self.word_level {
                let slot = &mut self.slots[idx];
                if slot.prepare(self.fps, WORD_EFFECT_DURATION_SEC, &placement.text) {
                    let params = TransformParams {
                        text: &placement.text,
                        anchor: placement.center,
                        text_anchor: TextAnchor::MiddleMiddle,
                        frame_index: relative_frame,
                        intensity: slot.active.intensity,
                        style: &style,
                        renderer,
                    };
                    if let Some(out) = slot.transform(&layer.blank_like(), &params) {
                        over_in_place(layer, &out, 1.0)?;
                        continue;
                    }
                }
            }
            renderer.draw(
                layer,
                &placement.text,
                placement.center,
                TextAnchor::MiddleMiddle,
                &style,
            );
        }
        Ok(())
    }

    /// Draw the caption active at `clock` onto `base`. Frames without a caption pass through.
    #[tracing::instrument(level = "trace", skip_all, fields(frame = clock.output_frame_index))]
    pub fn composite(
        &mut self,
        base: &mut FrameRGBA,
        clock: &FrameClockState,
        captions: &[Caption],
        renderer: &TextRenderer,
    ) -> CaptionResult<()> {
        let Some(idx) = clock.active_caption else {
            return Ok(());
        };
        let Some(caption) = captions.get(idx) else {
            tracing::warn!(caption = idx, "active caption index out of range");
            return Ok(());
        };
        let layer = self.render_layer(
            base.canvas(),
            idx,
            caption,
            clock.caption_relative_frame_index,
            renderer,
        )?;
        over_in_place(base, &layer, 1.0)
    }
}

/// Lift the layer so its lowest painted row stays above the frame's last row.
pub(crate) fn keep_inside(layer: FrameRGBA) -> FrameRGBA {
    let limit = f64::from(layer.height) - 1.0;
    match layer.content_bounds() {
        Some(bounds) if bounds.y1 > limit => {
            let overflow = (bounds.y1 - limit).ceil() as i32;
            layer.translated(0, -overflow)
        }
        _ => layer,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/text_layer.rs"]
mod tests;
