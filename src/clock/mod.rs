//! Source / output / caption-relative clock mapping.
//!
//! Three timebases meet here: the source video's native cadence, the output cadence the caller
//! asked for, and the per-caption frame counter effects animate against.

mod window;

pub use window::{RenderWindow, ResolvedWindow, WindowPolicy, WindowRequest, resolve_window};

use crate::foundation::core::Fps;
use crate::foundation::error::{CaptionError, CaptionResult};
use crate::timing::caption::{Caption, active_caption_at};

/// Clock readings for one emitted output frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameClockState {
    /// Contiguous output index starting at 0.
    pub output_frame_index: u64,
    /// Absolute index in the source video.
    pub source_frame_index: u64,
    /// `source_frame_index / source_fps`.
    pub source_time_sec: f64,
    /// Index into the pass's caption vector.
    pub active_caption: Option<usize>,
    /// Output frames since `active_caption` first became active (0 without a caption).
    pub caption_relative_frame_index: u64,
    /// Output frame at which `active_caption` first became active.
    pub caption_start_output_frame: Option<u64>,
}

/// First-active output frame per caption.
///
/// The first sighting pins the start; later sightings never move it, so the relative index
/// keeps counting while a caption stays on screen.
#[derive(Clone, Debug, Default)]
pub struct CaptionActivations {
    first_seen: Vec<Option<u64>>,
}

impl CaptionActivations {
    /// Tracker for `caption_count` captions.
    pub fn new(caption_count: usize) -> Self {
        Self {
            first_seen: vec![None; caption_count],
        }
    }

    /// Record that `caption` is active at `output_frame` and return `(start, relative)`.
    pub fn observe(&mut self, caption: usize, output_frame: u64) -> (u64, u64) {
        if caption >= self.first_seen.len() {
            self.first_seen.resize(caption + 1, None);
        }
        let start = *self.first_seen[caption].get_or_insert(output_frame);
        (start, output_frame.saturating_sub(start))
    }

    /// First-active output frame of `caption`, if it has been seen.
    pub fn start_of(&self, caption: usize) -> Option<u64> {
        self.first_seen.get(caption).copied().flatten()
    }
}

/// Maps selected source frames to output frames over a resolved window.
#[derive(Clone, Debug)]
pub struct FrameClockMapper {
    source_fps: Fps,
    output_fps: Fps,
    window: RenderWindow,
    skip_factor: u64,
    start_source: u64,
    end_source: u64,
    max_output_frames: u64,
    activations: CaptionActivations,
    last_output: Option<u64>,
}

impl FrameClockMapper {
    /// Build a mapper for `window`.
    ///
    /// `source_frame_count` clamps the last candidate source frame when known.
    pub fn new(
        source_fps: Fps,
        output_fps: Fps,
        window: RenderWindow,
        source_frame_count: Option<u64>,
        caption_count: usize,
    ) -> CaptionResult<Self> {
        let skip_factor = source_fps.skip_factor_to(output_fps);
        let start_source = output_fps.rescale_frames_floor(window.start_output_frame, source_fps);
        let mut end_source =
            output_fps.rescale_frames_floor(window.end_output_frame.saturating_add(1), source_fps);
        if let Some(count) = source_frame_count {
            if count == 0 {
                return Err(CaptionError::validation("source video has no frames"));
            }
            end_source = end_source.min(count - 1);
        }
        if start_source > end_source {
            return Err(CaptionError::validation(format!(
                "render window starts at source frame {start_source}, past the last available frame {end_source}"
            )));
        }

        tracing::debug!(
            skip_factor,
            start_source,
            end_source,
            "frame clock mapper configured"
        );

        Ok(Self {
            source_fps,
            output_fps,
            window,
            skip_factor,
            start_source,
            end_source,
            max_output_frames: window.len_frames(),
            activations: CaptionActivations::new(caption_count),
            last_output: None,
        })
    }

    /// `max(1, ceil(source_fps / output_fps))`.
    pub fn skip_factor(&self) -> u64 {
        self.skip_factor
    }

    /// First candidate source frame.
    pub fn start_source_index(&self) -> u64 {
        self.start_source
    }

    /// Last candidate source frame (inclusive).
    pub fn end_source_index(&self) -> u64 {
        self.end_source
    }

    /// Window this mapper was built for.
    pub fn window(&self) -> RenderWindow {
        self.window
    }

    /// Output cadence.
    pub fn output_fps(&self) -> Fps {
        self.output_fps
    }

    /// Source-time gap between consecutive selected frames.
    pub fn selection_step_sec(&self) -> f64 {
        self.source_fps.frames_to_secs(self.skip_factor)
    }

    /// Source time of `source_index`.
    pub fn source_time_sec(&self, source_index: u64) -> f64 {
        self.source_fps.frames_to_secs(source_index)
    }

    /// Output index of `source_index`, or `None` when the frame is skipped or out of window.
    pub fn output_index_for(&self, source_index: u64) -> Option<u64> {
        if source_index < self.start_source || source_index > self.end_source {
            return None;
        }
        let offset = source_index - self.start_source;
        if offset % self.skip_factor != 0 {
            return None;
        }
        let out = offset / self.skip_factor;
        (out < self.max_output_frames).then_some(out)
    }

    /// `true` once no source frame at or after `source_index` can be selected.
    pub fn is_past_end(&self, source_index: u64) -> bool {
        if source_index > self.end_source {
            return true;
        }
        let offset = source_index.saturating_sub(self.start_source);
        offset.div_ceil(self.skip_factor) >= self.max_output_frames
    }

    /// All `(source_index, output_index)` pairs the window selects.
    pub fn selected_frames(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        (self.start_source..=self.end_source)
            .step_by(self.skip_factor as usize)
            .take(self.max_output_frames as usize)
            .enumerate()
            .map(|(out, src)| (src, out as u64))
    }

    /// Clock state for `source_index`, or `None` when it is not selected.
    ///
    /// Must be called with increasing source indices: it advances the per-caption activation
    /// bookkeeping.
    pub fn map(&mut self, source_index: u64, captions: &[Caption]) -> Option<FrameClockState> {
        let output_frame_index = self.output_index_for(source_index)?;
        if let Some(last) = self.last_output
            && output_frame_index <= last
        {
            tracing::warn!(
                source_index,
                output_frame_index,
                last,
                "ignoring non-increasing source frame"
            );
            return None;
        }
        self.last_output = Some(output_frame_index);

        let source_time_sec = self.source_time_sec(source_index);
        let active_caption = active_caption_at(captions, source_time_sec);
        let (caption_start_output_frame, caption_relative_frame_index) = match active_caption {
            Some(idx) => {
                let (start, rel) = self.activations.observe(idx, output_frame_index);
                (Some(start), rel)
            }
            None => (None, 0),
        };

        Some(FrameClockState {
            output_frame_index,
            source_frame_index: source_index,
            source_time_sec,
            active_caption,
            caption_relative_frame_index,
            caption_start_output_frame,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clock/mapper.rs"]
mod tests;
