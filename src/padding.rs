//! Minimum-duration padding: stretch one frame per short caption instead of duplicating frames.

use crate::clock::FrameClockState;
use crate::foundation::core::Fps;
use crate::timing::caption::Caption;

/// Slack for comparing frame times computed through different float paths.
const TIME_EPSILON: f64 = 1e-9;

/// Display duration chosen for one output frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameDuration {
    /// `1 / output_fps` plus any padding.
    pub duration_sec: f64,
    /// Caption whose padding this frame carries.
    pub padded_caption: Option<usize>,
    pub padding_sec: f64,
}

/// Owns the pass's captions and hands each short caption's padding to its final frame once.
#[derive(Clone, Debug)]
pub struct PaddingAllocator {
    captions: Vec<Caption>,
    frame_sec: f64,
    /// Source-time gap between consecutive selected frames.
    step_sec: f64,
    total_applied_sec: f64,
}

impl PaddingAllocator {
    /// Allocator assuming one selected source frame per output frame.
    pub fn new(captions: Vec<Caption>, output_fps: Fps) -> Self {
        let frame_sec = output_fps.frame_duration_secs();
        Self {
            captions,
            frame_sec,
            step_sec: frame_sec,
            total_applied_sec: 0.0,
        }
    }

    /// Use the mapper's real selection cadence (`skip_factor / source_fps`) to find final
    /// frames. It differs from `1 / output_fps` whenever the fps ratio is not an integer.
    pub fn with_selection_step(mut self, step_sec: f64) -> Self {
        if step_sec.is_finite() && step_sec > 0.0 {
            self.step_sec = step_sec;
        }
        self
    }

    pub fn captions(&self) -> &[Caption] {
        &self.captions
    }

    pub fn into_captions(self) -> Vec<Caption> {
        self.captions
    }

    /// Padding handed out so far.
    pub fn total_applied_sec(&self) -> f64 {
        self.total_applied_sec
    }

    /// Duration for the frame at `clock`. Pure: call [`Self::commit`] once the frame is out.
    pub fn duration_for(&self, clock: &FrameClockState) -> FrameDuration {
        let base = FrameDuration {
            duration_sec: self.frame_sec,
            padded_caption: None,
            padding_sec: 0.0,
        };
        let Some(idx) = clock.active_caption else {
            return base;
        };
        let Some(caption) = self.captions.get(idx) else {
            return base;
        };
        // Final when the next selected frame would fall at or past the caption's end.
        let is_final_frame =
            clock.source_time_sec + self.step_sec + TIME_EPSILON >= caption.end_sec;
        if is_final_frame && caption.padding_needed_sec > 0.0 && !caption.padding_applied {
            FrameDuration {
                duration_sec: self.frame_sec + caption.padding_needed_sec,
                padded_caption: Some(idx),
                padding_sec: caption.padding_needed_sec,
            }
        } else {
            base
        }
    }

    /// Record that `duration`'s padding reached an emitted frame.
    pub fn commit(&mut self, duration: &FrameDuration) {
        let Some(idx) = duration.padded_caption else {
            return;
        };
        if let Some(caption) = self.captions.get_mut(idx)
            && !caption.padding_applied
        {
            caption.padding_applied = true;
            self.total_applied_sec += duration.padding_sec;
            tracing::debug!(
                caption = idx,
                padding_sec = duration.padding_sec,
                "applied minimum-duration padding"
            );
        }
    }
}
