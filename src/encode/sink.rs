use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::CaptionResult;
use crate::raster::frame::FrameRGBA;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Nominal output frames-per-second.
    pub fps: Fps,
}

/// Sink contract for consuming composited frames in output order.
///
/// Ordering contract: `push_frame` is called with strictly increasing `FrameIndex`. Sinks with a
/// fixed frame rate ignore `duration_secs`; variable-delay formats honor it.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> CaptionResult<()>;
    /// Push one frame to be displayed for `duration_secs`.
    fn push_frame(
        &mut self,
        idx: FrameIndex,
        frame: &FrameRGBA,
        duration_secs: f64,
    ) -> CaptionResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> CaptionResult<()>;
}

/// One frame captured by [`InMemorySink`].
#[derive(Clone, Debug, PartialEq)]
pub struct SinkFrame {
    pub index: FrameIndex,
    pub frame: FrameRGBA,
    pub duration_secs: f64,
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<SinkFrame>,
    ended: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Captured frames in output order.
    pub fn frames(&self) -> &[SinkFrame] {
        &self.frames
    }

    /// Sum of the captured display durations.
    pub fn total_duration_secs(&self) -> f64 {
        self.frames.iter().map(|f| f.duration_secs).sum()
    }

    /// Whether `end` was called.
    pub fn is_finished(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> CaptionResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(
        &mut self,
        idx: FrameIndex,
        frame: &FrameRGBA,
        duration_secs: f64,
    ) -> CaptionResult<()> {
        self.frames.push(SinkFrame {
            index: idx,
            frame: frame.clone(),
            duration_secs,
        });
        Ok(())
    }

    fn end(&mut self) -> CaptionResult<()> {
        self.ended = true;
        Ok(())
    }
}
