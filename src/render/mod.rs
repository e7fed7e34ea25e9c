//! Render passes: frame sources in, composited `(frame, duration)` pairs out.

/// Preview and final render driver.
pub mod driver;
/// Decoded frame suppliers.
pub mod source;

pub use driver::{RenderDriver, RenderMode, RenderReport, RenderSettings};
pub use source::{
    FfmpegSource, FrameSource, InMemorySource, SourceInfo, StillSource, is_still_image, probe_video,
};
