//! Output sinks.
//!
//! Sinks consume composited frames in output order together with each frame's display
//! duration.

/// `ffmpeg`-based MP4 sink.
pub mod ffmpeg;
/// Animated GIF sink.
pub mod gif;
/// Sink trait and in-memory sink.
pub mod sink;

pub use ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use gif::{GifSink, GifSinkOpts, centiseconds};
pub use sink::{FrameSink, InMemorySink, SinkConfig, SinkFrame};

use crate::foundation::error::CaptionResult;
use std::path::Path;

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> CaptionResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}
