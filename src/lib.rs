//! captionfx renders word-timed captions with animated text effects onto video frames.
//!
//! A render pass groups word timestamps into [`Caption`]s, maps source frames onto the output
//! cadence, composites caption and whole-frame effects, pads captions that would flash too
//! briefly, and streams `(frame, duration)` pairs into a [`FrameSink`]:
//!
//! - Group words with [`Grouper`] (or [`group`])
//! - Build a [`RenderDriver`] from an [`EffectRegistry`], a [`TextRenderer`] and
//!   [`RenderSettings`]
//! - Render a [`FrameSource`] into an MP4, GIF or in-memory sink
#![forbid(unsafe_code)]

mod foundation;

/// Source/output/caption-relative frame clocks and render windows.
pub mod clock;
/// Caption, word and full-frame compositing.
pub mod compose;
/// Typography, effect selections and render job configuration.
pub mod config;
/// Output sinks.
pub mod encode;
/// Effect contract, registry and built-in effects.
pub mod effects;
/// Minimum-duration padding.
pub mod padding;
/// Premultiplied RGBA frames, compositing, blur and text.
pub mod raster;
/// Frame sources and the render driver.
pub mod render;
/// Word timestamps and caption grouping.
pub mod timing;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, Point, Rect};
pub use crate::foundation::error::{CaptionError, CaptionResult};

pub use crate::clock::{
    FrameClockMapper, FrameClockState, RenderWindow, WindowPolicy, WindowRequest, resolve_window,
};
pub use crate::compose::{CaptionCompositor, FullFrameCompositor, TextMode};
pub use crate::config::{EffectSetting, RenderJob, Typography};
pub use crate::effects::{
    ActiveEffect, Effect, EffectConfig, EffectDescriptor, EffectRegistry, EffectScope, EffectSet,
    PrepareParams, TransformParams,
};
pub use crate::encode::{
    FfmpegSink, FfmpegSinkOpts, FrameSink, GifSink, GifSinkOpts, InMemorySink, SinkConfig,
    SinkFrame, is_ffmpeg_on_path,
};
pub use crate::padding::{FrameDuration, PaddingAllocator};
pub use crate::raster::{FrameRGBA, Rgba8, TextAnchor, TextRenderer, TextStyle};
pub use crate::render::{
    FfmpegSource, FrameSource, InMemorySource, RenderDriver, RenderMode, RenderReport,
    RenderSettings, SourceInfo, StillSource, probe_video,
};
pub use crate::timing::{
    Caption, Grouper, GroupingLimits, MinDurationPolicy, WordEffectOverride, WordTimestamp, group,
};
pub use crate::timing::timecode::{format_timecode, parse_timecode, required_frames};
pub use crate::timing::word::{load_words, parse_words};
