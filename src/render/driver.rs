use crate::clock::{
    FrameClockMapper, FrameClockState, RenderWindow, WindowPolicy, WindowRequest, resolve_window,
};
use crate::compose::{CaptionCompositor, FullFrameCompositor};
use crate::effects::{EffectConfig, EffectRegistry};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{CaptionError, CaptionResult};
use crate::padding::PaddingAllocator;
use crate::raster::frame::FrameRGBA;
use crate::raster::text::{TextRenderer, TextStyle};
use crate::render::source::FrameSource;
use crate::timing::caption::Caption;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Which driver instantiation to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Scrubbable preview: always from output frame 0 with an open end.
    Preview,
    /// Final output honoring the requested window.
    Final,
}

/// Everything a render pass needs besides its inputs and sink.
#[derive(Clone, Debug)]
pub struct RenderSettings {
    pub mode: RenderMode,
    pub output_fps: Fps,
    /// Output height; frames are scaled down (never up) to it, keeping aspect.
    pub target_height: Option<u32>,
    /// Round the output size down to even dimensions.
    pub even_dimensions: bool,
    pub window: WindowRequest,
    pub window_policy: WindowPolicy,
    pub style: TextStyle,
    /// Effect selections in registration order.
    pub effects: Vec<EffectConfig>,
}

impl RenderSettings {
    pub fn new(mode: RenderMode, output_fps: Fps, style: TextStyle) -> Self {
        Self {
            mode,
            output_fps,
            target_height: None,
            even_dimensions: false,
            window: WindowRequest::open(),
            window_policy: WindowPolicy::default(),
            style,
            effects: Vec::new(),
        }
    }
}

/// Outcome of a render pass.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RenderReport {
    /// Window actually rendered.
    pub window: RenderWindow,
    pub requested_end: Option<u64>,
    /// The requested end was pushed out to cover trailing captions.
    pub extended: bool,
    /// Frames handed to the sink.
    pub frames: u64,
    /// Sum of the emitted display durations.
    pub total_duration_sec: f64,
    pub padding_applied_sec: f64,
    /// Decoding failed or a stop was requested before the window was exhausted.
    pub stopped_early: bool,
    pub output: Canvas,
}

/// Orchestrates one render pass per call: clock mapping, caption and full-frame compositing,
/// padding, then the sink.
pub struct RenderDriver<'a> {
    registry: &'a EffectRegistry,
    renderer: &'a TextRenderer,
    settings: RenderSettings,
    stop: Option<Arc<AtomicBool>>,
}

impl<'a> RenderDriver<'a> {
    pub fn new(
        registry: &'a EffectRegistry,
        renderer: &'a TextRenderer,
        settings: RenderSettings,
    ) -> Self {
        Self {
            registry,
            renderer,
            settings,
            stop: None,
        }
    }

    /// Stop cleanly before the next frame once `flag` is set.
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    fn stop_requested(&self) -> bool {
        self.stop.as_ref().is_some_and(|f| f.load(Ordering::Relaxed))
    }

    /// Render `captions` over `source` into `sink`.
    ///
    /// Effects are instantiated fresh for the pass. A decode error ends the pass early with
    /// `stopped_early` set; sink errors abort it.
    #[tracing::instrument(skip_all, fields(mode = ?self.settings.mode, captions = captions.len()))]
    pub fn render(
        &self,
        source: &mut dyn FrameSource,
        captions: Vec<Caption>,
        sink: &mut dyn FrameSink,
    ) -> CaptionResult<RenderReport> {
        let settings = &self.settings;
        let info = source.info().clone();
        if info.width == 0 || info.height == 0 {
            return Err(CaptionError::validation("source has empty frames"));
        }
        let request = match settings.mode {
            RenderMode::Preview => WindowRequest::open(),
            RenderMode::Final => settings.window,
        };
        if settings.mode == RenderMode::Final && captions.is_empty() {
            return Err(CaptionError::config("final render needs at least one caption"));
        }

        let last_end = captions.iter().map(|c| c.end_sec).reduce(f64::max);
        let resolved = resolve_window(
            request,
            last_end,
            settings.output_fps,
            info.duration_sec,
            &settings.window_policy,
        )?;
        let mut mapper = FrameClockMapper::new(
            info.fps,
            settings.output_fps,
            resolved.window,
            info.frame_count,
            captions.len(),
        )?;

        let mut canvas = match settings.target_height {
            Some(h) => info.canvas().fit_height(h),
            None => info.canvas(),
        };
        if settings.even_dimensions {
            canvas = canvas.even();
        }
        let fps = settings.output_fps.as_f64();
        let effects = self.registry.instantiate(&settings.effects)?;
        let mut text = CaptionCompositor::new(settings.style, fps, effects.text);
        let full_frame = FullFrameCompositor::new(fps, effects.full_frame);
        let mut padding = PaddingAllocator::new(captions, settings.output_fps)
            .with_selection_step(mapper.selection_step_sec());

        tracing::info!(
            start = resolved.window.start_output_frame,
            end = resolved.window.end_output_frame,
            extended = resolved.extended,
            skip = mapper.skip_factor(),
            width = canvas.width,
            height = canvas.height,
            "render pass starting"
        );

        source.seek(mapper.start_source_index())?;
        sink.begin(SinkConfig {
            width: canvas.width,
            height: canvas.height,
            fps: settings.output_fps,
        })?;

        let mut frames = 0u64;
        let mut total_duration_sec = 0.0;
        let mut stopped_early = false;
        let mut next_source = mapper.start_source_index();
        while !mapper.is_past_end(next_source) {
            if self.stop_requested() {
                tracing::warn!(frames, "stop requested, ending render early");
                stopped_early = true;
                break;
            }
            let (source_index, frame) = match source.next_frame() {
                Ok(Some(next)) => next,
                Ok(None) => {
                    tracing::warn!(frames, next_source, "source ended inside the window");
                    stopped_early = true;
                    break;
                }
                Err(err) => {
                    tracing::warn!(%err, frames, "source decode failed, stopping early");
                    stopped_early = true;
                    break;
                }
            };
            next_source = source_index + 1;
            let Some(clock) = mapper.map(source_index, padding.captions()) else {
                continue;
            };

            let frame = if frame.canvas() == canvas {
                frame
            } else {
                frame.resized(canvas)?
            };
            let frame = self.compose_frame(frame, &clock, &mut text, &full_frame, &padding)?;
            let duration = padding.duration_for(&clock);
            sink.push_frame(
                FrameIndex(clock.output_frame_index),
                &frame,
                duration.duration_sec,
            )?;
            padding.commit(&duration);
            frames += 1;
            total_duration_sec += duration.duration_sec;
        }
        sink.end()?;

        let report = RenderReport {
            window: resolved.window,
            requested_end: resolved.requested_end,
            extended: resolved.extended,
            frames,
            total_duration_sec,
            padding_applied_sec: padding.total_applied_sec(),
            stopped_early,
            output: canvas,
        };
        tracing::info!(
            frames = report.frames,
            duration_sec = report.total_duration_sec,
            padding_sec = report.padding_applied_sec,
            stopped_early = report.stopped_early,
            "render pass finished"
        );
        Ok(report)
    }

    #[tracing::instrument(level = "trace", skip_all, fields(frame = clock.output_frame_index))]
    fn compose_frame(
        &self,
        mut frame: FrameRGBA,
        clock: &FrameClockState,
        text: &mut CaptionCompositor,
        full_frame: &FullFrameCompositor,
        padding: &PaddingAllocator,
    ) -> CaptionResult<FrameRGBA> {
        text.composite(&mut frame, clock, padding.captions(), self.renderer)?;
        Ok(full_frame.apply(
            frame,
            clock.output_frame_index,
            &self.settings.style,
            self.renderer,
        ))
    }
}
