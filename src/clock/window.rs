use crate::foundation::core::Fps;
use crate::foundation::error::{CaptionError, CaptionResult};

/// Inclusive output-frame window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RenderWindow {
    /// First output frame (inclusive).
    pub start_output_frame: u64,
    /// Last output frame (inclusive).
    pub end_output_frame: u64,
}

impl RenderWindow {
    /// Create a validated window with `start <= end`.
    pub fn new(start_output_frame: u64, end_output_frame: u64) -> CaptionResult<Self> {
        if end_output_frame < start_output_frame {
            return Err(CaptionError::validation(format!(
                "render window ends before it starts ({end_output_frame} < {start_output_frame})"
            )));
        }
        Ok(Self {
            start_output_frame,
            end_output_frame,
        })
    }

    /// Number of output frames covered.
    pub fn len_frames(self) -> u64 {
        self.end_output_frame - self.start_output_frame + 1
    }

    /// Time of the first frame.
    pub fn start_time_sec(self, fps: Fps) -> f64 {
        fps.frames_to_secs(self.start_output_frame)
    }

    /// Time just after the last frame.
    pub fn end_time_sec(self, fps: Fps) -> f64 {
        fps.frames_to_secs(self.end_output_frame.saturating_add(1))
    }
}

/// Window as requested by the caller, before extension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WindowRequest {
    /// First output frame.
    #[serde(default)]
    pub start_output_frame: u64,
    /// Last output frame (inclusive); `None` means "until the captions are done".
    #[serde(default)]
    pub end_output_frame: Option<u64>,
}

impl WindowRequest {
    /// From frame 0 with an open end.
    pub fn open() -> Self {
        Self::default()
    }

    /// Explicit inclusive range.
    pub fn range(start_output_frame: u64, end_output_frame: u64) -> Self {
        Self {
            start_output_frame,
            end_output_frame: Some(end_output_frame),
        }
    }
}

/// Buffers used when resolving a window against the captions.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WindowPolicy {
    /// Tail kept after the last caption when the caller gave no end.
    pub open_end_buffer_sec: f64,
    /// Tail kept after the last caption when a requested end had to be pushed out.
    pub extension_buffer_sec: f64,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            open_end_buffer_sec: 1.0,
            extension_buffer_sec: 0.5,
        }
    }
}

/// Effective window plus how it relates to the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ResolvedWindow {
    /// Window the driver renders.
    pub window: RenderWindow,
    /// End frame the caller asked for.
    pub requested_end: Option<u64>,
    /// `true` when a requested end was pushed out to keep trailing captions.
    pub extended: bool,
}

/// Resolve `request` into the window actually rendered.
///
/// The window only ever grows: a requested end that would cut off the last caption (plus
/// `policy.extension_buffer_sec`) is moved out to cover it.
pub fn resolve_window(
    request: WindowRequest,
    last_caption_end_sec: Option<f64>,
    output_fps: Fps,
    source_duration_sec: Option<f64>,
    policy: &WindowPolicy,
) -> CaptionResult<ResolvedWindow> {
    let start = request.start_output_frame;
    if let Some(end) = request.end_output_frame
        && end < start
    {
        return Err(CaptionError::validation(format!(
            "requested end frame {end} is before start frame {start}"
        )));
    }

    let (end, extended) = match (request.end_output_frame, last_caption_end_sec) {
        (None, Some(last)) => (
            output_fps.secs_to_frames_ceil(last + policy.open_end_buffer_sec),
            false,
        ),
        (None, None) => {
            let Some(duration) = source_duration_sec else {
                return Err(CaptionError::config(
                    "cannot resolve an open-ended window without captions or a known source duration",
                ));
            };
            (
                output_fps.secs_to_frames_ceil(duration).saturating_sub(1),
                false,
            )
        }
        (Some(end), Some(last)) => {
            let requested_end_time = output_fps.frames_to_secs(end.saturating_add(1));
            let needed = last + policy.extension_buffer_sec;
            if requested_end_time < needed {
                let new_end = output_fps.secs_to_frames_ceil(needed).max(end);
                tracing::info!(
                    requested_end = end,
                    new_end,
                    last_caption_end = last,
                    "extended render window to cover trailing captions"
                );
                (new_end, new_end != end)
            } else {
                (end, false)
            }
        }
        (Some(end), None) => (end, false),
    };

    Ok(ResolvedWindow {
        window: RenderWindow::new(start, end.max(start))?,
        requested_end: request.end_output_frame,
        extended,
    })
}
