use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{CaptionError, CaptionResult};
use crate::raster::frame::FrameRGBA;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

/// Frame rate assumed when a probe reports none.
pub const FALLBACK_SOURCE_FPS: u32 = 25;

/// What a source knows about itself before decoding.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    /// Total frames, when the container reports or implies it.
    pub frame_count: Option<u64>,
    pub duration_sec: Option<f64>,
}

impl SourceInfo {
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }
}

/// Sequential supplier of decoded source frames.
///
/// Frames come out in increasing source index. A decode error mid-stream is reported as `Err`;
/// callers treat it as a soft stop.
pub trait FrameSource: Send {
    fn info(&self) -> &SourceInfo;

    /// Position the stream so the next frame is `source_index`. Only valid before reading.
    fn seek(&mut self, source_index: u64) -> CaptionResult<()>;

    /// Next `(source_index, frame)`, or `None` at end of stream.
    fn next_frame(&mut self) -> CaptionResult<Option<(u64, FrameRGBA)>>;
}

/// Frames held in memory, for tests and still-image backgrounds.
#[derive(Clone, Debug)]
pub struct InMemorySource {
    info: SourceInfo,
    frames: Vec<FrameRGBA>,
    cursor: usize,
}

impl InMemorySource {
    pub fn new(fps: Fps, frames: Vec<FrameRGBA>) -> CaptionResult<Self> {
        let first = frames
            .first()
            .ok_or_else(|| CaptionError::validation("in-memory source needs at least one frame"))?;
        let (width, height) = (first.width, first.height);
        if frames.iter().any(|f| f.width != width || f.height != height) {
            return Err(CaptionError::validation(
                "in-memory source frames must share one size",
            ));
        }
        let count = frames.len() as u64;
        Ok(Self {
            info: SourceInfo {
                width,
                height,
                fps,
                frame_count: Some(count),
                duration_sec: Some(fps.frames_to_secs(count)),
            },
            frames,
            cursor: 0,
        })
    }

    /// `count` copies of one frame.
    pub fn repeat(fps: Fps, frame: FrameRGBA, count: usize) -> CaptionResult<Self> {
        Self::new(fps, vec![frame; count])
    }
}

impl FrameSource for InMemorySource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn seek(&mut self, source_index: u64) -> CaptionResult<()> {
        self.cursor = usize::try_from(source_index)
            .map_err(|_| CaptionError::validation("seek index out of range"))?;
        Ok(())
    }

    fn next_frame(&mut self) -> CaptionResult<Option<(u64, FrameRGBA)>> {
        let Some(frame) = self.frames.get(self.cursor) else {
            return Ok(None);
        };
        let idx = self.cursor as u64;
        self.cursor += 1;
        Ok(Some((idx, frame.clone())))
    }
}

/// One still image shown for a fixed number of frames.
#[derive(Clone, Debug)]
pub struct StillSource {
    info: SourceInfo,
    frame: FrameRGBA,
    frame_count: u64,
    cursor: u64,
}

impl StillSource {
    pub fn new(frame: FrameRGBA, fps: Fps, frame_count: u64) -> CaptionResult<Self> {
        if frame_count == 0 {
            return Err(CaptionError::validation("still source needs at least one frame"));
        }
        Ok(Self {
            info: SourceInfo {
                width: frame.width,
                height: frame.height,
                fps,
                frame_count: Some(frame_count),
                duration_sec: Some(fps.frames_to_secs(frame_count)),
            },
            frame,
            frame_count,
            cursor: 0,
        })
    }

    /// Load a PNG/JPEG/... still covering `duration_sec` at `fps`.
    pub fn open(path: &Path, fps: Fps, duration_sec: f64) -> CaptionResult<Self> {
        use anyhow::Context as _;
        let img = image::open(path)
            .with_context(|| format!("failed to open image '{}'", path.display()))?
            .to_rgba8();
        let (w, h) = img.dimensions();
        let frame = FrameRGBA::from_straight_rgba(w, h, img.into_raw())?;
        Self::new(frame, fps, fps.secs_to_frames_ceil(duration_sec).max(1))
    }
}

impl FrameSource for StillSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn seek(&mut self, source_index: u64) -> CaptionResult<()> {
        self.cursor = source_index;
        Ok(())
    }

    fn next_frame(&mut self) -> CaptionResult<Option<(u64, FrameRGBA)>> {
        if self.cursor >= self.frame_count {
            return Ok(None);
        }
        let idx = self.cursor;
        self.cursor += 1;
        Ok(Some((idx, self.frame.clone())))
    }
}

/// `true` for file extensions [`StillSource::open`] handles.
pub fn is_still_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            matches!(
                e.to_ascii_lowercase().as_str(),
                "png" | "jpg" | "jpeg" | "bmp" | "webp"
            )
        })
}

/// Probe a video through `ffprobe`.
pub fn probe_video(path: &Path) -> CaptionResult<SourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
        nb_frames: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| CaptionError::decode(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(CaptionError::decode(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| CaptionError::decode(format!("ffprobe json parse failed: {e}")))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| CaptionError::decode("no video stream found"))?;
    let width = video
        .width
        .ok_or_else(|| CaptionError::decode("missing video width from ffprobe"))?;
    let height = video
        .height
        .ok_or_else(|| CaptionError::decode("missing video height from ffprobe"))?;
    let fps = source_fps_or_fallback(video.r_frame_rate.as_deref());
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0);
    let frame_count = video
        .nb_frames
        .as_deref()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|n| *n > 0)
        .or_else(|| duration_sec.map(|d| fps.secs_to_frames_ceil(d)));

    Ok(SourceInfo {
        width,
        height,
        fps,
        frame_count,
        duration_sec,
    })
}

/// Parse an ffprobe rate such as `30000/1001`, falling back to 25 fps.
pub fn source_fps_or_fallback(rate: Option<&str>) -> Fps {
    match rate.map(Fps::parse) {
        Some(Ok(fps)) => fps,
        _ => {
            tracing::warn!(
                rate = rate.unwrap_or("<missing>"),
                fallback = FALLBACK_SOURCE_FPS,
                "source frame rate unusable, assuming fallback"
            );
            Fps {
                num: FALLBACK_SOURCE_FPS,
                den: 1,
            }
        }
    }
}

/// Streams raw RGBA frames out of one `ffmpeg` child process.
///
/// The process is spawned on the first [`FrameSource::next_frame`] call so a preceding `seek`
/// can start decoding at the right timestamp.
pub struct FfmpegSource {
    path: PathBuf,
    info: SourceInfo,
    next_index: u64,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    finished: bool,
}

impl FfmpegSource {
    /// Probe `path` and prepare to decode it.
    pub fn open(path: impl Into<PathBuf>) -> CaptionResult<Self> {
        let path = path.into();
        let info = probe_video(&path)?;
        tracing::debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            fps = %info.fps,
            frames = ?info.frame_count,
            "probed source video"
        );
        Ok(Self {
            path,
            info,
            next_index: 0,
            child: None,
            stdout: None,
            stderr_drain: None,
            finished: false,
        })
    }

    fn spawn(&mut self) -> CaptionResult<()> {
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args(["-v", "error"]);
        if self.next_index > 0 {
            let start = self.info.fps.frames_to_secs(self.next_index);
            cmd.args(["-ss", &format!("{start:.9}")]);
        }
        cmd.arg("-i").arg(&self.path);
        cmd.args(["-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"]);

        let mut child = cmd
            .spawn()
            .map_err(|e| CaptionError::decode(format!("failed to spawn ffmpeg: {e}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CaptionError::decode("failed to open ffmpeg stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| CaptionError::decode("failed to open ffmpeg stderr"))?;
        self.stderr_drain = Some(std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        }));
        self.child = Some(child);
        self.stdout = Some(stdout);
        Ok(())
    }

    /// Reap the child and turn a failed exit into an error.
    fn finish(&mut self) -> CaptionResult<()> {
        self.finished = true;
        drop(self.stdout.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child
            .wait()
            .map_err(|e| CaptionError::decode(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| CaptionError::decode("ffmpeg stderr drain thread panicked"))?
                .unwrap_or_default(),
            None => Vec::new(),
        };
        if status.success() {
            Ok(())
        } else {
            Err(CaptionError::decode(format!(
                "ffmpeg exited with status {status}: {}",
                String::from_utf8_lossy(&stderr).trim()
            )))
        }
    }
}

impl FrameSource for FfmpegSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn seek(&mut self, source_index: u64) -> CaptionResult<()> {
        if self.child.is_some() || self.finished {
            return Err(CaptionError::decode(
                "ffmpeg source can only seek before decoding starts",
            ));
        }
        self.next_index = source_index;
        Ok(())
    }

    fn next_frame(&mut self) -> CaptionResult<Option<(u64, FrameRGBA)>> {
        if self.finished {
            return Ok(None);
        }
        if self.child.is_none() {
            self.spawn()?;
        }
        let len = self.info.width as usize * self.info.height as usize * 4;
        let mut buf = vec![0u8; len];
        let stdout = self
            .stdout
            .as_mut()
            .ok_or_else(|| CaptionError::decode("ffmpeg source is closed"))?;
        let got = read_full(stdout, &mut buf)
            .map_err(|e| CaptionError::decode(format!("reading ffmpeg output failed: {e}")))?;
        if got < len {
            if got > 0 {
                tracing::warn!(got, expected = len, "dropping truncated trailing frame");
            }
            self.finish()?;
            return Ok(None);
        }

        let idx = self.next_index;
        self.next_index += 1;
        let frame = FrameRGBA::from_straight_rgba(self.info.width, self.info.height, buf)?;
        Ok(Some((idx, frame)))
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Read until `buf` is full or the stream ends; returns the bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
