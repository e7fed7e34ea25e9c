use crate::encode::ensure_parent_dir;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{CaptionError, CaptionResult};
use crate::raster::color::Rgba8;
use crate::raster::frame::FrameRGBA;
use image::codecs::gif::{GifEncoder, Repeat};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

/// Viewers treat delays below 2cs as 10cs.
const MIN_DELAY_CS: u32 = 2;

/// Options for [`GifSink`].
#[derive(Clone, Debug)]
pub struct GifSinkOpts {
    pub out_path: PathBuf,
    /// Loop forever instead of playing once.
    pub loop_forever: bool,
    /// Color transparent pixels are flattened onto.
    pub background: Rgba8,
}

impl GifSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            loop_forever: true,
            background: Rgba8::BLACK,
        }
    }
}

/// Round a duration to whole centiseconds, the GIF delay unit.
pub fn centiseconds(duration_secs: f64) -> u32 {
    (duration_secs.max(0.0) * 100.0).round() as u32
}

/// Animated GIF writer honoring per-frame display durations.
///
/// Delays are derived from the running total so rounding to centiseconds does not drift the
/// animation against the source timing.
pub struct GifSink {
    opts: GifSinkOpts,
    encoder: Option<GifEncoder<BufWriter<File>>>,
    cfg: Option<SinkConfig>,
    elapsed_secs: f64,
    emitted_cs: u32,
    last_idx: Option<FrameIndex>,
}

impl GifSink {
    pub fn new(opts: GifSinkOpts) -> Self {
        Self {
            opts,
            encoder: None,
            cfg: None,
            elapsed_secs: 0.0,
            emitted_cs: 0,
            last_idx: None,
        }
    }

    fn next_delay_cs(&mut self, duration_secs: f64) -> u32 {
        self.elapsed_secs += duration_secs.max(0.0);
        let target = centiseconds(self.elapsed_secs);
        let delay = target.saturating_sub(self.emitted_cs).max(MIN_DELAY_CS);
        self.emitted_cs += delay;
        delay
    }
}

impl FrameSink for GifSink {
    fn begin(&mut self, cfg: SinkConfig) -> CaptionResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(CaptionError::validation(
                "gif sink width/height must be non-zero",
            ));
        }
        if cfg.width > u32::from(u16::MAX) || cfg.height > u32::from(u16::MAX) {
            return Err(CaptionError::validation(format!(
                "gif frames are limited to 65535px, got {}x{}",
                cfg.width, cfg.height
            )));
        }
        ensure_parent_dir(&self.opts.out_path)?;

        use anyhow::Context as _;
        let file = File::create(&self.opts.out_path)
            .with_context(|| format!("failed to create '{}'", self.opts.out_path.display()))?;
        let mut encoder = GifEncoder::new(BufWriter::new(file));
        if self.opts.loop_forever {
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(|e| CaptionError::encode(format!("gif loop flag: {e}")))?;
        }

        self.encoder = Some(encoder);
        self.cfg = Some(cfg);
        self.elapsed_secs = 0.0;
        self.emitted_cs = 0;
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(
        &mut self,
        idx: FrameIndex,
        frame: &FrameRGBA,
        duration_secs: f64,
    ) -> CaptionResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| CaptionError::encode("gif sink not started"))?;
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(CaptionError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(CaptionError::encode(
                "gif sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        let image = frame.flattened_over(self.opts.background).to_rgba_image()?;
        let delay_cs = self.next_delay_cs(duration_secs);
        let delay = image::Delay::from_numer_denom_ms(delay_cs * 10, 1);
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| CaptionError::encode("gif sink is already finalized"))?;
        encoder
            .encode_frame(image::Frame::from_parts(image, 0, 0, delay))
            .map_err(|e| CaptionError::encode(format!("gif frame {}: {e}", idx.0)))?;
        Ok(())
    }

    fn end(&mut self) -> CaptionResult<()> {
        // Dropping the encoder writes the trailer and flushes the file.
        let encoder = self
            .encoder
            .take()
            .ok_or_else(|| CaptionError::encode("gif sink not started"))?;
        drop(encoder);
        tracing::debug!(
            path = %self.opts.out_path.display(),
            total_cs = self.emitted_cs,
            "finished gif"
        );
        self.cfg = None;
        Ok(())
    }
}
