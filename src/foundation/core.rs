use crate::foundation::error::{CaptionError, CaptionResult};

pub use kurbo::{Point, Rect};

/// 0-based frame index, either in source or output frame space depending on context.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> CaptionResult<Self> {
        if den == 0 {
            return Err(CaptionError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(CaptionError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Whole-number frame rate (`fps/1`).
    pub fn integer(fps: u32) -> CaptionResult<Self> {
        Self::new(fps, 1)
    }

    /// Parse `"30000/1001"`, `"25"` or `"29.97"`.
    ///
    /// Decimal input is converted with millisecond-level precision (`den = 1000`).
    pub fn parse(s: &str) -> CaptionResult<Self> {
        let s = s.trim();
        if let Some((num, den)) = s.split_once('/') {
            let num = num
                .trim()
                .parse::<u32>()
                .map_err(|_| CaptionError::validation(format!("invalid fps numerator in '{s}'")))?;
            let den = den.trim().parse::<u32>().map_err(|_| {
                CaptionError::validation(format!("invalid fps denominator in '{s}'"))
            })?;
            return Self::new(num, den);
        }
        if let Ok(v) = s.parse::<u32>() {
            return Self::new(v, 1);
        }
        let v = s
            .parse::<f64>()
            .map_err(|_| CaptionError::validation(format!("invalid fps '{s}'")))?;
        Self::from_f64(v)
    }

    /// Convert a floating-point rate (`den = 1000`).
    pub fn from_f64(fps: f64) -> CaptionResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(CaptionError::validation(format!(
                "fps must be finite and > 0, got {fps}"
            )));
        }
        let num = (fps * 1000.0).round();
        if num < 1.0 || num > f64::from(u32::MAX) {
            return Err(CaptionError::validation(format!("fps {fps} is out of range")));
        }
        Self::new(num as u32, 1000)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * f64::from(self.den) / f64::from(self.num)
    }

    /// Convert seconds to frame count using floor semantics.
    pub fn secs_to_frames_floor(self, secs: f64) -> u64 {
        (secs * self.as_f64()).floor().max(0.0) as u64
    }

    /// Convert seconds to frame count using ceil semantics.
    pub fn secs_to_frames_ceil(self, secs: f64) -> u64 {
        // Guard against 2.0000000001 style float noise pushing an exact boundary up a frame.
        let frames = secs * self.as_f64();
        let rounded = frames.round();
        if (frames - rounded).abs() < 1e-9 {
            return rounded.max(0.0) as u64;
        }
        frames.ceil().max(0.0) as u64
    }

    /// Convert a frame count at this rate into a frame count at `other`, flooring.
    ///
    /// Exact rational arithmetic, so `4` frames at 12 fps is exactly `10` frames at 30 fps.
    pub fn rescale_frames_floor(self, frames: u64, other: Fps) -> u64 {
        let num = u128::from(frames) * u128::from(self.den) * u128::from(other.num);
        let den = u128::from(self.num) * u128::from(other.den);
        if den == 0 {
            return 0;
        }
        (num / den).min(u128::from(u64::MAX)) as u64
    }

    /// Number of frames at this rate per frame at `output`, rounded up, never below 1.
    ///
    /// `30/1` over `12/1` gives 3.
    pub fn skip_factor_to(self, output: Fps) -> u64 {
        let a = u64::from(self.num) * u64::from(output.den);
        let b = u64::from(self.den) * u64::from(output.num);
        if b == 0 {
            return 1;
        }
        a.div_ceil(b).max(1)
    }
}

impl std::fmt::Display for Fps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Size scaled down to `target_height` keeping aspect ratio; never scales up.
    pub fn fit_height(self, target_height: u32) -> Self {
        if target_height == 0 || self.height <= target_height {
            return self;
        }
        let aspect = f64::from(self.width) / f64::from(self.height);
        let width = ((f64::from(target_height) * aspect) as u32).max(1);
        Self {
            width,
            height: target_height,
        }
    }

    /// Size rounded down to even dimensions (yuv420p needs them), never below 2x2.
    pub fn even(self) -> Self {
        Self {
            width: (self.width & !1).max(2),
            height: (self.height & !1).max(2),
        }
    }
}
