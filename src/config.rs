//! JSON configuration: typography, effect selections and render jobs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::clock::{WindowPolicy, WindowRequest};
use crate::effects::{EffectConfig, EffectRegistry};
use crate::foundation::core::Fps;
use crate::foundation::error::{CaptionError, CaptionResult};
use crate::raster::color::{Rgba8, parse_color_or_white};
use crate::raster::text::{TextRenderer, TextStyle};
use crate::render::driver::{RenderMode, RenderSettings};
use crate::timing::caption::MinDurationPolicy;
use crate::timing::group::{Grouper, GroupingLimits};

/// Font and color choices for caption text.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Typography {
    /// Explicit TrueType/OpenType file.
    pub font_path: Option<PathBuf>,
    /// Family looked up in the usual system font directories when no path is given.
    pub font_family: Option<String>,
    pub font_size_px: f32,
    #[serde(deserialize_with = "lenient_color")]
    pub font_color: Rgba8,
    #[serde(deserialize_with = "lenient_color")]
    pub outline_color: Rgba8,
    pub outline_width_px: u32,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_path: None,
            font_family: None,
            font_size_px: 24.0,
            font_color: Rgba8::opaque(0x00, 0xFF, 0x41),
            outline_color: Rgba8::opaque(0x00, 0x44, 0x00),
            outline_width_px: 2,
        }
    }
}

impl Typography {
    pub fn style(&self) -> TextStyle {
        TextStyle {
            size_px: self.font_size_px,
            fill: self.font_color,
            outline: self.outline_color,
            outline_width: self.outline_width_px,
        }
    }

    /// Font file to load: the explicit path, else a system font matching `font_family`.
    pub fn resolve_font(&self) -> Option<PathBuf> {
        if let Some(path) = &self.font_path {
            return Some(path.clone());
        }
        let family = self.font_family.as_deref()?;
        let found = find_system_font(family);
        if found.is_none() {
            tracing::warn!(family, "font family not found in system font directories");
        }
        found
    }

    /// Text renderer for this typography; falls back to the block face with a warning.
    pub fn renderer(&self) -> TextRenderer {
        TextRenderer::load_or_block(self.resolve_font().as_deref())
    }
}

/// Per-effect switch and strength.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EffectSetting {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// `None` uses the effect's default intensity.
    #[serde(default)]
    pub intensity: Option<u8>,
}

impl Default for EffectSetting {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A complete render description, usually read from `job.json`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderJob {
    pub output_fps: f64,
    /// Output height for previews and final renders.
    pub target_height: Option<u32>,
    pub typography: Typography,
    /// Effect settings keyed by slug.
    pub effects: BTreeMap<String, EffectSetting>,
    pub grouping: GroupingLimits,
    pub min_duration: MinDurationPolicy,
    pub window: WindowRequest,
    pub window_policy: WindowPolicy,
    /// GIF output loops forever instead of playing once.
    pub loop_forever: bool,
    /// Color transparent output is flattened onto.
    #[serde(deserialize_with = "lenient_color")]
    pub background: Rgba8,
}

impl Default for RenderJob {
    fn default() -> Self {
        Self {
            output_fps: 12.0,
            target_height: Some(480),
            typography: Typography::default(),
            effects: BTreeMap::new(),
            grouping: GroupingLimits::default(),
            min_duration: MinDurationPolicy::default(),
            window: WindowRequest::open(),
            window_policy: WindowPolicy::default(),
            loop_forever: true,
            background: Rgba8::BLACK,
        }
    }
}

impl RenderJob {
    /// Read and validate a job file.
    pub fn load(path: &Path) -> CaptionResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read render job '{}'", path.display()))?;
        let job: Self = serde_json::from_slice(&bytes)
            .map_err(|e| CaptionError::serde(format!("{}: {e}", path.display())))?;
        job.validate()?;
        Ok(job)
    }

    /// Reject values that would fail later in the pass.
    pub fn validate(&self) -> CaptionResult<()> {
        self.fps()?;
        if self.target_height == Some(0) {
            return Err(CaptionError::config("target_height must be > 0"));
        }
        if !(self.typography.font_size_px.is_finite() && self.typography.font_size_px > 0.0) {
            return Err(CaptionError::config("font_size_px must be > 0"));
        }
        if self.grouping.max_chars == 0 || self.grouping.max_duration_sec <= 0.0 {
            return Err(CaptionError::config(
                "grouping max_chars and max_duration_sec must be > 0",
            ));
        }
        if let Some(end) = self.window.end_output_frame
            && end < self.window.start_output_frame
        {
            return Err(CaptionError::config(format!(
                "window end {end} is before start {}",
                self.window.start_output_frame
            )));
        }
        Ok(())
    }

    /// Output rate; whole numbers stay exact.
    pub fn fps(&self) -> CaptionResult<Fps> {
        let fps = self.output_fps;
        if fps.is_finite() && fps > 0.0 && fps.fract() == 0.0 && fps <= f64::from(u32::MAX) {
            Fps::integer(fps as u32)
        } else {
            Fps::from_f64(fps).map_err(|e| CaptionError::config(e.to_string()))
        }
    }

    pub fn grouper(&self) -> Grouper {
        Grouper::new(self.grouping).with_policy(self.min_duration)
    }

    /// Effect configurations in registry order; unknown slugs are rejected.
    pub fn effect_configs(&self, registry: &EffectRegistry) -> CaptionResult<Vec<EffectConfig>> {
        self.effects
            .iter()
            .map(|(slug, setting)| {
                if !registry.contains(slug) {
                    return Err(CaptionError::config(format!("unknown effect \"{slug}\"")));
                }
                Ok(EffectConfig {
                    effect: slug.clone(),
                    intensity: setting.intensity,
                    enabled: setting.enabled,
                })
            })
            .collect()
    }

    /// Driver settings for `mode`.
    pub fn settings(
        &self,
        mode: RenderMode,
        registry: &EffectRegistry,
    ) -> CaptionResult<RenderSettings> {
        let mut settings = RenderSettings::new(mode, self.fps()?, self.typography.style());
        settings.target_height = self.target_height;
        settings.window = self.window;
        settings.window_policy = self.window_policy;
        settings.effects = self.effect_configs(registry)?;
        Ok(settings)
    }
}

fn lenient_color<'de, D>(deserializer: D) -> Result<Rgba8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => parse_color_or_white(&s),
        other => Rgba8::deserialize(other).unwrap_or_else(|err| {
            tracing::warn!(%err, "falling back to white");
            Rgba8::WHITE
        }),
    })
}

const FONT_DIRS: &[&str] = &[
    "/usr/share/fonts",
    "/usr/local/share/fonts",
    "/Library/Fonts",
    "/System/Library/Fonts",
    "C:\\Windows\\Fonts",
];

/// First `.ttf`/`.otf` whose file stem matches `family` (case and separators ignored).
pub fn find_system_font(family: &str) -> Option<PathBuf> {
    let want = font_key(family);
    let mut dirs: Vec<PathBuf> = FONT_DIRS.iter().map(PathBuf::from).collect();
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(Path::new(&home).join(".fonts"));
        dirs.push(Path::new(&home).join(".local/share/fonts"));
    }
    dirs.iter().find_map(|d| search_fonts(d, &want, 4))
}

fn font_key(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn search_fonts(dir: &Path, want: &str, depth: u32) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
            continue;
        }
        let is_font = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"));
        let stem_matches = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| font_key(s) == want);
        if is_font && stem_matches {
            return Some(path);
        }
    }
    if depth == 0 {
        return None;
    }
    subdirs
        .iter()
        .find_map(|d| search_fonts(d, want, depth - 1))
}
