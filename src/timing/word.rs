use std::collections::BTreeMap;
use std::path::Path;

use crate::foundation::error::{CaptionError, CaptionResult};
use crate::raster::color::Rgba8;

/// One transcribed word with its time span in source seconds.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WordTimestamp {
    /// Word text as transcribed (may carry trailing punctuation).
    #[serde(alias = "word")]
    pub text: String,
    /// Start time in seconds.
    #[serde(alias = "start")]
    pub start_sec: f64,
    /// End time in seconds.
    #[serde(alias = "end")]
    pub end_sec: f64,
    /// Explicit per-word effect customization.
    #[serde(
        default,
        alias = "word_effects",
        skip_serializing_if = "Option::is_none"
    )]
    pub effects: Option<WordEffectOverride>,
}

impl WordTimestamp {
    /// Word without overrides.
    pub fn new(text: impl Into<String>, start_sec: f64, end_sec: f64) -> Self {
        Self {
            text: text.into(),
            start_sec,
            end_sec,
            effects: None,
        }
    }

    /// Attach a per-word override.
    pub fn with_override(mut self, effects: WordEffectOverride) -> Self {
        self.effects = Some(effects);
        self
    }

    /// `true` when this word carries an explicit per-effect on/off entry.
    pub fn has_explicit_effects(&self) -> bool {
        self.effects.as_ref().is_some_and(|o| !o.effects.is_empty())
    }
}

/// Per-word customization: effect slug -> on/off, plus optional fill colors.
///
/// Besides `effects` and `color`, any `<slug>_color` key sets the fill used while that effect
/// is the word-level effect.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawWordEffects", into = "RawWordEffects")]
pub struct WordEffectOverride {
    /// Explicit on/off state keyed by effect slug.
    pub effects: BTreeMap<String, bool>,
    /// Fill color used instead of the global font color.
    pub color_override: Option<Rgba8>,
    /// Fill colors keyed by effect slug, read from `<slug>_color` keys.
    pub effect_colors: BTreeMap<String, Rgba8>,
}

impl WordEffectOverride {
    /// Explicit state for `slug`, if the user set one.
    pub fn enabled(&self, slug: &str) -> Option<bool> {
        self.effects.get(slug).copied()
    }

    /// Fill for this word while `slug` is the word-level effect; falls back to `color_override`.
    pub fn color_for(&self, slug: Option<&str>) -> Option<Rgba8> {
        slug.and_then(|s| self.effect_colors.get(s).copied()).or(self.color_override)
    }
}

const COLOR_SUFFIX: &str = "_color";

/// Wire shape of [`WordEffectOverride`]; unknown keys other than `<slug>_color` are ignored.
#[derive(serde::Serialize, serde::Deserialize)]
struct RawWordEffects {
    #[serde(default)]
    effects: BTreeMap<String, bool>,
    #[serde(default, alias = "color", skip_serializing_if = "Option::is_none")]
    color_override: Option<Rgba8>,
    #[serde(flatten)]
    rest: BTreeMap<String, serde_json::Value>,
}

impl TryFrom<RawWordEffects> for WordEffectOverride {
    type Error = String;

    fn try_from(raw: RawWordEffects) -> Result<Self, Self::Error> {
        let mut effect_colors = BTreeMap::new();
        for (key, value) in raw.rest {
            let Some(slug) = key.strip_suffix(COLOR_SUFFIX).filter(|s| !s.is_empty()) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let color: Rgba8 =
                serde_json::from_value(value).map_err(|e| format!("invalid '{key}': {e}"))?;
            effect_colors.insert(slug.to_owned(), color);
        }
        Ok(Self {
            effects: raw.effects,
            color_override: raw.color_override,
            effect_colors,
        })
    }
}

impl From<WordEffectOverride> for RawWordEffects {
    fn from(o: WordEffectOverride) -> Self {
        let rest = o
            .effect_colors
            .into_iter()
            .map(|(slug, c)| {
                let key = format!("{slug}{COLOR_SUFFIX}");
                (key, serde_json::Value::String(c.to_hex()))
            })
            .collect();
        Self {
            effects: o.effects,
            color_override: o.color_override,
            rest,
        }
    }
}

/// Read a JSON array of words from disk.
///
/// Accepts both `{"word","start","end"}` and `{"text","start_sec","end_sec"}` shapes.
pub fn load_words(path: &Path) -> CaptionResult<Vec<WordTimestamp>> {
    use anyhow::Context as _;
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read words file '{}'", path.display()))?;
    parse_words(&bytes)
}

/// Parse a JSON array of words and check each span.
pub fn parse_words(bytes: &[u8]) -> CaptionResult<Vec<WordTimestamp>> {
    let words: Vec<WordTimestamp> = serde_json::from_slice(bytes)?;
    for (i, w) in words.iter().enumerate() {
        if !w.start_sec.is_finite() || !w.end_sec.is_finite() {
            return Err(CaptionError::validation(format!(
                "word {i} ('{}') has a non-finite timestamp",
                w.text
            )));
        }
        if w.end_sec < w.start_sec {
            return Err(CaptionError::validation(format!(
                "word {i} ('{}') ends before it starts ({} < {})",
                w.text, w.end_sec, w.start_sec
            )));
        }
    }
    Ok(words)
}
