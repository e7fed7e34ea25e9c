//! Effect contract, registry and the built-in effect plugins.
//!
//! An effect is prepared once per caption (or per word, or once for a full-frame pass) and then
//! asked to transform one layer per output frame. Text effects receive the caption layer and
//! return a replacement layer holding their own rendition of the text; full-frame effects
//! receive the composited frame.

use std::collections::BTreeMap;

use crate::foundation::core::Point;
use crate::foundation::error::{CaptionError, CaptionResult};
use crate::raster::frame::FrameRGBA;
use crate::raster::text::{TextAnchor, TextRenderer, TextStyle};

mod bounce;
mod brush_stroke;
mod fade;
mod glitch;
mod glow;
mod neon;
mod rainbow;
mod shake;
mod slam;
mod sparkle;
mod typewriter;
mod vhs;
mod wave;

pub use bounce::Bounce;
pub use brush_stroke::BrushStroke;
pub use fade::Fade;
pub use glitch::Glitch;
pub use glow::Glow;
pub use neon::Neon;
pub use rainbow::Rainbow;
pub use shake::Shake;
pub use slam::Slam;
pub use sparkle::Sparkle;
pub use typewriter::Typewriter;
pub use vhs::VhsCrt;
pub use wave::Wave;

/// Largest accepted intensity.
pub const MAX_INTENSITY: u8 = 100;

/// Which layer an effect operates on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectScope {
    /// The transparent caption (or word) layer.
    Text,
    /// The whole composited frame.
    FullFrame,
}

/// Arguments to [`Effect::prepare`].
#[derive(Clone, Copy, Debug)]
pub struct PrepareParams<'a> {
    /// Output frame rate.
    pub fps: f64,
    /// Caption duration, or the nominal 2.0s for words and full-frame passes.
    pub duration_sec: f64,
    /// Text the effect will animate.
    pub text: &'a str,
    /// 0..=100.
    pub intensity: u8,
}

/// Arguments to [`Effect::transform`].
#[derive(Clone, Copy, Debug)]
pub struct TransformParams<'a> {
    pub text: &'a str,
    /// Anchor position on the layer.
    pub anchor: Point,
    /// How `anchor` relates to the drawn line.
    pub text_anchor: TextAnchor,
    /// Caption-relative frame index for text effects, absolute output index for full-frame ones.
    pub frame_index: u64,
    pub intensity: u8,
    pub style: &'a TextStyle,
    pub renderer: &'a TextRenderer,
}

impl TransformParams<'_> {
    /// `intensity / 100`.
    pub fn strength(&self) -> f64 {
        f64::from(self.intensity) / 100.0
    }
}

/// A caption effect plugin.
///
/// `prepare` must run before `transform`; calling `transform` on an unprepared instance returns
/// [`CaptionError::Effect`]. Preparing again with the same arguments yields the same state.
/// At intensity 0, or with empty text, `transform` hands back its input unchanged.
pub trait Effect: Send {
    /// Stable lowercase identifier used in configuration.
    fn slug(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    fn default_intensity(&self) -> u8;

    /// Whether the effect can animate individual words.
    fn supports_word_level(&self) -> bool {
        false
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Text
    }

    /// When true the compositor skips drawing the plain caption text under this effect.
    fn hides_base_text(&self) -> bool {
        false
    }

    fn prepare(&mut self, params: &PrepareParams<'_>) -> CaptionResult<()>;

    fn transform(&self, input: &FrameRGBA, params: &TransformParams<'_>)
    -> CaptionResult<FrameRGBA>;
}

/// Prepared state or the "transform before prepare" error.
pub(crate) fn prepared<'a, T>(state: &'a Option<T>, slug: &str) -> CaptionResult<&'a T> {
    state
        .as_ref()
        .ok_or_else(|| CaptionError::effect(format!("{slug}: transform called before prepare")))
}

/// A blank layer with `text` drawn plainly at the anchor.
pub(crate) fn plain_layer(input: &FrameRGBA, params: &TransformParams<'_>) -> FrameRGBA {
    let mut layer = input.blank_like();
    params.renderer.draw(
        &mut layer,
        params.text,
        params.anchor,
        params.text_anchor,
        params.style,
    );
    layer
}

/// Pen start of every character of `text` laid out as one line at the anchor, with the baseline.
pub(crate) fn char_origins(params: &TransformParams<'_>) -> (Vec<(char, f64)>, f64) {
    let size = params.style.size_px;
    let (pen_x, baseline) =
        params
            .renderer
            .origin(params.text, params.anchor, params.text_anchor, size);
    let mut x = pen_x;
    let mut out = Vec::with_capacity(params.text.len());
    for ch in params.text.chars() {
        out.push((ch, x));
        x += f64::from(params.renderer.advance(ch, size));
    }
    (out, baseline)
}

/// Configured use of one effect.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EffectConfig {
    /// Effect slug.
    pub effect: String,
    /// 0..=100; the effect's default when omitted.
    #[serde(default)]
    pub intensity: Option<u8>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl EffectConfig {
    pub fn new(effect: impl Into<String>) -> Self {
        Self {
            effect: effect.into(),
            intensity: None,
            enabled: true,
        }
    }

    pub fn with_intensity(mut self, intensity: u8) -> Self {
        self.intensity = Some(intensity);
        self
    }
}

/// An instantiated, enabled effect with its resolved intensity.
pub struct ActiveEffect {
    pub effect: Box<dyn Effect>,
    pub intensity: u8,
}

impl ActiveEffect {
    /// Zero intensity is a visual no-op, so it never claims word-level rendering.
    pub fn runs_per_word(&self) -> bool {
        self.intensity > 0 && self.effect.supports_word_level()
    }

    /// Whether the plain caption text must be left out of the layer this effect receives.
    pub fn hides_base_text(&self) -> bool {
        self.intensity > 0 && self.effect.hides_base_text()
    }
}

impl std::fmt::Debug for ActiveEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveEffect")
            .field("slug", &self.effect.slug())
            .field("intensity", &self.intensity)
            .finish()
    }
}

/// Fresh effect instances for one render pass, split by scope in registration order.
#[derive(Debug, Default)]
pub struct EffectSet {
    pub text: Vec<ActiveEffect>,
    pub full_frame: Vec<ActiveEffect>,
}

impl EffectSet {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.full_frame.is_empty()
    }

    /// Index of the first text effect that can run per word.
    pub fn word_level_index(&self) -> Option<usize> {
        self.text.iter().position(ActiveEffect::runs_per_word)
    }
}

/// Listing entry for one registered effect.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct EffectDescriptor {
    pub slug: &'static str,
    pub display_name: &'static str,
    pub default_intensity: u8,
    pub scope: EffectScope,
    pub word_level: bool,
}

/// Constructor for a fresh, unprepared effect.
pub type EffectCtor = fn() -> Box<dyn Effect>;

/// Slug -> constructor table.
#[derive(Clone, Debug, Default)]
pub struct EffectRegistry {
    ctors: BTreeMap<&'static str, EffectCtor>,
}

impl EffectRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in effect.
    pub fn builtin() -> Self {
        let mut reg = Self::new();
        reg.register(|| Box::new(Bounce::default()));
        reg.register(|| Box::new(BrushStroke::default()));
        reg.register(|| Box::new(Fade::default()));
        reg.register(|| Box::new(Glitch::default()));
        reg.register(|| Box::new(Glow::default()));
        reg.register(|| Box::new(Neon::default()));
        reg.register(|| Box::new(Rainbow::default()));
        reg.register(|| Box::new(Shake::default()));
        reg.register(|| Box::new(Slam::default()));
        reg.register(|| Box::new(Sparkle::default()));
        reg.register(|| Box::new(Typewriter::default()));
        reg.register(|| Box::new(VhsCrt::default()));
        reg.register(|| Box::new(Wave::default()));
        reg
    }

    /// Register `ctor` under the slug of the effect it builds, replacing any previous entry.
    pub fn register(&mut self, ctor: EffectCtor) {
        let slug = ctor().slug();
        self.ctors.insert(slug, ctor);
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.ctors.contains_key(normalize_slug(slug).as_str())
    }

    /// A fresh instance of `slug`.
    pub fn create(&self, slug: &str) -> CaptionResult<Box<dyn Effect>> {
        let key = normalize_slug(slug);
        let ctor = self
            .ctors
            .get(key.as_str())
            .ok_or_else(|| CaptionError::config(format!("unknown effect \"{slug}\"")))?;
        Ok(ctor())
    }

    /// Every registered effect, sorted by slug.
    pub fn descriptors(&self) -> Vec<EffectDescriptor> {
        self.ctors
            .values()
            .map(|ctor| {
                let e = ctor();
                EffectDescriptor {
                    slug: e.slug(),
                    display_name: e.display_name(),
                    default_intensity: e.default_intensity(),
                    scope: e.scope(),
                    word_level: e.supports_word_level(),
                }
            })
            .collect()
    }

    /// Instantiate the enabled entries of `configs` and split them by scope.
    pub fn instantiate(&self, configs: &[EffectConfig]) -> CaptionResult<EffectSet> {
        let mut set = EffectSet::default();
        for cfg in configs {
            if !cfg.enabled {
                tracing::debug!(effect = %cfg.effect, "effect disabled, skipping");
                continue;
            }
            let effect = self.create(&cfg.effect)?;
            let intensity = cfg.intensity.unwrap_or_else(|| effect.default_intensity());
            if intensity > MAX_INTENSITY {
                return Err(CaptionError::config(format!(
                    "effect \"{}\" intensity must be 0..=100, got {intensity}",
                    cfg.effect
                )));
            }
            let active = ActiveEffect { effect, intensity };
            match active.effect.scope() {
                EffectScope::Text => set.text.push(active),
                EffectScope::FullFrame => set.full_frame.push(active),
            }
        }
        Ok(set)
    }
}

fn normalize_slug(slug: &str) -> String {
    let s = slug.trim().to_ascii_lowercase().replace('_', "-");
    match s.as_str() {
        "vhs" | "crt" | "vhscrt" | "vhs/crt" => "vhs-crt".to_owned(),
        "brush" | "brushstroke" => "brush-stroke".to_owned(),
        _ => s,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/contract.rs"]
mod tests;
