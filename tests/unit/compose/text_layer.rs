use super::*;
use crate::effects::{Effect, EffectRegistry, PrepareParams};
use crate::foundation::error::CaptionError;
use crate::raster::color::Rgba8;
use crate::timing::caption::MinDurationPolicy;
use crate::timing::word::WordEffectOverride;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const CANVAS: Canvas = Canvas {
    width: 200,
    height: 100,
};

fn style() -> TextStyle {
    TextStyle {
        size_px: 20.0,
        fill: Rgba8::WHITE,
        outline: Rgba8::BLACK,
        outline_width: 0,
    }
}

fn caption(words: Vec<WordTimestamp>) -> Caption {
    Caption::from_words(words, &MinDurationPolicy::default())
}

fn hi_there() -> Caption {
    caption(vec![
        WordTimestamp::new("Hi", 0.0, 0.4),
        WordTimestamp::new("there.", 0.4, 0.9),
    ])
}

fn active(slug: &str, intensity: u8) -> ActiveEffect {
    ActiveEffect {
        effect: EffectRegistry::builtin().create(slug).unwrap(),
        intensity,
    }
}

/// Counts prepares and draws a fixed red square, or fails every transform.
struct Recorder {
    prepares: Arc<AtomicUsize>,
    fail: bool,
    ready: bool,
}

impl Effect for Recorder {
    fn slug(&self) -> &'static str {
        "recorder"
    }
    fn display_name(&self) -> &'static str {
        "Recorder"
    }
    fn default_intensity(&self) -> u8 {
        50
    }
    fn prepare(&mut self, _params: &PrepareParams<'_>) -> CaptionResult<()> {
        self.prepares.fetch_add(1, Ordering::SeqCst);
        self.ready = true;
        Ok(())
    }
    fn transform(
        &self,
        input: &FrameRGBA,
        _params: &TransformParams<'_>,
    ) -> CaptionResult<FrameRGBA> {
        if self.fail || !self.ready {
            return Err(CaptionError::effect("recorder failure"));
        }
        let mut out = input.clone();
        crate::raster::draw::fill_rect(&mut out, 0, 0, 4, 4, Rgba8::opaque(255, 0, 0));
        Ok(out)
    }
}

fn recorder(fail: bool) -> (ActiveEffect, Arc<AtomicUsize>) {
    let prepares = Arc::new(AtomicUsize::new(0));
    let effect = Recorder {
        prepares: Arc::clone(&prepares),
        fail,
        ready: false,
    };
    (
        ActiveEffect {
            effect: Box::new(effect),
            intensity: 50,
        },
        prepares,
    )
}

#[test]
fn plain_caption_sits_above_the_anchor_line() {
    let r = TextRenderer::block();
    let mut c = CaptionCompositor::new(style(), 12.0, Vec::new());
    let layer = c.render_layer(CANVAS, 0, &hi_there(), 0, &r).unwrap();
    let b = layer.content_bounds().unwrap();
    assert!(b.y1 <= 90.0, "{b:?}");
    assert!(b.y0 >= 60.0, "{b:?}");
    assert!((b.x0 + b.x1 - 200.0).abs() <= 2.0, "{b:?}");
}

#[test]
fn mode_follows_word_effect_and_overrides() {
    let plain = CaptionCompositor::new(style(), 12.0, vec![active("fade", 50)]);
    assert_eq!(plain.mode_for(&hi_there()), TextMode::Caption);

    let glow = CaptionCompositor::new(style(), 12.0, vec![active("glow", 70)]);
    assert_eq!(glow.word_effect(), Some("glow"));
    assert_eq!(glow.mode_for(&hi_there()), TextMode::WordLevel);

    let mut override_only = WordEffectOverride::default();
    override_only.effects.insert("glow".into(), true);
    let c = caption(vec![
        WordTimestamp::new("Hi", 0.0, 0.4).with_override(override_only),
        WordTimestamp::new("there.", 0.4, 0.9),
    ]);
    assert_eq!(plain.mode_for(&c), TextMode::WordLevel);
}

#[test]
fn earliest_word_level_effect_runs_per_word() {
    let neon_first = CaptionCompositor::new(
        style(),
        12.0,
        vec![active("wave", 60), active("neon", 80), active("glow", 70)],
    );
    assert_eq!(neon_first.word_effect(), Some("neon"));

    let glow_first =
        CaptionCompositor::new(style(), 12.0, vec![active("glow", 70), active("neon", 80)]);
    assert_eq!(glow_first.word_effect(), Some("glow"));

    let muted = CaptionCompositor::new(style(), 12.0, vec![active("glow", 0), active("neon", 80)]);
    assert_eq!(muted.word_effect(), Some("neon"));
}

#[test]
fn non_word_effects_run_on_the_word_layer() {
    let r = TextRenderer::block();
    let mut neon_only = CaptionCompositor::new(style(), 12.0, vec![active("neon", 80)]);
    let mut neon_glow =
        CaptionCompositor::new(style(), 12.0, vec![active("neon", 80), active("glow", 70)]);
    let a = neon_only.render_layer(CANVAS, 0, &hi_there(), 2, &r).unwrap();
    let b = neon_glow.render_layer(CANVAS, 0, &hi_there(), 2, &r).unwrap();
    // Glow is not the word effect here, so it transforms the whole caption layer afterwards.
    assert_ne!(a, b);
}

#[test]
fn word_color_override_is_drawn() {
    let r = TextRenderer::block();
    let red = Rgba8::opaque(255, 0, 0);
    let mut c = CaptionCompositor::new(style(), 12.0, Vec::new());
    let cap = caption(vec![
        WordTimestamp::new("Hi", 0.0, 0.4).with_override(WordEffectOverride {
            effects: [("glow".to_owned(), false)].into_iter().collect(),
            color_override: Some(red),
            ..WordEffectOverride::default()
        }),
        WordTimestamp::new("there.", 0.4, 0.9),
    ]);
    let layer = c.render_layer(CANVAS, 0, &cap, 0, &r).unwrap();
    let has_red = layer
        .data
        .chunks_exact(4)
        .any(|px| px == [255, 0, 0, 255]);
    let has_white = layer
        .data
        .chunks_exact(4)
        .any(|px| px == [255, 255, 255, 255]);
    assert!(has_red && has_white);
}

#[test]
fn glowing_words_spread_past_plain_ink() {
    let r = TextRenderer::block();
    let mut plain = CaptionCompositor::new(style(), 12.0, vec![active("glow", 0)]);
    let mut glow = CaptionCompositor::new(style(), 12.0, vec![active("glow", 100)]);
    let a = plain.render_layer(CANVAS, 0, &hi_there(), 3, &r).unwrap();
    let b = glow.render_layer(CANVAS, 0, &hi_there(), 3, &r).unwrap();
    let area = |f: &FrameRGBA| f.data.chunks_exact(4).filter(|px| px[3] > 0).count();
    assert!(area(&b) > area(&a));
}

#[test]
fn effects_prepare_once_per_caption() {
    let r = TextRenderer::block();
    let (p, prepares) = recorder(false);
    let mut c = CaptionCompositor::new(style(), 12.0, vec![p]);
    let cap = hi_there();
    for frame in 0..3 {
        c.render_layer(CANVAS, 0, &cap, frame, &r).unwrap();
    }
    assert_eq!(prepares.load(Ordering::SeqCst), 1);
    c.render_layer(CANVAS, 1, &cap, 0, &r).unwrap();
    assert_eq!(prepares.load(Ordering::SeqCst), 2);
}

#[test]
fn failing_effect_leaves_base_text() {
    let r = TextRenderer::block();
    let (p, _) = recorder(true);
    let mut with_recorder = CaptionCompositor::new(style(), 12.0, vec![p]);
    let mut bare = CaptionCompositor::new(style(), 12.0, Vec::new());
    let a = with_recorder.render_layer(CANVAS, 0, &hi_there(), 0, &r).unwrap();
    let b = bare.render_layer(CANVAS, 0, &hi_there(), 0, &r).unwrap();
    assert_eq!(a, b);
}

#[test]
fn typewriter_suppresses_base_text_on_first_frame() {
    let r = TextRenderer::block();
    let mut c = CaptionCompositor::new(style(), 12.0, vec![active("typewriter", 70)]);
    let mut bare = CaptionCompositor::new(style(), 12.0, Vec::new());
    let typed = c.render_layer(CANVAS, 0, &hi_there(), 0, &r).unwrap();
    let full = bare.render_layer(CANVAS, 0, &hi_there(), 0, &r).unwrap();
    assert_ne!(typed, full);
}

#[test]
fn layer_touching_last_row_is_lifted() {
    let mut layer = FrameRGBA::new_transparent(10, 10);
    crate::raster::draw::fill_rect(&mut layer, 2, 7, 5, 10, Rgba8::WHITE);
    let lifted = keep_inside(layer);
    let b = lifted.content_bounds().unwrap();
    assert_eq!((b.y0, b.y1), (6.0, 9.0));

    let mut high = FrameRGBA::new_transparent(10, 10);
    crate::raster::draw::fill_rect(&mut high, 2, 2, 5, 5, Rgba8::WHITE);
    assert_eq!(keep_inside(high.clone()), high);
}

#[test]
fn frames_without_caption_pass_through() {
    let r = TextRenderer::block();
    let mut c = CaptionCompositor::new(style(), 12.0, Vec::new());
    let mut base = FrameRGBA::solid(200, 100, Rgba8::BLACK);
    let before = base.clone();
    let clock = FrameClockState {
        output_frame_index: 5,
        source_frame_index: 15,
        source_time_sec: 5.0 / 12.0,
        active_caption: None,
        caption_relative_frame_index: 0,
        caption_start_output_frame: None,
    };
    c.composite(&mut base, &clock, &[hi_there()], &r).unwrap();
    assert_eq!(base, before);

    let clock = FrameClockState {
        active_caption: Some(0),
        ..clock
    };
    c.composite(&mut base, &clock, &[hi_there()], &r).unwrap();
    assert_ne!(base, before);
}

#[test]
fn zero_intensity_effects_leave_the_plain_caption() {
    let r = TextRenderer::block();
    let mut bare = CaptionCompositor::new(style(), 12.0, Vec::new());
    let registry = EffectRegistry::builtin();
    for d in registry.descriptors() {
        if d.scope != crate::effects::EffectScope::Text {
            continue;
        }
        let mut c = CaptionCompositor::new(style(), 12.0, vec![active(d.slug, 0)]);
        assert_eq!(c.word_effect(), None, "{}", d.slug);
        for frame in [0, 4, 9] {
            let a = c.render_layer(CANVAS, 0, &hi_there(), frame, &r).unwrap();
            let b = bare.render_layer(CANVAS, 0, &hi_there(), frame, &r).unwrap();
            assert_eq!(a, b, "{} frame {frame}", d.slug);
        }
    }
}

#[test]
fn word_color_follows_the_active_word_effect() {
    let r = TextRenderer::block();
    let (red, green) = (Rgba8::opaque(255, 0, 0), Rgba8::opaque(0, 255, 0));
    let colored = WordEffectOverride {
        effect_colors: [("neon".to_owned(), red), ("glow".to_owned(), green)]
            .into_iter()
            .collect(),
        ..WordEffectOverride::default()
    };
    let cap = caption(vec![
        WordTimestamp::new("Hi", 0.0, 0.4).with_override(colored),
        WordTimestamp::new("there.", 0.4, 0.9),
    ]);
    let has = |layer: &FrameRGBA, c: Rgba8| {
        layer
            .data
            .chunks_exact(4)
            .any(|px| px == [c.r, c.g, c.b, 255])
    };

    let mut neon = CaptionCompositor::new(style(), 12.0, vec![active("neon", 30)]);
    let layer = neon.render_layer(CANVAS, 0, &cap, 0, &r).unwrap();
    assert!(has(&layer, red) && !has(&layer, green));

    // No word-level effect: slug colors do not apply.
    let mut plain = CaptionCompositor::new(style(), 12.0, Vec::new());
    let layer = plain.render_layer(CANVAS, 0, &cap, 0, &r).unwrap();
    assert!(!has(&layer, red) && !has(&layer, green));
}
