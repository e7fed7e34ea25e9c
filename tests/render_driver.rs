use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use captionfx::{
    CaptionError, CaptionResult, EffectConfig, EffectRegistry, Fps, FrameRGBA, FrameSource,
    InMemorySink, InMemorySource, RenderDriver, RenderMode, RenderSettings, Rgba8, SourceInfo,
    TextRenderer, TextStyle, WindowRequest, WordTimestamp, group,
};

fn style() -> TextStyle {
    TextStyle {
        size_px: 20.0,
        fill: Rgba8::WHITE,
        outline: Rgba8::BLACK,
        outline_width: 1,
    }
}

/// `count` frames whose top-left red channel encodes the source index.
fn numbered_source(fps: u32, count: usize) -> InMemorySource {
    let frames = (0..count)
        .map(|i| {
            let mut f = FrameRGBA::solid(160, 90, Rgba8::opaque(0, 0, 40));
            f.put_pixel(0, 0, [i as u8, 0, 0, 255]);
            f
        })
        .collect();
    InMemorySource::new(Fps::integer(fps).unwrap(), frames).unwrap()
}

fn hi_there() -> Vec<WordTimestamp> {
    vec![
        WordTimestamp::new("Hi", 0.0, 0.4),
        WordTimestamp::new("there.", 0.4, 0.9),
    ]
}

fn settings(mode: RenderMode, effects: Vec<EffectConfig>) -> RenderSettings {
    let mut s = RenderSettings::new(mode, Fps::integer(12).unwrap(), style());
    s.effects = effects;
    s
}

#[test]
fn thirty_to_twelve_selects_every_third_source_frame() {
    let registry = EffectRegistry::builtin();
    let renderer = TextRenderer::block();
    let driver = RenderDriver::new(&registry, &renderer, settings(RenderMode::Preview, vec![]));
    let mut source = numbered_source(30, 60);
    let mut sink = InMemorySink::new();

    let report = driver
        .render(&mut source, group(&hi_there()), &mut sink)
        .unwrap();

    assert!(!report.stopped_early);
    assert_eq!(report.window.start_output_frame, 0);
    let frames = sink.frames();
    assert_eq!(frames.len() as u64, report.frames);
    assert_eq!(frames.len(), 20);
    for (k, f) in frames.iter().enumerate() {
        assert_eq!(f.index.0, k as u64);
        assert_eq!(f.frame.pixel(0, 0)[0] as usize, 3 * k);
    }
    assert!(sink.is_finished());
}

#[test]
fn short_caption_is_padded_once_on_its_final_frame() {
    let registry = EffectRegistry::builtin();
    let renderer = TextRenderer::block();
    let driver = RenderDriver::new(&registry, &renderer, settings(RenderMode::Preview, vec![]));
    let words = vec![
        WordTimestamp::new("Go", 1.0, 1.15),
        WordTimestamp::new("now", 1.15, 1.3),
    ];
    let captions = group(&words);
    assert_eq!(captions.len(), 1);
    assert!((captions[0].padding_needed_sec - 1.7).abs() < 1e-9);

    let mut source = numbered_source(12, 60);
    let mut sink = InMemorySink::new();
    let report = driver.render(&mut source, captions, &mut sink).unwrap();

    let base = 1.0 / 12.0;
    let padded: Vec<usize> = sink
        .frames()
        .iter()
        .enumerate()
        .filter(|(_, f)| f.duration_secs > base + 1e-9)
        .map(|(i, _)| i)
        .collect();
    // Frames 12..=15 show the caption; 15 (t = 1.25) is within one frame of its end.
    assert_eq!(padded, vec![15]);
    assert!((sink.frames()[15].duration_secs - (base + 1.7)).abs() < 1e-9);
    assert!((report.padding_applied_sec - 1.7).abs() < 1e-9);
    let expected_total = report.frames as f64 * base + 1.7;
    assert!((report.total_duration_sec - expected_total).abs() < 1e-9);
    assert!((sink.total_duration_secs() - expected_total).abs() < 1e-9);
}

/// Frames whose duration carries padding, as `(output index, duration)`.
fn padded_frames(sink: &InMemorySink) -> Vec<(usize, f64)> {
    let base = 1.0 / 12.0;
    sink.frames()
        .iter()
        .enumerate()
        .filter(|(_, f)| f.duration_secs > base + 1e-9)
        .map(|(i, f)| (i, f.duration_secs))
        .collect()
}

fn go_now() -> Vec<WordTimestamp> {
    vec![
        WordTimestamp::new("Go", 0.0, 0.5),
        WordTimestamp::new("now", 0.5, 1.09),
    ]
}

#[test]
fn padding_lands_on_last_selected_frame_at_thirty_to_twelve() {
    let registry = EffectRegistry::builtin();
    let renderer = TextRenderer::block();
    let driver = RenderDriver::new(&registry, &renderer, settings(RenderMode::Preview, vec![]));
    let captions = group(&go_now());
    assert!((captions[0].padding_needed_sec - 0.91).abs() < 1e-9);

    let mut source = numbered_source(30, 90);
    let mut sink = InMemorySink::new();
    let report = driver.render(&mut source, captions, &mut sink).unwrap();

    // Selected frames are 0.1s apart; t = 1.0 (output 10) is the caption's last.
    assert_eq!(report.frames, 23);
    let padded = padded_frames(&sink);
    assert_eq!(padded.len(), 1);
    assert_eq!(padded[0].0, 10);
    assert_eq!(sink.frames()[10].frame.pixel(0, 0)[0], 30);
    assert!((padded[0].1 - (1.0 / 12.0 + 0.91)).abs() < 1e-9);
    assert!((report.padding_applied_sec - 0.91).abs() < 1e-9);
}

#[test]
fn padding_lands_on_last_selected_frame_at_twenty_five_to_twelve() {
    let registry = EffectRegistry::builtin();
    let renderer = TextRenderer::block();
    let driver = RenderDriver::new(&registry, &renderer, settings(RenderMode::Preview, vec![]));

    let mut source = numbered_source(25, 75);
    let mut sink = InMemorySink::new();
    let report = driver
        .render(&mut source, group(&go_now()), &mut sink)
        .unwrap();

    // Selected frames are 0.12s apart; t = 1.08 (source 27, output 9) is the caption's last.
    assert_eq!(report.frames, 19);
    let padded = padded_frames(&sink);
    assert_eq!(padded.len(), 1);
    assert_eq!(padded[0].0, 9);
    assert_eq!(sink.frames()[9].frame.pixel(0, 0)[0], 27);
    assert!((report.padding_applied_sec - 0.91).abs() < 1e-9);
}

#[test]
fn short_final_window_is_extended_past_last_caption() {
    let registry = EffectRegistry::builtin();
    let renderer = TextRenderer::block();
    let mut s = settings(RenderMode::Final, vec![]);
    s.window = WindowRequest::range(0, 3);
    let driver = RenderDriver::new(&registry, &renderer, s);
    let mut source = numbered_source(12, 48);
    let mut sink = InMemorySink::new();

    let report = driver
        .render(&mut source, group(&hi_there()), &mut sink)
        .unwrap();
    assert!(report.extended);
    assert_eq!(report.requested_end, Some(3));
    // ceil((0.9 + 0.5) * 12) = 17
    assert_eq!(report.window.end_output_frame, 17);
    assert_eq!(report.frames, 18);
}

#[test]
fn honored_final_window_starts_mid_source() {
    let registry = EffectRegistry::builtin();
    let renderer = TextRenderer::block();
    let mut s = settings(RenderMode::Final, vec![]);
    s.window = WindowRequest::range(6, 20);
    let driver = RenderDriver::new(&registry, &renderer, s);
    let mut source = numbered_source(12, 48);
    let mut sink = InMemorySink::new();

    let report = driver
        .render(&mut source, group(&hi_there()), &mut sink)
        .unwrap();
    assert!(!report.extended);
    assert_eq!(report.frames, 15);
    assert_eq!(sink.frames()[0].index.0, 0);
    assert_eq!(sink.frames()[0].frame.pixel(0, 0)[0], 6);
}

#[test]
fn zero_intensity_effect_renders_like_no_effect() {
    let registry = EffectRegistry::builtin();
    let renderer = TextRenderer::block();
    let render = |effects: Vec<EffectConfig>| {
        let driver = RenderDriver::new(
            &registry,
            &renderer,
            settings(RenderMode::Preview, effects),
        );
        let mut source = InMemorySource::repeat(
            Fps::integer(12).unwrap(),
            FrameRGBA::solid(160, 90, Rgba8::opaque(0, 0, 40)),
            24,
        )
        .unwrap();
        let mut sink = InMemorySink::new();
        driver
            .render(&mut source, group(&hi_there()), &mut sink)
            .unwrap();
        sink
    };
    let frames = |sink: &InMemorySink| -> Vec<FrameRGBA> {
        sink.frames().iter().map(|f| f.frame.clone()).collect()
    };

    let bare = render(vec![]);
    for slug in ["bounce", "fade", "glow", "typewriter", "wave"] {
        let still = render(vec![EffectConfig::new(slug).with_intensity(0)]);
        assert_eq!(frames(&still), frames(&bare), "{slug}");
    }
    // Frames 0..=10 carry the caption (t < 0.9).
    let f = frames(&bare);
    assert_eq!(f[2], f[8]);
    assert_ne!(f[2], f[20]);

    let moving = render(vec![EffectConfig::new("wave").with_intensity(100)]);
    assert_ne!(moving.frames()[2].frame, moving.frames()[8].frame);
}

#[test]
fn full_frame_effect_touches_captionless_frames() {
    let registry = EffectRegistry::builtin();
    let renderer = TextRenderer::block();
    let driver = RenderDriver::new(
        &registry,
        &renderer,
        settings(RenderMode::Preview, vec![EffectConfig::new("vhs-crt")]),
    );
    let plain = FrameRGBA::solid(160, 90, Rgba8::opaque(90, 90, 90));
    let mut source = InMemorySource::repeat(Fps::integer(12).unwrap(), plain.clone(), 30).unwrap();
    let mut sink = InMemorySink::new();
    driver
        .render(&mut source, group(&hi_there()), &mut sink)
        .unwrap();
    // Frame 20 (t = 1.67s) has no caption.
    assert_ne!(sink.frames()[20].frame, plain);
}

#[test]
fn unknown_effect_fails_before_any_frame() {
    let registry = EffectRegistry::builtin();
    let renderer = TextRenderer::block();
    let driver = RenderDriver::new(
        &registry,
        &renderer,
        settings(RenderMode::Preview, vec![EffectConfig::new("confetti")]),
    );
    let mut source = numbered_source(12, 24);
    let mut sink = InMemorySink::new();
    let err = driver
        .render(&mut source, group(&hi_there()), &mut sink)
        .unwrap_err();
    assert!(matches!(err, CaptionError::Config(_)));
    assert!(sink.config().is_none());
}

#[test]
fn final_render_needs_captions() {
    let registry = EffectRegistry::builtin();
    let renderer = TextRenderer::block();
    let driver = RenderDriver::new(&registry, &renderer, settings(RenderMode::Final, vec![]));
    let mut source = numbered_source(12, 24);
    let mut sink = InMemorySink::new();
    assert!(driver.render(&mut source, Vec::new(), &mut sink).is_err());
}

/// Decodes `ok_frames` frames, then fails.
struct FlakySource {
    inner: InMemorySource,
    ok_frames: u64,
}

impl FrameSource for FlakySource {
    fn info(&self) -> &SourceInfo {
        self.inner.info()
    }

    fn seek(&mut self, source_index: u64) -> CaptionResult<()> {
        self.inner.seek(source_index)
    }

    fn next_frame(&mut self) -> CaptionResult<Option<(u64, FrameRGBA)>> {
        match self.inner.next_frame()? {
            Some((i, _)) if i >= self.ok_frames => Err(CaptionError::decode("corrupt packet")),
            other => Ok(other),
        }
    }
}

#[test]
fn decode_failure_is_a_soft_stop() {
    let registry = EffectRegistry::builtin();
    let renderer = TextRenderer::block();
    let driver = RenderDriver::new(&registry, &renderer, settings(RenderMode::Preview, vec![]));
    let mut source = FlakySource {
        inner: numbered_source(12, 48),
        ok_frames: 5,
    };
    let mut sink = InMemorySink::new();
    let report = driver
        .render(&mut source, group(&hi_there()), &mut sink)
        .unwrap();
    assert!(report.stopped_early);
    assert_eq!(report.frames, 5);
    assert!(sink.is_finished());
}

/// Reports the inner source's length but runs dry after `yields` frames.
struct TruncatedSource {
    inner: InMemorySource,
    yields: u64,
}

impl FrameSource for TruncatedSource {
    fn info(&self) -> &SourceInfo {
        self.inner.info()
    }

    fn seek(&mut self, source_index: u64) -> CaptionResult<()> {
        self.inner.seek(source_index)
    }

    fn next_frame(&mut self) -> CaptionResult<Option<(u64, FrameRGBA)>> {
        match self.inner.next_frame()? {
            Some((i, _)) if i >= self.yields => Ok(None),
            other => Ok(other),
        }
    }
}

#[test]
fn source_running_dry_inside_window_is_a_soft_stop() {
    let registry = EffectRegistry::builtin();
    let renderer = TextRenderer::block();
    let driver = RenderDriver::new(&registry, &renderer, settings(RenderMode::Preview, vec![]));
    let mut source = TruncatedSource {
        inner: numbered_source(12, 48),
        yields: 7,
    };
    let mut sink = InMemorySink::new();
    let report = driver
        .render(&mut source, group(&hi_there()), &mut sink)
        .unwrap();
    assert!(report.stopped_early);
    assert_eq!(report.frames, 7);
    assert!(sink.is_finished());
}

#[test]
fn stop_flag_ends_the_pass() {
    let registry = EffectRegistry::builtin();
    let renderer = TextRenderer::block();
    let stop = Arc::new(AtomicBool::new(true));
    let driver = RenderDriver::new(&registry, &renderer, settings(RenderMode::Preview, vec![]))
        .with_stop_flag(Arc::clone(&stop));
    let mut source = numbered_source(12, 48);
    let mut sink = InMemorySink::new();
    let report = driver
        .render(&mut source, group(&hi_there()), &mut sink)
        .unwrap();
    assert!(report.stopped_early);
    assert_eq!(report.frames, 0);
}
