use crate::foundation::core::Point;
use crate::foundation::error::CaptionResult;
use crate::foundation::math::{Rng64, stable_hash64};
use crate::raster::color::Rgba8;
use crate::raster::composite::over_in_place;
use crate::raster::draw::fill_rect;
use crate::raster::frame::FrameRGBA;
use crate::raster::text::{TextAnchor, TextStyle};

use super::{Effect, EffectScope, PrepareParams, TransformParams, prepared};

/// Whole-frame VHS tape / CRT look: chroma split, static, vignette, scanlines, a timecode
/// overlay and a warm, slightly desaturated grade.
#[derive(Debug, Default)]
pub struct VhsCrt {
    state: Option<VhsState>,
}

const STATIC_PATTERNS: usize = 10;
const TIMECODE_DATE: &str = "12/25/1987";

#[derive(Clone, Debug, PartialEq)]
struct StaticPoint {
    x: f64,
    y: f64,
    brightness: f64,
}

#[derive(Clone, Debug, PartialEq)]
struct VhsState {
    fps: f64,
    scanline: f64,
    chroma_px: f64,
    noise: f64,
    vignette: f64,
    show_timecode: bool,
    seed: u64,
    static_patterns: Vec<Vec<StaticPoint>>,
}

impl VhsState {
    fn new(fps: f64, intensity: u8) -> Self {
        let s = f64::from(intensity) / 100.0;
        let seed = stable_hash64(0xC27, "vhs-crt");
        let mut rng = Rng64::new(seed);
        let static_patterns = (0..STATIC_PATTERNS)
            .map(|_| {
                let n = rng.range_i32(8, 20);
                (0..n)
                    .map(|_| StaticPoint {
                        x: rng.next_f64(),
                        y: rng.next_f64(),
                        brightness: rng.range_f64(0.4, 1.0),
                    })
                    .collect()
            })
            .collect();
        Self {
            fps: fps.max(1.0),
            scanline: s,
            chroma_px: s * 3.0,
            noise: s * 0.15,
            vignette: s * 0.02,
            show_timecode: intensity > 50,
            seed,
            static_patterns,
        }
    }
}

impl Effect for VhsCrt {
    fn slug(&self) -> &'static str {
        "vhs-crt"
    }

    fn display_name(&self) -> &'static str {
        "VHS/CRT"
    }

    fn default_intensity(&self) -> u8 {
        60
    }

    fn scope(&self) -> EffectScope {
        EffectScope::FullFrame
    }

    fn prepare(&mut self, params: &PrepareParams<'_>) -> CaptionResult<()> {
        self.state = Some(VhsState::new(params.fps, params.intensity));
        Ok(())
    }

    fn transform(
        &self,
        input: &FrameRGBA,
        params: &TransformParams<'_>,
    ) -> CaptionResult<FrameRGBA> {
        let state = prepared(&self.state, self.slug())?;
        let mut out = input.clone();
        if params.intensity == 0 {
            return Ok(out);
        }
        let frame = params.frame_index;

        if state.chroma_px > 0.5 {
            chromatic_aberration(&mut out, state.chroma_px, frame);
        }
        add_static(&mut out, state, frame)?;
        if state.vignette > 0.01 {
            vignette(&mut out, state.vignette)?;
        }
        scanlines(&mut out, state.scanline)?;
        if state.show_timecode {
            timecode(&mut out, state, params, frame)?;
        }
        if params.intensity > 30 {
            grade(&mut out);
        }
        Ok(out)
    }
}

/// Shift red right and blue left by a wobbling sub-3px amount.
fn chromatic_aberration(frame: &mut FrameRGBA, offset: f64, index: u64) {
    let actual = offset + (index as f64 * 0.15).sin() * 0.8;
    let red = actual as i64;
    let blue = (-actual) as i64;
    let w = i64::from(frame.width);
    let src = frame.data.clone();
    for y in 0..i64::from(frame.height) {
        for x in 0..w {
            let i = ((y * w + x) * 4) as usize;
            if red > 0 {
                let sx = x - red;
                frame.data[i] = if sx >= 0 {
                    src[((y * w + sx) * 4) as usize]
                } else {
                    0
                };
            }
            if blue < 0 {
                let sx = x - blue;
                frame.data[i + 2] = if sx < w {
                    src[((y * w + sx) * 4 + 2) as usize]
                } else {
                    0
                };
            }
        }
    }
}

fn add_static(frame: &mut FrameRGBA, state: &VhsState, index: u64) -> CaptionResult<()> {
    if state.noise <= 0.0 {
        return Ok(());
    }
    let (w, h) = (i64::from(frame.width), i64::from(frame.height));
    let mut overlay = frame.blank_like();
    let mut rng = Rng64::for_frame(state.seed, index);
    let pattern = &state.static_patterns[(index % STATIC_PATTERNS as u64) as usize];
    for p in pattern {
        if rng.next_f64() >= state.noise * 2.0 {
            continue;
        }
        let x = (p.x * w as f64) as i64;
        let y = (p.y * h as f64) as i64;
        let a = 255.0 * p.brightness;
        let color = match rng.range_i32(0, 2) {
            0 => Rgba8::new(255, 255, 255, a as u8),
            1 => Rgba8::new(200, 200, 255, (a * 0.8) as u8),
            _ => Rgba8::new(255, 200, 200, (a * 0.8) as u8),
        };
        let size = i64::from(rng.range_i32(1, 4));
        fill_rect(&mut overlay, x, y, x + size + 1, y + size + 1, color);
    }
    if rng.next_f64() < state.noise * 0.8 {
        let y = i64::from(rng.range_i32(0, h as i32));
        let thickness = i64::from(rng.range_i32(1, 4));
        let color = Rgba8::new(255, 255, 255, (255.0 * state.noise) as u8);
        fill_rect(&mut overlay, 0, y, w, y + thickness + 1, color);
    }
    over_in_place(frame, &overlay, 1.0)
}

/// Darken towards the corners in 2x2 cells.
fn vignette(frame: &mut FrameRGBA, strength: f64) -> CaptionResult<()> {
    let mut overlay = frame.blank_like();
    let cx = f64::from(frame.width / 2);
    let cy = f64::from(frame.height / 2);
    let max_d = (cx * cx + cy * cy).sqrt().max(1.0);
    for y in (0..frame.height).step_by(2) {
        for x in (0..frame.width).step_by(2) {
            let d = ((f64::from(x) - cx).powi(2) + (f64::from(y) - cy).powi(2)).sqrt();
            let darkness = (255.0 * strength * (d / max_d).powf(1.5) * 0.8) as u8;
            if darkness > 0 {
                let c = Rgba8::new(0, 0, 0, darkness);
                fill_rect(
                    &mut overlay,
                    i64::from(x),
                    i64::from(y),
                    i64::from(x) + 2,
                    i64::from(y) + 2,
                    c,
                );
            }
        }
    }
    over_in_place(frame, &overlay, 1.0)
}

fn scanlines(frame: &mut FrameRGBA, strength: f64) -> CaptionResult<()> {
    if strength <= 0.0 {
        return Ok(());
    }
    let spacing = if strength > 0.7 { 2 } else { 3 };
    let opacity = 255.0 * strength * 0.8;
    let mut overlay = frame.blank_like();
    for y in (0..frame.height).step_by(spacing) {
        let a = if y % (spacing as u32 * 2) == 0 {
            opacity
        } else {
            opacity * 0.7
        };
        let px = Rgba8::new(0, 0, 0, a as u8).to_premul();
        for x in 0..frame.width {
            overlay.put_pixel(x, y, px);
        }
    }
    if strength > 0.5 {
        let px = Rgba8::new(0, 0, 0, (opacity * 0.4) as u8).to_premul();
        for x in (0..frame.width).step_by(3) {
            for y in 0..frame.height {
                overlay.put_pixel(x, y, px);
            }
        }
    }
    over_in_place(frame, &overlay, 1.0)
}

fn timecode(
    frame: &mut FrameRGBA,
    state: &VhsState,
    params: &TransformParams<'_>,
    index: u64,
) -> CaptionResult<()> {
    let fps = state.fps;
    let total = index as f64 / fps;
    let hours = (total / 3600.0) as u64;
    let minutes = ((total % 3600.0) / 60.0) as u64;
    let seconds = (total % 60.0) as u64;
    let frames = ((total * fps) % fps) as u64;
    let code = format!("{hours:02}:{minutes:02}:{seconds:02}:{frames:02}");

    let r = params.renderer;
    let size = (frame.height / 30).max(16) as f32;
    let margin = 15.0;
    let line_gap = 20.0;
    let pad = 8.0;
    let estimate = code.len() as f64 * f64::from(size as u32 / 2);
    let x = f64::from(frame.width) - estimate - margin;
    let y = margin;

    let code_w = f64::from(r.measure(&code, size));
    let date_w = f64::from(r.measure(TIMECODE_DATE, size));
    let line_h = f64::from(r.line_height(size));
    let x0 = (x - pad) as i64;
    let y0 = (y - pad) as i64;
    let x1 = (x + code_w.max(date_w) + pad) as i64;
    let y1 = (y + line_gap + line_h + pad) as i64;

    let mut overlay = frame.blank_like();
    fill_rect(&mut overlay, x0, y0, x1 + 1, y1 + 1, Rgba8::new(0, 0, 0, 220));
    let border = Rgba8::opaque(80, 80, 80);
    fill_rect(&mut overlay, x0, y0, x1 + 1, y0 + 1, border);
    fill_rect(&mut overlay, x0, y1, x1 + 1, y1 + 1, border);
    fill_rect(&mut overlay, x0, y0, x0 + 1, y1 + 1, border);
    fill_rect(&mut overlay, x1, y0, x1 + 1, y1 + 1, border);

    let style = TextStyle {
        size_px: size,
        fill: Rgba8::opaque(255, 255, 0),
        outline: Rgba8::TRANSPARENT,
        outline_width: 0,
    };
    let ascent = f64::from(r.ascent(size));
    r.draw(
        &mut overlay,
        &code,
        Point::new(x, y + ascent),
        TextAnchor::LeftBaseline,
        &style,
    );
    r.draw(
        &mut overlay,
        TIMECODE_DATE,
        Point::new(x, y + line_gap + ascent),
        TextAnchor::LeftBaseline,
        &style.with_fill(Rgba8::WHITE),
    );
    over_in_place(frame, &overlay, 1.0)
}

/// 90% saturation, then a slight warm channel gain.
fn grade(frame: &mut FrameRGBA) {
    const GAIN: [f64; 3] = [1.03, 1.01, 0.97];
    for px in frame.data.chunks_exact_mut(4) {
        let (r, g, b) = (f64::from(px[0]), f64::from(px[1]), f64::from(px[2]));
        let luma = 0.299 * r + 0.587 * g + 0.114 * b;
        // Premultiplied channels may not exceed alpha.
        let alpha = f64::from(px[3]);
        for (c, gain) in px[..3].iter_mut().zip(GAIN) {
            let desat = luma + 0.9 * (f64::from(*c) - luma);
            *c = (desat * gain).round().clamp(0.0, alpha) as u8;
        }
    }
}
