use std::f64::consts::{FRAC_1_SQRT_2, PI};

use crate::foundation::error::CaptionResult;
use crate::foundation::math::{Rng64, stable_hash64};
use crate::raster::color::Rgba8;
use crate::raster::draw::{draw_line, fill_ellipse};
use crate::raster::frame::FrameRGBA;

use super::{Effect, PrepareParams, TransformParams, prepared};

/// Twinkling stars, dots and crosses scattered around the caption.
#[derive(Debug, Default)]
pub struct Sparkle {
    state: Option<SparkleState>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape {
    Star,
    Dot,
    Plus,
}

#[derive(Clone, Debug, PartialEq)]
struct Particle {
    dx: f64,
    dy: f64,
    phase: f64,
    hz: f64,
    size: f64,
    shape: Shape,
}

#[derive(Clone, Debug, PartialEq)]
struct SparkleState {
    fps: f64,
    particles: Vec<Particle>,
}

/// Particles dimmer than this are not drawn.
const MIN_BRIGHTNESS: f64 = 0.3;

impl SparkleState {
    fn new(text: &str, fps: f64, strength: f64) -> Self {
        let seed = if text.is_empty() {
            12_345
        } else {
            stable_hash64(0x5BA2, text)
        };
        let mut rng = Rng64::new(seed);
        let count = (5.0 + strength * 20.0) as usize;
        let particles = (0..count)
            .map(|_| Particle {
                dx: f64::from(rng.range_i32(-100, 100)),
                dy: f64::from(rng.range_i32(-40, 40)),
                phase: rng.next_f64() * 2.0 * PI,
                hz: 0.5 + rng.next_f64() * 2.0,
                size: f64::from(rng.range_i32(2, 6)),
                shape: match rng.range_i32(0, 2) {
                    0 => Shape::Star,
                    1 => Shape::Dot,
                    _ => Shape::Plus,
                },
            })
            .collect();
        Self {
            fps: if fps > 0.0 { fps } else { 12.0 },
            particles,
        }
    }

    /// Twinkle level of `p` at `frame`, in `0..=1`.
    fn brightness(&self, p: &Particle, frame: u64) -> f64 {
        let t = frame as f64 / self.fps;
        ((p.phase + t * p.hz * 2.0 * PI).sin() + 1.0) / 2.0
    }
}

/// White fading to warm yellow as the particle dims.
fn particle_color(brightness: f64) -> Rgba8 {
    let dim = 1.0 - brightness;
    Rgba8::new(
        255,
        (255.0 - dim * 50.0) as u8,
        (255.0 - dim * 100.0) as u8,
        (brightness * 255.0) as u8,
    )
}

fn draw_particle(layer: &mut FrameRGBA, (x, y): (f64, f64), p: &Particle, brightness: f64) {
    let color = particle_color(brightness);
    let size = p.size * brightness;
    match p.shape {
        Shape::Star => {
            for (ux, uy) in [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)] {
                draw_line(layer, (x, y), (x + ux * size, y + uy * size), 1, color);
            }
            let d = FRAC_1_SQRT_2 * size * 0.7;
            for (sx, sy) in [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)] {
                draw_line(layer, (x, y), (x + sx * d, y + sy * d), 1, color);
            }
        }
        Shape::Dot => fill_ellipse(layer, x, y, size / 2.0, size / 2.0, color),
        Shape::Plus => {
            draw_line(layer, (x - size, y), (x + size, y), 2, color);
            draw_line(layer, (x, y - size), (x, y + size), 2, color);
        }
    }
}

impl Effect for Sparkle {
    fn slug(&self) -> &'static str {
        "sparkle"
    }

    fn display_name(&self) -> &'static str {
        "Sparkle"
    }

    fn default_intensity(&self) -> u8 {
        65
    }

    fn prepare(&mut self, params: &PrepareParams<'_>) -> CaptionResult<()> {
        self.state = Some(SparkleState::new(
            params.text,
            params.fps,
            f64::from(params.intensity) / 100.0,
        ));
        Ok(())
    }

    fn transform(
        &self,
        input: &FrameRGBA,
        params: &TransformParams<'_>,
    ) -> CaptionResult<FrameRGBA> {
        let state = prepared(&self.state, self.slug())?;
        if params.text.is_empty() || params.intensity == 0 {
            return Ok(input.clone());
        }
        let mut layer = input.blank_like();
        params.renderer.draw(
            &mut layer,
            params.text,
            params.anchor,
            params.text_anchor,
            params.style,
        );
        for p in &state.particles {
            let b = state.brightness(p, params.frame_index);
            if b < MIN_BRIGHTNESS {
                continue;
            }
            let at = (params.anchor.x + p.dx, params.anchor.y + p.dy);
            draw_particle(&mut layer, at, p, b);
        }
        Ok(layer)
    }
}
