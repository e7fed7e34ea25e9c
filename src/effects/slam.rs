use std::f64::consts::PI;

use crate::foundation::core::Point;
use crate::foundation::error::CaptionResult;
use crate::foundation::math::{Rng64, stable_hash64};
use crate::raster::color::Rgba8;
use crate::raster::draw::{fill_ellipse, stroke_ellipse};
use crate::raster::frame::FrameRGBA;

use super::{Effect, PrepareParams, TransformParams, prepared};

/// Text drops from above, squashes on impact and throws out shockwave rings and debris.
#[derive(Debug, Default)]
pub struct Slam {
    state: Option<SlamState>,
}

const RING_COLOR: (u8, u8, u8) = (255, 200, 100);
const IMPACT_OUTLINE: Rgba8 = Rgba8::opaque(0x8B, 0, 0);
const BOUNCE_DAMPENING: f64 = 0.7;
/// Fraction of the slam spent falling.
const DROP_PHASE: f64 = 0.6;

#[derive(Clone, Debug, PartialEq)]
struct SlamState {
    slam_frames: u64,
    drop_height: f64,
    max_shockwave_radius: f64,
    seed: u64,
}

/// Pose of the text on one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SlamPose {
    y_offset: f64,
    shockwave_radius: f64,
    scale: f64,
}

impl SlamState {
    fn pose(&self, frame: u64) -> SlamPose {
        let rest = SlamPose {
            y_offset: 0.0,
            shockwave_radius: 0.0,
            scale: 1.0,
        };
        if frame >= self.slam_frames {
            return rest;
        }
        let progress = frame as f64 / self.slam_frames as f64;
        if progress < DROP_PHASE {
            let fall = progress / DROP_PHASE;
            return SlamPose {
                y_offset: -self.drop_height * (1.0 - fall * fall),
                ..rest
            };
        }
        let impact = (progress - DROP_PHASE) / (1.0 - DROP_PHASE);
        let bounce = (impact * 2.0 * PI).sin() * self.drop_height * 0.3 * (1.0 - impact);
        let scale = if impact < 0.3 {
            1.0 - (impact / 0.3) * 0.2
        } else {
            0.8 + ((impact - 0.3) / 0.7) * 0.2
        };
        SlamPose {
            y_offset: -bounce * BOUNCE_DAMPENING,
            shockwave_radius: impact * self.max_shockwave_radius,
            scale,
        }
    }
}

impl Effect for Slam {
    fn slug(&self) -> &'static str {
        "slam"
    }

    fn display_name(&self) -> &'static str {
        "Slam"
    }

    fn default_intensity(&self) -> u8 {
        75
    }

    fn prepare(&mut self, params: &PrepareParams<'_>) -> CaptionResult<()> {
        let s = f64::from(params.intensity) / 100.0;
        let fps = params.fps.max(1.0);
        let total = (params.duration_sec * fps).ceil().max(1.0);
        self.state = Some(SlamState {
            slam_frames: ((total * (0.2 + 0.3 * s)) as u64).max(3),
            drop_height: 50.0 + s * 100.0,
            max_shockwave_radius: 80.0 + s * 120.0,
            seed: stable_hash64(0x51A3, params.text),
        });
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

        let pose = state.pose(params.frame_index);
        let mut layer = input.blank_like();
        let (ax, ay) = (params.anchor.x, params.anchor.y);
        let fade = 1.0 - pose.shockwave_radius / state.max_shockwave_radius;

        if pose.shockwave_radius > 10.0 {
            for ring in 0..3u32 {
                let radius = pose.shockwave_radius - f64::from(ring) * 25.0;
                if radius <= 0.0 {
                    continue;
                }
                let alpha = (150.0 * fade * (1.0 - f64::from(ring) * 0.3)) as i64;
                if alpha <= 0 {
                    continue;
                }
                let color = Rgba8::new(RING_COLOR.0, RING_COLOR.1, RING_COLOR.2, alpha as u8);
                for t in 0..(2 + ring) {
                    let r = radius + f64::from(t);
                    stroke_ellipse(&mut layer, ax, ay + pose.y_offset, r, r, 1.0, color);
                }
            }
        }

        let text_y = ay + pose.y_offset;
        let mut style = *params.style;
        if pose.scale != 1.0 {
            style.size_px = (params.style.size_px * pose.scale as f32).floor().max(8.0);
        }
        if pose.shockwave_radius > 0.0 {
            let f = pose.shockwave_radius / state.max_shockwave_radius;
            let c = params.style.fill;
            style.fill = Rgba8::new(
                (f64::from(c.r) + f * (255.0 - f64::from(c.r))).min(255.0) as u8,
                (f64::from(c.g) * (1.0 - f * 0.3)) as u8,
                (f64::from(c.b) * (1.0 - f * 0.5)) as u8,
                c.a,
            );
            style.outline = IMPACT_OUTLINE;
            style.outline_width = params.style.outline_width + 2;
        }
        params.renderer.draw(
            &mut layer,
            params.text,
            Point::new(ax, text_y),
            params.text_anchor,
            &style,
        );

        if pose.shockwave_radius > 30.0 {
            draw_debris(&mut layer, state, params, pose, text_y, fade);
        }
        Ok(layer)
    }
}

fn draw_debris(
    layer: &mut FrameRGBA,
    state: &SlamState,
    params: &TransformParams<'_>,
    pose: SlamPose,
    text_y: f64,
    fade: f64,
) {
    let mut rng = Rng64::for_frame(state.seed, params.frame_index / 2);
    let count = (10.0 + params.strength() * 20.0) as u32;
    for _ in 0..count {
        let angle = rng.next_f64() * 2.0 * PI;
        let distance = rng.next_f64() * pose.shockwave_radius * 0.8;
        let x = params.anchor.x + angle.cos() * distance;
        let y = text_y + angle.sin() * distance * 0.5;
        let size = f64::from(rng.range_i32(1, 3));
        let alpha = (f64::from(rng.range_i32(100, 200)) * fade) as i64;
        let gray = rng.range_i32(80, 150) as u8;
        if alpha > 0 {
            let color = Rgba8::new(gray, gray - 20, gray - 40, alpha as u8);
            fill_ellipse(layer, x, y, size, size, color);
        }
    }
}
