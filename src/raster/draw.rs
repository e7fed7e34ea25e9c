//! Simple shape rasterization into premultiplied frames.

use crate::raster::color::Rgba8;
use crate::raster::composite::over;
use crate::raster::frame::FrameRGBA;

/// Blend `color` scaled by `coverage` (0..=255) over the pixel at `(x, y)`.
pub fn blend_pixel(frame: &mut FrameRGBA, x: i64, y: i64, color: Rgba8, coverage: u8) {
    if x < 0 || y < 0 || x >= i64::from(frame.width) || y >= i64::from(frame.height) {
        return;
    }
    if coverage == 0 || color.a == 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    let src = color.to_premul();
    let dst = frame.pixel(x, y);
    frame.put_pixel(x, y, over(dst, src, f32::from(coverage) / 255.0));
}

/// Fill `[x0, x1) x [y0, y1)` with `color`, clipped to the frame.
pub fn fill_rect(frame: &mut FrameRGBA, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgba8) {
    let x0 = x0.max(0);
    let y0 = y0.max(0);
    let x1 = x1.min(i64::from(frame.width));
    let y1 = y1.min(i64::from(frame.height));
    for y in y0..y1 {
        for x in x0..x1 {
            blend_pixel(frame, x, y, color, 255);
        }
    }
}

/// Outline of the axis-aligned ellipse centered on `(cx, cy)` with `stroke` px thickness.
pub fn stroke_ellipse(
    frame: &mut FrameRGBA,
    cx: f64,
    cy: f64,
    rx: f64,
    ry: f64,
    stroke: f64,
    color: Rgba8,
) {
    if rx <= 0.0 || ry <= 0.0 {
        return;
    }
    let half = (stroke / 2.0).max(0.5);
    let x0 = (cx - rx - half).floor() as i64;
    let x1 = (cx + rx + half).ceil() as i64;
    let y0 = (cy - ry - half).floor() as i64;
    let y1 = (cy + ry + half).ceil() as i64;
    let r_mean = (rx + ry) / 2.0;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let nx = (x as f64 + 0.5 - cx) / rx;
            let ny = (y as f64 + 0.5 - cy) / ry;
            // Radial distance from the ellipse in pixels, approximated with the mean radius.
            let d = ((nx * nx + ny * ny).sqrt() - 1.0).abs() * r_mean;
            if d <= half {
                blend_pixel(frame, x, y, color, 255);
            }
        }
    }
}

/// Filled axis-aligned ellipse.
pub fn fill_ellipse(frame: &mut FrameRGBA, cx: f64, cy: f64, rx: f64, ry: f64, color: Rgba8) {
    if rx <= 0.0 || ry <= 0.0 {
        return;
    }
    let x0 = (cx - rx).floor() as i64;
    let x1 = (cx + rx).ceil() as i64;
    let y0 = (cy - ry).floor() as i64;
    let y1 = (cy + ry).ceil() as i64;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let nx = (x as f64 + 0.5 - cx) / rx;
            let ny = (y as f64 + 0.5 - cy) / ry;
            if nx * nx + ny * ny <= 1.0 {
                blend_pixel(frame, x, y, color, 255);
            }
        }
    }
}

/// Straight segment from `(x0, y0)` to `(x1, y1)`, `width` px thick.
pub fn draw_line(
    frame: &mut FrameRGBA,
    (x0, y0): (f64, f64),
    (x1, y1): (f64, f64),
    width: u32,
    color: Rgba8,
) {
    let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as u32;
    let w = i64::from(width.max(1));
    let lo = -(w / 2);
    let mut last = None;
    for i in 0..=steps {
        let t = f64::from(i) / f64::from(steps);
        let x = (x0 + (x1 - x0) * t).round() as i64;
        let y = (y0 + (y1 - y0) * t).round() as i64;
        if last == Some((x, y)) {
            continue;
        }
        last = Some((x, y));
        fill_rect(frame, x + lo, y + lo, x + lo + w, y + lo + w, color);
    }
}
