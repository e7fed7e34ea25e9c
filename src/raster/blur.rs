use crate::foundation::error::{CaptionError, CaptionResult};
use crate::raster::frame::FrameRGBA;

/// Separable Gaussian blur over a premultiplied RGBA8 buffer using a Q16 fixed-point kernel.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> CaptionResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| CaptionError::validation("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(CaptionError::validation(
            "blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    if radius == 0 || width == 0 || height == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

/// Gaussian blur with standard deviation `sigma` px; the kernel reaches `ceil(3 * sigma)`.
///
/// Only the content bounds grown by the kernel radius are processed; everything outside stays
/// transparent.
pub fn gaussian_blur(frame: &FrameRGBA, sigma: f32) -> CaptionResult<FrameRGBA> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Ok(frame.clone());
    }
    let Some(bounds) = frame.content_bounds() else {
        return Ok(frame.clone());
    };
    let radius = (sigma * 3.0).ceil().max(1.0) as u32;
    let r = f64::from(radius);
    let x0 = (bounds.x0 - r).max(0.0) as u32;
    let y0 = (bounds.y0 - r).max(0.0) as u32;
    let x1 = ((bounds.x1 + r) as u32).min(frame.width);
    let y1 = ((bounds.y1 + r) as u32).min(frame.height);
    let (cw, ch) = (x1 - x0, y1 - y0);

    let row_bytes = (cw as usize) * 4;
    let mut crop = Vec::with_capacity(row_bytes * ch as usize);
    for y in y0..y1 {
        let start = ((y as usize) * (frame.width as usize) + x0 as usize) * 4;
        crop.extend_from_slice(&frame.data[start..start + row_bytes]);
    }
    let blurred = blur_rgba8_premul(&crop, cw, ch, radius, sigma)?;

    let mut out = frame.blank_like();
    out.premultiplied = frame.premultiplied;
    for (row, y) in (y0..y1).enumerate() {
        let start = ((y as usize) * (frame.width as usize) + x0 as usize) * 4;
        out.data[start..start + row_bytes]
            .copy_from_slice(&blurred[row * row_bytes..(row + 1) * row_bytes]);
    }
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> CaptionResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(CaptionError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(CaptionError::validation("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}
