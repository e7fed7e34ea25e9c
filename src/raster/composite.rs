use crate::foundation::error::{CaptionError, CaptionResult};
use crate::foundation::math::mul_div255_u8;
use crate::raster::frame::FrameRGBA;

/// One premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Source-over for a single premultiplied pixel, with `src` scaled by `opacity`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Composite `src` over `dst` in place; both must be premultiplied frames of the same size.
pub fn over_in_place(dst: &mut FrameRGBA, src: &FrameRGBA, opacity: f32) -> CaptionResult<()> {
    if dst.width != src.width || dst.height != src.height {
        return Err(CaptionError::validation(format!(
            "over_in_place expects equal-size frames, got {}x{} and {}x{}",
            dst.width, dst.height, src.width, src.height
        )));
    }
    for (d, s) in dst.data.chunks_exact_mut(4).zip(src.data.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Composite `src` over `dst` with `src`'s origin at `(dx, dy)`. Pixels falling outside `dst`
/// are dropped.
pub fn over_at(dst: &mut FrameRGBA, src: &FrameRGBA, dx: i32, dy: i32, opacity: f32) {
    let (dw, dh) = (dst.width as i64, dst.height as i64);
    let (sw, sh) = (src.width as i64, src.height as i64);
    let (dx, dy) = (i64::from(dx), i64::from(dy));

    let x0 = dx.max(0);
    let y0 = dy.max(0);
    let x1 = (dx + sw).min(dw);
    let y1 = (dy + sh).min(dh);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    for y in y0..y1 {
        let sy = y - dy;
        for x in x0..x1 {
            let sx = x - dx;
            let si = ((sy * sw + sx) as usize) * 4;
            let s = [
                src.data[si],
                src.data[si + 1],
                src.data[si + 2],
                src.data[si + 3],
            ];
            if s[3] == 0 {
                continue;
            }
            let di = ((y * dw + x) as usize) * 4;
            let d = [
                dst.data[di],
                dst.data[di + 1],
                dst.data[di + 2],
                dst.data[di + 3],
            ];
            dst.data[di..di + 4].copy_from_slice(&over(d, s, opacity));
        }
    }
}

/// Saturating per-channel add of `src` into `dst` (premultiplied, same size).
pub fn add_in_place(dst: &mut FrameRGBA, src: &FrameRGBA) -> CaptionResult<()> {
    if dst.width != src.width || dst.height != src.height {
        return Err(CaptionError::validation(
            "add_in_place expects equal-size frames",
        ));
    }
    for (d, s) in dst.data.iter_mut().zip(src.data.iter()) {
        *d = d.saturating_add(*s);
    }
    Ok(())
}
