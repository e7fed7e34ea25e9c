use image::imageops::{self, FilterType};

use crate::foundation::core::{Canvas, Rect};
use crate::foundation::error::{CaptionError, CaptionResult};
use crate::raster::color::Rgba8;

/// A `width x height` RGBA8 raster.
///
/// Every layer the compositors and effects pass around is premultiplied. Straight-alpha data only
/// appears at the edges: decoded video in [`FrameRGBA::from_straight_rgba`] and encoders reading
/// [`FrameRGBA::to_straight_rgba`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 bytes, `width * height * 4` long.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied by alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// A fully transparent premultiplied frame.
    pub fn new_transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
            premultiplied: true,
        }
    }

    /// A frame filled with `color`.
    pub fn solid(width: u32, height: u32, color: Rgba8) -> Self {
        let px = color.to_premul();
        Self {
            width,
            height,
            data: px.repeat((width as usize) * (height as usize)),
            premultiplied: true,
        }
    }

    /// Wrap straight-alpha RGBA bytes, premultiplying them.
    pub fn from_straight_rgba(width: u32, height: u32, mut data: Vec<u8>) -> CaptionResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(CaptionError::validation(format!(
                "rgba buffer is {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        for px in data.chunks_exact_mut(4) {
            let c = Rgba8::new(px[0], px[1], px[2], px[3]).to_premul();
            px.copy_from_slice(&c);
        }
        Ok(Self {
            width,
            height,
            data,
            premultiplied: true,
        })
    }

    /// Canvas dimensions.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// A transparent frame of the same size.
    pub fn blank_like(&self) -> Self {
        Self::new_transparent(self.width, self.height)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// Pixel at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Overwrite the pixel at `(x, y)`; ignored when out of bounds.
    pub fn put_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            self.data[i..i + 4].copy_from_slice(&px);
        }
    }

    /// True when every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Bounding box of non-transparent pixels as `[x0, y0, x1, y1)`, or `None` when blank.
    pub fn content_bounds(&self) -> Option<Rect> {
        let (mut x0, mut y0) = (u32::MAX, u32::MAX);
        let (mut x1, mut y1) = (0u32, 0u32);
        let mut any = false;
        for y in 0..self.height {
            let row = self.index(0, y);
            for x in 0..self.width {
                if self.data[row + (x as usize) * 4 + 3] != 0 {
                    any = true;
                    x0 = x0.min(x);
                    y0 = y0.min(y);
                    x1 = x1.max(x + 1);
                    y1 = y1.max(y + 1);
                }
            }
        }
        any.then(|| Rect::new(x0.into(), y0.into(), x1.into(), y1.into()))
    }

    /// Multiply every channel by `factor` (premultiplied opacity scaling).
    pub fn scale_opacity(&mut self, factor: f32) {
        let f = factor.clamp(0.0, 1.0);
        if f >= 1.0 {
            return;
        }
        for v in &mut self.data {
            *v = (f32::from(*v) * f).round() as u8;
        }
    }

    /// Content moved by `(dx, dy)`; pixels shifted off the canvas are dropped.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        let mut out = self.blank_like();
        crate::raster::composite::over_at(&mut out, self, dx, dy, 1.0);
        out
    }

    /// Straight-alpha copy of the pixel data.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u32::from(px[3]);
            if a == 0 {
                px[..3].fill(0);
            } else if a < 255 {
                for c in &mut px[..3] {
                    *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
                }
            }
        }
        out
    }

    /// Straight-alpha [`image::RgbaImage`] copy.
    pub fn to_rgba_image(&self) -> CaptionResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.to_straight_rgba())
            .ok_or_else(|| CaptionError::validation("frame buffer does not match its dimensions"))
    }

    /// Lanczos3 resize to `target`.
    pub fn resized(&self, target: Canvas) -> CaptionResult<Self> {
        if target.width == self.width && target.height == self.height {
            return Ok(self.clone());
        }
        if target.width == 0 || target.height == 0 {
            return Err(CaptionError::validation("resize target must be non-empty"));
        }
        let img = image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| CaptionError::validation("frame buffer does not match its dimensions"))?;
        let out = imageops::resize(&img, target.width, target.height, FilterType::Lanczos3);
        Ok(Self {
            width: target.width,
            height: target.height,
            data: out.into_raw(),
            premultiplied: self.premultiplied,
        })
    }

    /// Composite this frame over an opaque `background`, producing an opaque frame.
    pub fn flattened_over(&self, background: Rgba8) -> Self {
        let bg = background.with_alpha(255).to_premul();
        let mut out = self.clone();
        for px in out.data.chunks_exact_mut(4) {
            let o = crate::raster::composite::over(bg, [px[0], px[1], px[2], px[3]], 1.0);
            px.copy_from_slice(&o);
        }
        out
    }
}
