//! Rendering: turns a container's element tree into a pixel canvas.

pub mod layout;
pub mod paint;
pub mod prepare;
pub mod raster;

use sha2::{Digest, Sha256};

use crate::dom::Rgba;
use crate::{Error, Result};
use layout::Rect;

/// An RGBA8 pixel canvas, the output of rasterization.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Canvas {
    /// Allocate a `width x height` canvas filled with `fill`.
    ///
    /// Fails when the pixel buffer length does not fit in memory addressing.
    pub fn new(width: u32, height: u32, fill: Rgba) -> Result<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|count| count.checked_mul(4))
            .ok_or_else(|| Error::Raster(format!("{}x{} canvas is too large", width, height)))?;
        let pixels = fill.to_array().iter().copied().cycle().take(len).collect();
        Ok(Self { width, height, pixels })
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let p = &self.pixels[i..i + 4];
        Some(Rgba(p[0], p[1], p[2], p[3]))
    }

    /// Fill `rect` (clipped to the canvas) with `color`, source-over.
    pub fn fill_rect(&mut self, rect: &Rect, color: Rgba) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else { return };
        for y in y0..y1 {
            for x in x0..x1 {
                let i = (y as usize * self.width as usize + x as usize) * 4;
                blend(&mut self.pixels[i..i + 4], color);
            }
        }
    }

    /// Whether every pixel inside `rect` equals `background`.
    pub fn is_region_blank(&self, rect: &Rect, background: Rgba) -> bool {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else { return true };
        (y0..y1).all(|y| (x0..x1).all(|x| self.pixel(x, y) == Some(background)))
    }

    /// Hex sha256 over the dimensions and pixel data.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        hasher.update(&self.pixels);
        hex::encode(hasher.finalize())
    }

    fn clip(&self, rect: &Rect) -> Option<(u32, u32, u32, u32)> {
        let x0 = rect.x.max(0) as i64;
        let y0 = rect.y.max(0) as i64;
        let x1 = (rect.x as i64 + rect.width as i64).min(self.width as i64);
        let y1 = (rect.y as i64 + rect.height as i64).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

fn blend(dst: &mut [u8], src: Rgba) {
    match src.3 {
        0 => {}
        255 => dst.copy_from_slice(&src.to_array()),
        a => {
            let a = a as u32;
            let inv = 255 - a;
            for (d, s) in dst.iter_mut().zip([src.0, src.1, src.2]) {
                *d = ((s as u32 * a + *d as u32 * inv) / 255) as u8;
            }
            dst[3] = (a + dst[3] as u32 * inv / 255).min(255) as u8;
        }
    }
}
