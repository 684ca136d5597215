//! Pixel output surface

use super::math::Vec4;

/// Anything the rasterizer can write shaded pixels into.
///
/// The renderer only calls `set` with coordinates inside
/// `width() x height()` and never reads pixels back.
pub trait Canvas {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// Store one pixel, converting the [0, 1] float color to the native format
    fn set(&mut self, x: usize, y: usize, color: Vec4);
}

/// Float channel to byte, clamped and rounded
#[inline]
pub fn to_byte(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// RGBA8 framebuffer for software rendering
pub struct Framebuffer {
    pub pixels: Vec<u8>, // RGBA, 4 bytes per pixel
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height * 4],
            width,
            height,
        }
    }

    /// Reallocate for a new size; contents are cleared to transparent black
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width * height * 4];
    }

    pub fn clear(&mut self, color: Vec4) {
        let bytes = Self::pack(color);
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
    }

    /// Clear only the pixels an interlaced frame of `parity` will redraw
    pub fn clear_checkerboard(&mut self, parity: u32, color: Vec4) {
        let bytes = Self::pack(color);
        for y in 0..self.height {
            let start = ((y as u32 ^ parity) & 1) as usize;
            for x in (start..self.width).step_by(2) {
                let idx = (y * self.width + x) * 4;
                self.pixels[idx..idx + 4].copy_from_slice(&bytes);
            }
        }
    }

    /// Read back one pixel as RGBA bytes
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let idx = (y * self.width + x) * 4;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Opaque RGBA bytes; the framebuffer has no alpha channel of its own
    fn pack(color: Vec4) -> [u8; 4] {
        [to_byte(color.x), to_byte(color.y), to_byte(color.z), 255]
    }
}

impl Canvas for Framebuffer {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn set(&mut self, x: usize, y: usize, color: Vec4) {
        debug_assert!(x < self.width && y < self.height);
        let idx = (y * self.width + x) * 4;
        self.pixels[idx..idx + 4].copy_from_slice(&Self::pack(color));
    }
}
