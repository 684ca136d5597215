//! Float RGBA textures with wrapping, filtering and mip-mapping
//!
//! All mip levels live in one contiguous pixel buffer. Level 0 is the
//! decoded image; every following level halves each axis (never below 1)
//! with a 2x2 box filter.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::math::Vec4;

/// Texel reconstruction filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Filter {
    /// Covering texel, no blending
    Nearest,
    /// Bilinear blend of the 2x2 neighborhood
    Linear,
    /// Bilinear with `3t² - 2t³` smoothed weights
    CubicHermite,
}

impl Filter {
    pub fn next(self) -> Filter {
        match self {
            Filter::Nearest => Filter::Linear,
            Filter::Linear => Filter::CubicHermite,
            Filter::CubicHermite => Filter::Nearest,
        }
    }
}

/// Out-of-range coordinate handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wrap {
    Repeat,
    Clamp,
}

/// Filter and wrap mode used for a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sampling {
    pub filter: Filter,
    pub wrap: Wrap,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            filter: Filter::Linear,
            wrap: Wrap::Repeat,
        }
    }
}

/// Error type for texture creation
#[derive(Debug)]
pub enum TextureError {
    IoError(std::io::Error),
    DecodeError(image::ImageError),
    InvalidDimensions { width: usize, height: usize },
    SizeMismatch { expected: usize, actual: usize },
}

impl From<std::io::Error> for TextureError {
    fn from(e: std::io::Error) -> Self {
        TextureError::IoError(e)
    }
}

impl From<image::ImageError> for TextureError {
    fn from(e: image::ImageError) -> Self {
        TextureError::DecodeError(e)
    }
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::IoError(e) => write!(f, "IO error: {}", e),
            TextureError::DecodeError(e) => write!(f, "Decode error: {}", e),
            TextureError::InvalidDimensions { width, height } => {
                write!(f, "Invalid texture dimensions {}x{}", width, height)
            }
            TextureError::SizeMismatch { expected, actual } => {
                write!(f, "Expected {} pixels, got {}", expected, actual)
            }
        }
    }
}

impl std::error::Error for TextureError {}

/// Largest accepted width or height; keeps texel math in i32
const MAX_DIMENSION: usize = 1 << 16;

#[derive(Debug, Clone, Copy)]
struct MipLevel {
    offset: usize,
    width: i32,
    height: i32,
}

impl MipLevel {
    fn new(offset: usize, width: usize, height: usize) -> Self {
        Self {
            offset,
            width: width as i32,
            height: height as i32,
        }
    }
}

/// Decoded RGBA image in [0, 1] floats, with its full mip chain
#[derive(Debug)]
pub struct Texture {
    pixels: Vec<Vec4>,
    levels: Vec<MipLevel>,
    mips_x: u32,
    mips_y: u32,
    pub name: String,
}

impl Texture {
    /// Build a texture from row-major pixels, generating all mip levels
    pub fn from_rgba(width: usize, height: usize, pixels: Vec<Vec4>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(TextureError::InvalidDimensions { width, height });
        }
        if pixels.len() != width * height {
            return Err(TextureError::SizeMismatch {
                expected: width * height,
                actual: pixels.len(),
            });
        }

        let mips_x = (width as u32).ilog2();
        let mips_y = (height as u32).ilog2();
        let level_count = mips_x.max(mips_y) as usize + 1;

        let mut all = pixels;
        let mut levels = Vec::with_capacity(level_count);
        levels.push(MipLevel::new(0, width, height));

        for _ in 1..level_count {
            let prev = levels[levels.len() - 1];
            let w = (prev.width as usize / 2).max(1);
            let h = (prev.height as usize / 2).max(1);
            let offset = all.len();
            all.reserve(w * h);

            for y in 0..h {
                let y0 = (2 * y).min(prev.height as usize - 1);
                let y1 = (2 * y + 1).min(prev.height as usize - 1);
                for x in 0..w {
                    let x0 = (2 * x).min(prev.width as usize - 1);
                    let x1 = (2 * x + 1).min(prev.width as usize - 1);
                    let row0 = prev.offset + y0 * prev.width as usize;
                    let row1 = prev.offset + y1 * prev.width as usize;
                    let sum = all[row0 + x0] + all[row0 + x1] + all[row1 + x0] + all[row1 + x1];
                    all.push(sum * 0.25);
                }
            }

            levels.push(MipLevel::new(offset, w, h));
        }

        Ok(Self {
            pixels: all,
            levels,
            mips_x,
            mips_y,
            name: String::new(),
        })
    }

    /// Load texture from an image file (PNG, JPEG, BMP)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mut texture = Self::from_bytes(&bytes)?;
        texture.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        log::info!(
            "Loaded texture: {} ({}x{}, {} mip levels)",
            texture.name,
            texture.width(),
            texture.height(),
            texture.mip_levels()
        );
        Ok(texture)
    }

    /// Decode texture from encoded image bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes)?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let pixels: Vec<Vec4> = rgba
            .pixels()
            .map(|p| {
                Vec4::new(
                    p[0] as f32 / 255.0,
                    p[1] as f32 / 255.0,
                    p[2] as f32 / 255.0,
                    p[3] as f32 / 255.0,
                )
            })
            .collect();

        Self::from_rgba(width as usize, height as usize, pixels)
    }

    /// Create a checkerboard test texture with `cell`-sized squares
    pub fn checkerboard(width: usize, height: usize, cell: usize, color1: Vec4, color2: Vec4) -> Result<Self, TextureError> {
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / cell) + (y / cell)) % 2 == 0;
                pixels.push(if checker { color1 } else { color2 });
            }
        }
        let mut texture = Self::from_rgba(width, height, pixels)?;
        texture.name = "checkerboard".to_string();
        Ok(texture)
    }

    pub fn width(&self) -> usize {
        self.levels[0].width as usize
    }

    pub fn height(&self) -> usize {
        self.levels[0].height as usize
    }

    /// floor(log2) of each axis
    pub fn mip_counts(&self) -> (u32, u32) {
        (self.mips_x, self.mips_y)
    }

    /// Number of stored levels, including level 0
    pub fn mip_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn level_size(&self, level: usize) -> (usize, usize) {
        let l = &self.levels[level.min(self.levels.len() - 1)];
        (l.width as usize, l.height as usize)
    }

    /// Texel fetch on level 0
    pub fn sample(&self, x: i32, y: i32, wrap: Wrap) -> Vec4 {
        self.texel(&self.levels[0], x, y, wrap)
    }

    #[inline]
    fn texel(&self, level: &MipLevel, x: i32, y: i32, wrap: Wrap) -> Vec4 {
        let (x, y) = match wrap {
            Wrap::Repeat => (x.rem_euclid(level.width), y.rem_euclid(level.height)),
            Wrap::Clamp => (x.clamp(0, level.width - 1), y.clamp(0, level.height - 1)),
        };
        self.pixels[level.offset + (y * level.width + x) as usize]
    }

    /// Filtered lookup at normalized (u, v) on a single mip level
    pub fn sample_uv(&self, u: f32, v: f32, mip_level: usize, sampling: Sampling) -> Vec4 {
        let level = &self.levels[mip_level.min(self.levels.len() - 1)];

        let (u, v) = match sampling.wrap {
            Wrap::Repeat => (u - u.floor(), v - v.floor()),
            // Past the edge every filter lands on the border texels anyway
            Wrap::Clamp => (u.clamp(0.0, 1.0), v.clamp(0.0, 1.0)),
        };
        let fx = u * level.width as f32;
        let fy = v * level.height as f32;

        match sampling.filter {
            Filter::Nearest => self.texel(level, fx.floor() as i32, fy.floor() as i32, sampling.wrap),
            Filter::Linear | Filter::CubicHermite => {
                // Texel centers sit at half-integer coordinates
                let fx = fx - 0.5;
                let fy = fy - 0.5;
                let x0 = fx.floor();
                let y0 = fy.floor();
                let mut tx = fx - x0;
                let mut ty = fy - y0;

                if sampling.filter == Filter::CubicHermite {
                    tx = tx * tx * (3.0 - 2.0 * tx);
                    ty = ty * ty * (3.0 - 2.0 * ty);
                }

                let (x0, y0) = (x0 as i32, y0 as i32);
                let a = self.texel(level, x0, y0, sampling.wrap);
                let b = self.texel(level, x0 + 1, y0, sampling.wrap);
                let c = self.texel(level, x0, y0 + 1, sampling.wrap);
                let d = self.texel(level, x0 + 1, y0 + 1, sampling.wrap);

                a.mix(b, tx).mix(c.mix(d, tx), ty)
            }
        }
    }

    /// Lookup with a fractional mip level, blending the two nearest levels
    pub fn sample_mip(&self, u: f32, v: f32, lod: f32, sampling: Sampling) -> Vec4 {
        let max_level = (self.levels.len() - 1) as f32;
        let lod = if lod.is_nan() { 0.0 } else { lod.clamp(0.0, max_level) };
        let base = lod.floor();
        let t = lod - base;
        let n = base as usize;

        let near = self.sample_uv(u, v, n, sampling);
        if t == 0.0 || n + 1 >= self.levels.len() {
            return near;
        }
        near.mix(self.sample_uv(u, v, n + 1, sampling), t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(v: f32) -> Vec4 {
        Vec4::new(v, v, v, 1.0)
    }

    /// Texel (x, y) has red = x and green = y
    fn coord_texture(w: usize, h: usize) -> Texture {
        let mut pixels = Vec::new();
        for y in 0..h {
            for x in 0..w {
                pixels.push(Vec4::new(x as f32, y as f32, 0.0, 1.0));
            }
        }
        Texture::from_rgba(w, h, pixels).unwrap()
    }

    #[test]
    fn test_repeat_wraps_negative_coordinates() {
        let tex = coord_texture(4, 3);
        assert_eq!(tex.sample(-1, 0, Wrap::Repeat), tex.sample(3, 0, Wrap::Repeat));
        assert_eq!(tex.sample(5, -4, Wrap::Repeat), Vec4::new(1.0, 2.0, 0.0, 1.0));
    }

    #[test]
    fn test_clamp_pins_to_edges() {
        let tex = coord_texture(4, 3);
        assert_eq!(tex.sample(-5, 1, Wrap::Clamp), Vec4::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(tex.sample(100, 100, Wrap::Clamp), Vec4::new(3.0, 2.0, 0.0, 1.0));
    }

    #[test]
    fn test_repeat_handles_far_negative_coordinates() {
        let tex = coord_texture(4, 3);
        // -70001 = 4 * -17501 + 3
        assert_eq!(tex.sample(-70001, 0, Wrap::Repeat), Vec4::new(3.0, 0.0, 0.0, 1.0));
        assert_eq!(tex.sample(i32::MIN, i32::MIN, Wrap::Repeat), Vec4::new(0.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn test_clamp_accepts_huge_uv() {
        let tex = coord_texture(4, 4);
        for filter in [Filter::Nearest, Filter::Linear, Filter::CubicHermite] {
            let s = Sampling { filter, wrap: Wrap::Clamp };
            assert_eq!(tex.sample_uv(1.0e12, 0.5 / 4.0, 0, s), Vec4::new(3.0, 0.0, 0.0, 1.0));
            assert_eq!(tex.sample_uv(-1.0e12, 1.0e12, 0, s), Vec4::new(0.0, 3.0, 0.0, 1.0));
        }
    }

    #[test]
    fn test_mip_counts_per_axis() {
        let tex = Texture::from_rgba(256, 64, vec![gray(0.5); 256 * 64]).unwrap();
        assert_eq!(tex.mip_counts(), (8, 6));
        assert_eq!(tex.mip_levels(), 9);
        assert_eq!(tex.level_size(6), (4, 1));
        assert_eq!(tex.level_size(8), (1, 1));
    }

    #[test]
    fn test_mip_levels_are_box_filtered() {
        let tex = Texture::from_rgba(2, 2, vec![gray(0.0), gray(1.0), gray(1.0), gray(0.0)]).unwrap();
        let s = Sampling { filter: Filter::Nearest, wrap: Wrap::Repeat };
        assert_eq!(tex.sample_uv(0.3, 0.7, 1, s), gray(0.5));
    }

    #[test]
    fn test_rejects_bad_buffers() {
        assert!(matches!(
            Texture::from_rgba(0, 4, Vec::new()),
            Err(TextureError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Texture::from_rgba(2, 2, vec![gray(0.0); 3]),
            Err(TextureError::SizeMismatch { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_nearest_picks_covering_texel() {
        let tex = coord_texture(4, 4);
        let s = Sampling { filter: Filter::Nearest, wrap: Wrap::Repeat };
        assert_eq!(tex.sample_uv(0.55, 0.01, 0, s), Vec4::new(2.0, 0.0, 0.0, 1.0));
        // Repeat brings 1.30 back to 0.30
        assert_eq!(tex.sample_uv(1.30, 0.8, 0, s), Vec4::new(1.0, 3.0, 0.0, 1.0));
    }

    #[test]
    fn test_linear_at_texel_center_is_exact() {
        let tex = coord_texture(4, 4);
        let s = Sampling { filter: Filter::Linear, wrap: Wrap::Clamp };
        assert_eq!(tex.sample_uv(2.5 / 4.0, 1.5 / 4.0, 0, s), Vec4::new(2.0, 1.0, 0.0, 1.0));
        let mid = tex.sample_uv(2.0 / 4.0, 1.5 / 4.0, 0, s);
        assert!((mid.x - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_cubic_hermite_uses_each_axis_fraction() {
        let tex = coord_texture(4, 4);
        let s = Sampling { filter: Filter::CubicHermite, wrap: Wrap::Repeat };
        // fx = 1.5 (tx = 0.5), fy = 1.25 (ty = 0.25)
        let c = tex.sample_uv(0.5, 0.4375, 0, s);
        assert!((c.x - 1.5).abs() < 1e-6);
        // 0.25² * (3 - 2 * 0.25) = 0.15625
        assert!((c.y - 1.15625).abs() < 1e-6, "got {}", c.y);
    }

    #[test]
    fn test_integer_lod_has_no_next_level_contribution() {
        let tex = coord_texture(8, 8);
        let s = Sampling { filter: Filter::Linear, wrap: Wrap::Repeat };
        for level in 0..tex.mip_levels() {
            assert_eq!(tex.sample_mip(0.3, 0.6, level as f32, s), tex.sample_uv(0.3, 0.6, level, s));
        }
    }

    #[test]
    fn test_fractional_lod_blends_levels() {
        let tex = Texture::from_rgba(2, 2, vec![gray(0.0), gray(1.0), gray(1.0), gray(1.0)]).unwrap();
        let s = Sampling { filter: Filter::Nearest, wrap: Wrap::Repeat };
        let l0 = tex.sample_uv(0.1, 0.1, 0, s).x;
        let l1 = tex.sample_uv(0.1, 0.1, 1, s).x;
        assert_eq!(l0, 0.0);
        assert_eq!(l1, 0.75);
        let blended = tex.sample_mip(0.1, 0.1, 0.5, s).x;
        assert!((blended - 0.375).abs() < 1e-6);
        // Above the last level clamps to it
        assert_eq!(tex.sample_mip(0.1, 0.1, 9.0, s).x, 0.75);
    }

    #[test]
    fn test_decode_png_bytes() {
        use image::{ImageFormat, Rgba, RgbaImage};
        use std::io::Cursor;

        let img = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 51, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let tex = Texture::from_bytes(&bytes).unwrap();
        assert_eq!((tex.width(), tex.height()), (2, 2));
        let p = tex.sample(1, 1, Wrap::Clamp);
        assert_eq!(p.x, 1.0);
        assert!((p.z - 0.2).abs() < 1e-6);
    }
}
