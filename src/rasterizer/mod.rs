//! Scanline software rasterizer
//!
//! Features:
//! - Homogeneous frustum clipping
//! - Perspective-correct attribute interpolation (or affine, for PS1 warping)
//! - Z-buffer with top-left fill convention
//! - Mip-mapped textures with nearest, bilinear and cubic Hermite filtering
//! - Directional sun plus ambient lighting
//! - Optional checkerboard interlacing

mod canvas;
mod clip;
mod edge;
mod gradients;
mod math;
mod mesh;
mod render;
mod settings;
mod texture;
mod vertex;

pub use canvas::*;
pub use clip::*;
pub use edge::*;
pub use gradients::*;
pub use math::*;
pub use mesh::*;
pub use render::*;
pub use settings::*;
pub use texture::*;
pub use vertex::*;

/// Default canvas size
pub const WIDTH: usize = 320;
pub const HEIGHT: usize = 240;
