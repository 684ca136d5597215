//! Perspective-correct scanline software rasterizer.
//!
//! Draws textured, lit, depth-tested triangles into any [`Canvas`].

pub mod rasterizer;

pub use rasterizer::{
    Canvas, FrameStats, Framebuffer, Mat3, Mat4, Mesh, RenderContext, RenderSettings, Texture, Vec2, Vec3, Vec4,
    Vertex,
};

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
