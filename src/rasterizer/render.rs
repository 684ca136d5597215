//! Triangle pipeline: clip, project, scan-convert, shade
//!
//! Per triangle: clip in homogeneous space, map to pixels and divide by w,
//! drop back-facing/degenerate triangles, sort by Y, then walk the long edge
//! against the two short edges one scanline at a time.

use std::rc::Rc;

use super::canvas::Canvas;
use super::clip::{clip_polygon, fan_triangles};
use super::edge::Edge;
use super::gradients::{Attributes, Gradients};
use super::math::{screen_space, Mat3, Mat4, Vec2, Vec4};
use super::mesh::Mesh;
use super::settings::RenderSettings;
use super::texture::Texture;
use super::vertex::{triangle_area_doubled, Vertex};

/// Depth value of an empty pixel (the far plane)
pub const FAR_DEPTH: f32 = 1.0;

/// Per-pixel depth, smaller is nearer
pub struct DepthBuffer {
    values: Vec<f32>,
    width: usize,
    height: usize,
}

impl DepthBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            values: vec![FAR_DEPTH; width * height],
            width,
            height,
        }
    }

    pub fn clear(&mut self) {
        self.values.fill(FAR_DEPTH);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, index: usize) -> f32 {
        self.values[index]
    }

    #[inline]
    pub fn set(&mut self, index: usize, depth: f32) {
        self.values[index] = depth;
    }

    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }
}

/// Counters for the current frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub triangles_submitted: u32,
    /// Screen triangles that reached scan conversion (clipping may split one input into several)
    pub triangles_drawn: u32,
    /// Back-facing or zero-area after projection
    pub culled_facing: u32,
    /// Entirely outside the view frustum
    pub culled_clipped: u32,
    pub pixels_written: u64,
}

/// Rasterizer state for one output canvas
pub struct RenderContext {
    width: usize,
    height: usize,
    screen_space: Mat4,
    depth: DepthBuffer,
    texture: Option<Rc<Texture>>,
    settings: RenderSettings,
    parity: u32,
    stats: FrameStats,

    // Reused per-draw storage
    transformed: Vec<Vertex>,
    polygon: Vec<Vertex>,
    scratch: Vec<Vertex>,
}

impl RenderContext {
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_settings(width, height, RenderSettings::default())
    }

    pub fn with_settings(width: usize, height: usize, settings: RenderSettings) -> Self {
        Self {
            width,
            height,
            screen_space: screen_space(width as f32 * 0.5, height as f32 * 0.5),
            depth: DepthBuffer::new(width, height),
            texture: None,
            settings,
            parity: 0,
            stats: FrameStats::default(),
            transformed: Vec::new(),
            polygon: Vec::with_capacity(9),
            scratch: Vec::with_capacity(9),
        }
    }

    /// Match a new canvas size. Reallocates the depth buffer.
    pub fn resize(&mut self, width: usize, height: usize) {
        log::debug!("Render context resized {}x{} -> {}x{}", self.width, self.height, width, height);
        self.width = width;
        self.height = height;
        self.screen_space = screen_space(width as f32 * 0.5, height as f32 * 0.5);
        self.depth = DepthBuffer::new(width, height);
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut RenderSettings {
        &mut self.settings
    }

    pub fn set_settings(&mut self, settings: RenderSettings) {
        self.settings = settings;
    }

    pub fn bind_texture(&mut self, texture: Rc<Texture>) {
        self.texture = Some(texture);
    }

    pub fn unbind_texture(&mut self) {
        self.texture = None;
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_deref()
    }

    pub fn depth_buffer(&self) -> &DepthBuffer {
        &self.depth
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Interlace parity of the current frame
    pub fn parity(&self) -> u32 {
        self.parity
    }

    /// Start a frame: reset depth and counters, alternate the interlace parity
    pub fn begin_frame(&mut self) {
        log::trace!("Frame stats: {:?}", self.stats);
        self.depth.clear();
        if self.settings.interlaced {
            self.parity ^= 1;
        }
        self.stats = FrameStats::default();
    }

    fn fit_canvas<C: Canvas + ?Sized>(&mut self, canvas: &C) {
        if canvas.width() != self.width || canvas.height() != self.height {
            self.resize(canvas.width(), canvas.height());
        }
    }

    /// Draw every triangle of `mesh`. `transform` takes mesh vertices to clip
    /// space; `normal_matrix`, when given, is applied to vertex normals.
    pub fn draw_mesh<C: Canvas + ?Sized>(
        &mut self,
        canvas: &mut C,
        mesh: &Mesh,
        transform: &Mat4,
        normal_matrix: Option<&Mat3>,
    ) {
        self.fit_canvas(canvas);

        let mut transformed = std::mem::take(&mut self.transformed);
        transformed.clear();
        transformed.extend(mesh.vertices().iter().map(|v| {
            let mut v = *v;
            match normal_matrix {
                Some(n) => v.transform_with_normal(transform, n),
                None => v.transform(transform),
            };
            v
        }));

        for &[a, b, c] in mesh.triangles() {
            self.fill_triangle(
                canvas,
                &transformed[a as usize],
                &transformed[b as usize],
                &transformed[c as usize],
            );
        }

        self.transformed = transformed;
    }

    /// Draw one triangle given in clip space
    pub fn draw_triangle<C: Canvas + ?Sized>(&mut self, canvas: &mut C, a: &Vertex, b: &Vertex, c: &Vertex) {
        self.fit_canvas(canvas);
        self.fill_triangle(canvas, a, b, c);
    }

    fn fill_triangle<C: Canvas + ?Sized>(&mut self, canvas: &mut C, a: &Vertex, b: &Vertex, c: &Vertex) {
        self.stats.triangles_submitted += 1;

        if a.is_in_view() && b.is_in_view() && c.is_in_view() {
            self.project_and_scan(canvas, *a, *b, *c);
            return;
        }

        let mut polygon = std::mem::take(&mut self.polygon);
        let mut scratch = std::mem::take(&mut self.scratch);
        polygon.clear();
        polygon.extend_from_slice(&[*a, *b, *c]);

        if clip_polygon(&mut polygon, &mut scratch) {
            for (p0, p1, p2) in fan_triangles(&polygon) {
                self.project_and_scan(canvas, *p0, *p1, *p2);
            }
        } else {
            self.stats.culled_clipped += 1;
        }

        self.polygon = polygon;
        self.scratch = scratch;
    }

    fn project_and_scan<C: Canvas + ?Sized>(&mut self, canvas: &mut C, mut a: Vertex, mut b: Vertex, mut c: Vertex) {
        a.transform(&self.screen_space).perspective_divide();
        b.transform(&self.screen_space).perspective_divide();
        c.transform(&self.screen_space).perspective_divide();

        let area = triangle_area_doubled(&a, &c, &b);
        if area < 0.0 && !self.settings.backface_cull {
            std::mem::swap(&mut b, &mut c);
        } else if !(area > 0.0) {
            // Also rejects NaN from degenerate clip output
            self.stats.culled_facing += 1;
            return;
        }

        let (mut min, mut mid, mut max) = (a, b, c);
        if max.y() < mid.y() {
            std::mem::swap(&mut max, &mut mid);
        }
        if mid.y() < min.y() {
            std::mem::swap(&mut mid, &mut min);
        }
        if max.y() < mid.y() {
            std::mem::swap(&mut max, &mut mid);
        }

        let handedness = triangle_area_doubled(&min, &max, &mid) >= 0.0;
        self.scan_triangle(canvas, &min, &mid, &max, handedness);
        self.stats.triangles_drawn += 1;
    }

    fn scan_triangle<C: Canvas + ?Sized>(
        &mut self,
        canvas: &mut C,
        min: &Vertex,
        mid: &Vertex,
        max: &Vertex,
        handedness: bool,
    ) {
        let gradients = Gradients::new(min, mid, max, self.settings.perspective_correct);
        let mut top_to_bottom = Edge::new(&gradients, min, max, 0);
        let mut top_to_middle = Edge::new(&gradients, min, mid, 0);
        let mut middle_to_bottom = Edge::new(&gradients, mid, max, 1);

        self.scan_edges(canvas, &gradients, &mut top_to_bottom, &mut top_to_middle, handedness);
        self.scan_edges(canvas, &gradients, &mut top_to_bottom, &mut middle_to_bottom, handedness);
    }

    /// Walk the rows covered by `short`, pairing it with the long edge
    fn scan_edges<C: Canvas + ?Sized>(
        &mut self,
        canvas: &mut C,
        gradients: &Gradients,
        long: &mut Edge,
        short: &mut Edge,
        handedness: bool,
    ) {
        for y in short.y_start()..short.y_end() {
            if y >= 0 && (y as usize) < self.height {
                let (left, right) = if handedness { (&*short, &*long) } else { (&*long, &*short) };
                self.draw_scan_line(canvas, gradients, left, right, y as usize);
            }
            long.step();
            short.step();
        }
    }

    fn draw_scan_line<C: Canvas + ?Sized>(
        &mut self,
        canvas: &mut C,
        gradients: &Gradients,
        left: &Edge,
        right: &Edge,
        y: usize,
    ) {
        let x_min = (left.x().ceil() as i32).max(0);
        let x_max = (right.x().ceil() as i32).min(self.width as i32);
        if x_min >= x_max {
            return;
        }

        let x_step = *gradients.x_step();
        let y_step = *gradients.y_step();
        let mut attrs = *left.attributes() + x_step * (x_min as f32 - left.x());

        let settings = &self.settings;
        let lighting = &settings.lighting;
        let sun_direction = lighting.sun_direction.normalize();
        let texture = self.texture.as_deref();
        let texture_size = texture.map(|t| Vec2::new(t.width() as f32, t.height() as f32));

        let row = y * self.width;
        let y_parity = y as u32 ^ self.parity;
        let mut written = 0u64;

        for x in x_min as usize..x_max as usize {
            let visible = !settings.interlaced || ((x as u32 ^ y_parity) & 1) == 0;
            let index = row + x;

            if visible && attrs.depth < self.depth.get(index) {
                let z = 1.0 / attrs.z_divisor;

                let light = if lighting.enabled {
                    let facing = (attrs.normal * z).dot(sun_direction) * lighting.sun_intensity;
                    let factor = facing.max(lighting.ambient_intensity).min(1.0);
                    lighting.ambient_color.mix(lighting.sun_color, factor)
                } else {
                    Vec4::ONE
                };

                let texel = match (texture, texture_size) {
                    (Some(texture), Some(size)) => {
                        let uv = attrs.tex_coord * z;
                        let lod = if settings.mipmaps {
                            mip_lod(&x_step, &y_step, uv, z, size) + settings.mip_bias
                        } else {
                            0.0
                        };
                        texture.sample_mip(uv.x, uv.y, lod, settings.sampling)
                    }
                    _ => Vec4::ONE,
                };

                canvas.set(x, y, texel * (attrs.color * z) * light);
                self.depth.set(index, attrs.depth);
                written += 1;
            }

            attrs += x_step;
        }

        self.stats.pixels_written += written;
    }
}

/// Mip level from the texel footprint of one pixel step.
///
/// With `U = u/w` and `Q = 1/w` both planar, `du/dx = (dU/dx - u·dQ/dx)·z`,
/// so the footprint grows with depth.
pub fn mip_lod(x_step: &Attributes, y_step: &Attributes, uv: Vec2, z: f32, size: Vec2) -> f32 {
    let ddx = (x_step.tex_coord - uv * x_step.z_divisor) * z * size;
    let ddy = (y_step.tex_coord - uv * y_step.z_divisor) * z * size;
    let footprint = ddx.dot(ddx).max(ddy.dot(ddy)).sqrt();
    if footprint > 0.0 {
        footprint.log2()
    } else {
        0.0
    }
}
