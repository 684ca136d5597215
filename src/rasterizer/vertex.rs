//! Pipeline vertex: clip-space position plus interpolated attributes

use super::math::{Mat3, Mat4, Vec2, Vec3, Vec4};

/// A vertex with homogeneous position, color, texture coordinate and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec4,
    pub color: Vec4,
    pub tex_coord: Vec2,
    pub normal: Vec3,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Vec4::new(0.0, 0.0, 0.0, 1.0),
            color: Vec4::ONE,
            tex_coord: Vec2::ZERO,
            normal: Vec3::ZERO,
        }
    }
}

impl Vertex {
    pub fn new(position: Vec4, color: Vec4, tex_coord: Vec2, normal: Vec3) -> Self {
        Self { position, color, tex_coord, normal }
    }

    /// White vertex at (x, y, z) with w = 1
    pub fn from_pos(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec4::new(x, y, z, 1.0),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    pub fn with_tex_coord(mut self, tex_coord: Vec2) -> Self {
        self.tex_coord = tex_coord;
        self
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = normal;
        self
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn z(&self) -> f32 {
        self.position.z
    }

    pub fn w(&self) -> f32 {
        self.position.w
    }

    /// Apply `matrix` to the position
    pub fn transform(&mut self, matrix: &Mat4) -> &mut Self {
        self.position = *matrix * self.position;
        self
    }

    /// Apply `matrix` to the position and `normal_matrix` to the normal,
    /// renormalizing the result
    pub fn transform_with_normal(&mut self, matrix: &Mat4, normal_matrix: &Mat3) -> &mut Self {
        self.position = *matrix * self.position;
        self.normal = (*normal_matrix * self.normal).normalize();
        self
    }

    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let mut v = *self;
        v.transform(matrix);
        v
    }

    /// Divide x, y, z by w. w is kept so 1/w stays available for
    /// perspective-correct interpolation.
    pub fn perspective_divide(&mut self) -> &mut Self {
        let w = self.position.w;
        self.position.x /= w;
        self.position.y /= w;
        self.position.z /= w;
        self
    }

    /// True when the position lies inside all six clip planes
    pub fn is_in_view(&self) -> bool {
        let p = self.position;
        p.x.abs() <= p.w && p.y.abs() <= p.w && p.z.abs() <= p.w
    }

    /// Interpolate every attribute between `a` (t = 0) and `b` (t = 1)
    pub fn mix(a: &Vertex, b: &Vertex, t: f32) -> Vertex {
        Vertex {
            position: a.position.mix(b.position, t),
            color: a.color.mix(b.color, t),
            tex_coord: a.tex_coord.mix(b.tex_coord, t),
            normal: a.normal.mix(b.normal, t),
        }
    }
}

/// Twice the signed screen-space area of (a, b, c)
pub fn triangle_area_doubled(a: &Vertex, b: &Vertex, c: &Vertex) -> f32 {
    let x1 = b.x() - a.x();
    let y1 = b.y() - a.y();
    let x2 = c.x() - a.x();
    let y2 = c.y() - a.y();
    x1 * y2 - x2 * y1
}
