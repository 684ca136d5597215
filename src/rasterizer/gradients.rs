//! Per-triangle screen-space attribute gradients
//!
//! Every interpolated attribute is planar in screen space once it has been
//! multiplied by 1/w, so one X step and one Y step describe it over the
//! whole triangle.

use std::ops::{Add, AddAssign, Mul, Sub};

use super::math::{Vec2, Vec3, Vec4};
use super::vertex::Vertex;

/// The full set of attributes carried across a triangle.
///
/// `color`, `tex_coord` and `normal` are pre-multiplied by `z_divisor`
/// (1/w) when perspective correction is on. `depth` is the projected z,
/// which is already affine in screen space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Attributes {
    pub color: Vec4,
    pub tex_coord: Vec2,
    pub z_divisor: f32,
    pub depth: f32,
    pub normal: Vec3,
}

impl Add for Attributes {
    type Output = Attributes;
    #[inline]
    fn add(self, o: Attributes) -> Attributes {
        Attributes {
            color: self.color + o.color,
            tex_coord: self.tex_coord + o.tex_coord,
            z_divisor: self.z_divisor + o.z_divisor,
            depth: self.depth + o.depth,
            normal: self.normal + o.normal,
        }
    }
}

impl Sub for Attributes {
    type Output = Attributes;
    #[inline]
    fn sub(self, o: Attributes) -> Attributes {
        Attributes {
            color: self.color - o.color,
            tex_coord: self.tex_coord - o.tex_coord,
            z_divisor: self.z_divisor - o.z_divisor,
            depth: self.depth - o.depth,
            normal: self.normal - o.normal,
        }
    }
}

impl Mul<f32> for Attributes {
    type Output = Attributes;
    #[inline]
    fn mul(self, s: f32) -> Attributes {
        Attributes {
            color: self.color * s,
            tex_coord: self.tex_coord * s,
            z_divisor: self.z_divisor * s,
            depth: self.depth * s,
            normal: self.normal * s,
        }
    }
}

impl AddAssign for Attributes {
    #[inline]
    fn add_assign(&mut self, o: Attributes) {
        self.color += o.color;
        self.tex_coord += o.tex_coord;
        self.z_divisor += o.z_divisor;
        self.depth += o.depth;
        self.normal += o.normal;
    }
}

impl Attributes {
    fn of_vertex(v: &Vertex, perspective_correct: bool) -> Attributes {
        let one_over_w = if perspective_correct { 1.0 / v.w() } else { 1.0 };
        Attributes {
            color: v.color * one_over_w,
            tex_coord: v.tex_coord * one_over_w,
            z_divisor: one_over_w,
            depth: v.z(),
            normal: v.normal * one_over_w,
        }
    }
}

fn step_x<T>(values: &[T; 3], cay: f32, cby: f32, one_over_dx: f32) -> T
where
    T: Copy + Sub<Output = T> + Mul<f32, Output = T>,
{
    ((values[1] - values[2]) * cay - (values[0] - values[2]) * cby) * one_over_dx
}

fn step_y<T>(values: &[T; 3], cax: f32, cbx: f32, one_over_dy: f32) -> T
where
    T: Copy + Sub<Output = T> + Mul<f32, Output = T>,
{
    ((values[1] - values[2]) * cax - (values[0] - values[2]) * cbx) * one_over_dy
}

/// Immutable attribute planes of one triangle
#[derive(Debug, Clone, Copy)]
pub struct Gradients {
    values: [Attributes; 3],
    x_step: Attributes,
    y_step: Attributes,
}

impl Gradients {
    /// Build from three projected, perspective-divided vertices.
    /// The triangle must have non-zero screen area.
    pub fn new(a: &Vertex, b: &Vertex, c: &Vertex, perspective_correct: bool) -> Self {
        let values = [
            Attributes::of_vertex(a, perspective_correct),
            Attributes::of_vertex(b, perspective_correct),
            Attributes::of_vertex(c, perspective_correct),
        ];

        let cax = a.x() - c.x();
        let cay = a.y() - c.y();
        let cbx = b.x() - c.x();
        let cby = b.y() - c.y();

        let one_over_dx = 1.0 / (cbx * cay - cax * cby);
        let one_over_dy = -one_over_dx;

        Self {
            values,
            x_step: step_x(&values, cay, cby, one_over_dx),
            y_step: step_y(&values, cax, cbx, one_over_dy),
        }
    }

    #[inline]
    pub fn attributes(&self, index: usize) -> &Attributes {
        &self.values[index]
    }

    #[inline]
    pub fn x_step(&self) -> &Attributes {
        &self.x_step
    }

    #[inline]
    pub fn y_step(&self) -> &Attributes {
        &self.y_step
    }

    /// Attribute plane evaluated at a screen position, relative to vertex `origin`
    pub fn at(&self, origin: &Vertex, index: usize, x: f32, y: f32) -> Attributes {
        self.values[index] + self.x_step * (x - origin.x()) + self.y_step * (y - origin.y())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-4 * (1.0 + a.abs().max(b.abs()))
    }

    fn projected(x: f32, y: f32, z: f32, w: f32) -> Vertex {
        Vertex::new(Vec4::new(x, y, z, w), Vec4::ONE, Vec2::ZERO, Vec3::ZERO)
    }

    fn sample_triangle() -> [Vertex; 3] {
        [
            projected(10.0, 5.0, 0.2, 1.0)
                .with_color(Vec4::new(1.0, 0.0, 0.0, 1.0))
                .with_tex_coord(Vec2::new(0.0, 0.0))
                .with_normal(Vec3::new(0.0, 0.0, 1.0)),
            projected(40.0, 30.0, 0.5, 2.0)
                .with_color(Vec4::new(0.0, 1.0, 0.0, 1.0))
                .with_tex_coord(Vec2::new(1.0, 0.0))
                .with_normal(Vec3::new(1.0, 0.0, 0.0)),
            projected(5.0, 45.0, 0.9, 4.0)
                .with_color(Vec4::new(0.0, 0.0, 1.0, 1.0))
                .with_tex_coord(Vec2::new(0.0, 1.0))
                .with_normal(Vec3::new(0.0, 1.0, 0.0)),
        ]
    }

    #[test]
    fn test_plane_reproduces_vertex_values() {
        let tri = sample_triangle();
        for perspective in [true, false] {
            let g = Gradients::new(&tri[0], &tri[1], &tri[2], perspective);
            for (i, v) in tri.iter().enumerate() {
                // Walk from vertex 2 to vertex i using only the steps
                let got = g.at(&tri[2], 2, v.x(), v.y());
                let want = g.attributes(i);
                assert!(close(got.color.x, want.color.x));
                assert!(close(got.color.y, want.color.y));
                assert!(close(got.tex_coord.x, want.tex_coord.x));
                assert!(close(got.tex_coord.y, want.tex_coord.y));
                assert!(close(got.z_divisor, want.z_divisor));
                assert!(close(got.depth, want.depth));
                assert!(close(got.normal.z, want.normal.z));
            }
        }
    }

    #[test]
    fn test_depth_is_not_divided() {
        let tri = sample_triangle();
        let g = Gradients::new(&tri[0], &tri[1], &tri[2], true);
        assert_eq!(g.attributes(2).depth, 0.9);
        assert_eq!(g.attributes(2).z_divisor, 0.25);
        assert_eq!(g.attributes(2).tex_coord, Vec2::new(0.0, 0.25));
    }

    #[test]
    fn test_without_perspective_divisor_is_flat() {
        let tri = sample_triangle();
        let g = Gradients::new(&tri[0], &tri[1], &tri[2], false);
        assert_eq!(g.attributes(0).z_divisor, 1.0);
        assert_eq!(g.x_step().z_divisor, 0.0);
        assert_eq!(g.y_step().z_divisor, 0.0);
    }

    #[test]
    fn test_perspective_correct_differs_from_affine() {
        // Strongly foreshortened: w grows from 1 to 10 across the triangle
        let a = projected(0.0, 0.0, 0.0, 1.0).with_tex_coord(Vec2::new(0.0, 0.0));
        let b = projected(90.0, 0.0, 0.0, 10.0).with_tex_coord(Vec2::new(1.0, 0.0));
        let c = projected(0.0, 90.0, 0.0, 1.0).with_tex_coord(Vec2::new(0.0, 1.0));
        let (cx, cy) = (30.0, 30.0);

        let g = Gradients::new(&a, &b, &c, true);
        let p = g.at(&a, 0, cx, cy);
        let u = p.tex_coord.x / p.z_divisor;

        // Reference: barycentrics (1/3 each) applied to u/w and 1/w
        let inv_w = [1.0, 0.1, 1.0];
        let us = [0.0, 1.0, 0.0];
        let num: f32 = (0..3).map(|i| us[i] * inv_w[i]).sum::<f32>() / 3.0;
        let den: f32 = inv_w.iter().sum::<f32>() / 3.0;
        let expected = num / den;
        assert!(close(u, expected), "{} vs {}", u, expected);

        let affine = Gradients::new(&a, &b, &c, false).at(&a, 0, cx, cy);
        assert!(close(affine.tex_coord.x, 1.0 / 3.0));
        assert!((u - affine.tex_coord.x).abs() > 0.2);
    }
}
