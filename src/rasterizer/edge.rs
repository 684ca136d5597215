//! Scanline edge walker
//!
//! Covers rows `ceil(top.y) .. ceil(bottom.y)`: top-inclusive and
//! bottom-exclusive, so triangles sharing an edge never shade a row twice.

use super::gradients::{Attributes, Gradients};
use super::vertex::Vertex;

#[derive(Debug, Clone, Copy)]
pub struct Edge {
    x: f32,
    x_step: f32,
    y_start: i32,
    y_end: i32,
    attributes: Attributes,
    attributes_step: Attributes,
}

impl Edge {
    /// Edge from `top` to `bottom` (`top.y <= bottom.y`). `top_index` is the
    /// position of `top` among the vertices `gradients` was built from.
    pub fn new(gradients: &Gradients, top: &Vertex, bottom: &Vertex, top_index: usize) -> Self {
        let y_start = top.y().ceil() as i32;
        let y_end = bottom.y().ceil() as i32;

        let y_dist = bottom.y() - top.y();
        let x_dist = bottom.x() - top.x();
        let x_step = if y_dist != 0.0 { x_dist / y_dist } else { 0.0 };

        // Snap to the first covered row, then account for the x we moved along the edge
        let y_prestep = y_start as f32 - top.y();
        let x = top.x() + x_step * y_prestep;
        let x_prestep = x - top.x();

        let attributes = *gradients.attributes(top_index)
            + *gradients.y_step() * y_prestep
            + *gradients.x_step() * x_prestep;
        let attributes_step = *gradients.y_step() + *gradients.x_step() * x_step;

        Self {
            x,
            x_step,
            y_start,
            y_end,
            attributes,
            attributes_step,
        }
    }

    /// Advance one scanline
    #[inline]
    pub fn step(&mut self) {
        self.x += self.x_step;
        self.attributes += self.attributes_step;
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y_start(&self) -> i32 {
        self.y_start
    }

    pub fn y_end(&self) -> i32 {
        self.y_end
    }

    #[inline]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::math::{Vec2, Vec3, Vec4};

    fn projected(x: f32, y: f32, depth: f32) -> Vertex {
        Vertex::new(Vec4::new(x, y, depth, 1.0), Vec4::ONE, Vec2::ZERO, Vec3::ZERO)
    }

    #[test]
    fn test_rows_are_top_inclusive_bottom_exclusive() {
        let a = projected(0.0, 2.0, 0.0);
        let b = projected(10.0, 7.0, 0.0);
        let c = projected(0.0, 9.5, 0.0);
        let g = Gradients::new(&a, &b, &c, true);
        let e = Edge::new(&g, &a, &b, 0);
        assert_eq!((e.y_start(), e.y_end()), (2, 7));
        let e = Edge::new(&g, &b, &c, 1);
        assert_eq!((e.y_start(), e.y_end()), (7, 10));
    }

    #[test]
    fn test_attributes_match_plane_after_subpixel_snap() {
        let a = projected(1.3, 0.4, 0.1);
        let b = projected(20.7, 12.2, 0.5);
        let c = projected(-4.0, 30.6, 0.9);
        let g = Gradients::new(&a, &b, &c, true);
        let mut e = Edge::new(&g, &a, &c, 0);

        for _ in e.y_start()..e.y_end() - 1 {
            e.step();
        }
        let y = (e.y_end() - 1) as f32;
        let expected_x = a.x() + (c.x() - a.x()) * (y - a.y()) / (c.y() - a.y());
        assert!((e.x() - expected_x).abs() < 1e-3);

        let plane = g.at(&a, 0, e.x(), y);
        assert!((e.attributes().depth - plane.depth).abs() < 1e-4);
    }

    #[test]
    fn test_flat_edge_has_no_rows() {
        let a = projected(0.0, 3.0, 0.0);
        let b = projected(8.0, 3.0, 0.0);
        let c = projected(4.0, 9.0, 0.0);
        let g = Gradients::new(&a, &b, &c, true);
        let e = Edge::new(&g, &a, &b, 0);
        assert_eq!(e.y_start(), e.y_end());
        assert!(e.x().is_finite());
    }
}
