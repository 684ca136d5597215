//! Homogeneous clipping against the view frustum
//!
//! Sutherland-Hodgman in clip space, before the perspective divide, against
//! the planes `±x <= w`, `±y <= w`, `±z <= w`.

use super::vertex::Vertex;

/// Clip a convex polygon against all six frustum planes.
///
/// `polygon` is replaced by the clipped result; `scratch` is working storage.
/// Returns false when the polygon is clipped away entirely.
pub fn clip_polygon(polygon: &mut Vec<Vertex>, scratch: &mut Vec<Vertex>) -> bool {
    for axis in 0..3 {
        for factor in [1.0, -1.0] {
            clip_component(polygon, axis, factor, scratch);
            std::mem::swap(polygon, scratch);
            if polygon.is_empty() {
                return false;
            }
        }
    }
    true
}

/// Keep the part of `input` where `factor * position[axis] <= w`
fn clip_component(input: &[Vertex], axis: usize, factor: f32, output: &mut Vec<Vertex>) {
    output.clear();

    let Some(mut previous) = input.last() else {
        return;
    };
    let mut previous_component = previous.position[axis] * factor;
    let mut previous_inside = previous_component <= previous.w();

    for current in input {
        let current_component = current.position[axis] * factor;
        let current_inside = current_component <= current.w();

        if current_inside != previous_inside {
            let previous_distance = previous.w() - previous_component;
            let current_distance = current.w() - current_component;
            let t = previous_distance / (previous_distance - current_distance);

            let mut crossing = Vertex::mix(previous, current, t);
            // On the plane by construction; drop the rounding error
            crossing.position[axis] = factor * crossing.position.w;
            output.push(crossing);
        }

        if current_inside {
            output.push(*current);
        }

        previous = current;
        previous_component = current_component;
        previous_inside = current_inside;
    }
}

/// Split a convex polygon into a triangle fan around vertex 0
pub fn fan_triangles(polygon: &[Vertex]) -> impl Iterator<Item = (&Vertex, &Vertex, &Vertex)> {
    let first = polygon.first();
    polygon
        .windows(2)
        .skip(1)
        .filter_map(move |pair| first.map(|f| (f, &pair[0], &pair[1])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::math::{Vec2, Vec3, Vec4};

    fn clip_vertex(x: f32, y: f32, z: f32, w: f32) -> Vertex {
        Vertex::new(Vec4::new(x, y, z, w), Vec4::ONE, Vec2::ZERO, Vec3::ZERO)
    }

    fn roughly_in_view(v: &Vertex) -> bool {
        let p = v.position;
        let eps = 1e-5 * (1.0 + p.w.abs());
        p.x.abs() <= p.w + eps && p.y.abs() <= p.w + eps && p.z.abs() <= p.w + eps
    }

    #[test]
    fn test_inside_triangle_is_unchanged() {
        let tri = vec![
            clip_vertex(-0.5, -0.5, 0.0, 1.0),
            clip_vertex(0.5, -0.5, 0.2, 1.0),
            clip_vertex(0.0, 0.5, -0.3, 1.0),
        ];
        assert!(tri.iter().all(Vertex::is_in_view));

        let mut polygon = tri.clone();
        let mut scratch = Vec::new();
        assert!(clip_polygon(&mut polygon, &mut scratch));
        assert_eq!(polygon, tri);
    }

    #[test]
    fn test_outside_one_plane_clips_to_nothing() {
        let mut polygon = vec![
            clip_vertex(2.0, 0.0, 0.0, 1.0),
            clip_vertex(3.0, 0.5, 0.0, 1.0),
            clip_vertex(2.5, -0.5, 0.0, 1.0),
        ];
        let mut scratch = Vec::new();
        assert!(!clip_polygon(&mut polygon, &mut scratch));
        assert!(polygon.is_empty());
    }

    #[test]
    fn test_vertex_behind_camera_is_clipped_into_view() {
        let mut polygon = vec![
            clip_vertex(0.0, 0.0, 0.0, 1.0),
            clip_vertex(0.5, 0.0, 0.0, 1.0),
            clip_vertex(0.0, 0.5, -3.0, -1.0),
        ];
        let mut scratch = Vec::new();
        assert!(clip_polygon(&mut polygon, &mut scratch));
        assert!(polygon.len() >= 3 && polygon.len() <= 9);
        for v in &polygon {
            assert!(roughly_in_view(v), "{:?}", v.position);
            assert!(v.w() > 0.0);
        }
    }

    #[test]
    fn test_crossing_carries_attributes() {
        let mut a = clip_vertex(0.0, 0.0, 0.0, 1.0);
        a.tex_coord = Vec2::new(0.0, 0.0);
        let mut b = clip_vertex(3.0, 0.0, 0.0, 1.0);
        b.tex_coord = Vec2::new(1.0, 0.0);
        let mut c = clip_vertex(0.0, 0.5, 0.0, 1.0);
        c.tex_coord = Vec2::new(0.0, 1.0);

        let mut polygon = vec![a, b, c];
        let mut scratch = Vec::new();
        assert!(clip_polygon(&mut polygon, &mut scratch));
        assert_eq!(polygon.len(), 4);
        // a -> b crosses x = 1 at a third of the way
        let crossing = polygon.iter().find(|v| v.y() == 0.0 && v.x() == 1.0).unwrap();
        assert!((crossing.tex_coord.x - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_fan_covers_polygon() {
        let polygon: Vec<Vertex> = (0..5).map(|i| clip_vertex(i as f32, 0.0, 0.0, 1.0)).collect();
        let fans: Vec<_> = fan_triangles(&polygon).map(|(a, b, c)| (a.x(), b.x(), c.x())).collect();
        assert_eq!(fans, vec![(0.0, 1.0, 2.0), (0.0, 2.0, 3.0), (0.0, 3.0, 4.0)]);
        assert_eq!(fan_triangles(&polygon[..2]).count(), 0);
    }
}
