//! Vector and matrix math for the rasterizer
//!
//! Column-vector convention throughout: `v' = M * v`, matrices stored
//! row-major as `m[row][col]`.

use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, Neg, Sub, SubAssign};
use serde::{Serialize, Deserialize};

/// 2D Vector (texture coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// 3D Vector (normals, directions)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 4D Vector (homogeneous positions, RGBA colors)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

/// Componentwise arithmetic shared by all vector types
macro_rules! impl_vec_ops {
    ($t:ident { $($f:ident),+ }) => {
        impl $t {
            pub fn dot(self, other: Self) -> f32 {
                0.0 $(+ self.$f * other.$f)+
            }

            pub fn len(self) -> f32 {
                self.dot(self).sqrt()
            }

            pub fn normalize(self) -> Self {
                let l = self.len();
                if l == 0.0 {
                    return self;
                }
                self / l
            }

            /// Linear blend: `self` at t = 0, `other` at t = 1
            pub fn mix(self, other: Self, t: f32) -> Self {
                Self { $($f: self.$f + (other.$f - self.$f) * t),+ }
            }
        }

        impl Add for $t {
            type Output = $t;
            fn add(self, other: $t) -> $t {
                $t { $($f: self.$f + other.$f),+ }
            }
        }

        impl Sub for $t {
            type Output = $t;
            fn sub(self, other: $t) -> $t {
                $t { $($f: self.$f - other.$f),+ }
            }
        }

        impl Mul for $t {
            type Output = $t;
            fn mul(self, other: $t) -> $t {
                $t { $($f: self.$f * other.$f),+ }
            }
        }

        impl Mul<f32> for $t {
            type Output = $t;
            fn mul(self, s: f32) -> $t {
                $t { $($f: self.$f * s),+ }
            }
        }

        impl Mul<$t> for f32 {
            type Output = $t;
            fn mul(self, v: $t) -> $t {
                v * self
            }
        }

        impl Div<f32> for $t {
            type Output = $t;
            fn div(self, s: f32) -> $t {
                $t { $($f: self.$f / s),+ }
            }
        }

        impl Neg for $t {
            type Output = $t;
            fn neg(self) -> $t {
                $t { $($f: -self.$f),+ }
            }
        }

        impl AddAssign for $t {
            fn add_assign(&mut self, other: $t) {
                $(self.$f += other.$f;)+
            }
        }

        impl SubAssign for $t {
            fn sub_assign(&mut self, other: $t) {
                $(self.$f -= other.$f;)+
            }
        }
    };
}

impl_vec_ops!(Vec2 { x, y });
impl_vec_ops!(Vec3 { x, y, z });
impl_vec_ops!(Vec4 { x, y, z, w });

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Vec3 = Vec3 { x: 1.0, y: 1.0, z: 1.0 };
    pub const UP: Vec3 = Vec3 { x: 0.0, y: 1.0, z: 0.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn extend(self, w: f32) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, w)
    }
}

impl Vec4 {
    pub const ZERO: Vec4 = Vec4 { x: 0.0, y: 0.0, z: 0.0, w: 0.0 };
    pub const ONE: Vec4 = Vec4 { x: 1.0, y: 1.0, z: 1.0, w: 1.0 };

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Opaque color from RGB
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { x: r, y: g, z: b, w: 1.0 }
    }

    pub fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

impl Index<usize> for Vec4 {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            3 => &self.w,
            _ => panic!("Vec4 index out of range: {}", i),
        }
    }
}

impl IndexMut<usize> for Vec4 {
    fn index_mut(&mut self, i: usize) -> &mut f32 {
        match i {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            3 => &mut self.w,
            _ => panic!("Vec4 index out of range: {}", i),
        }
    }
}

// ============================================================================
// Matrices
// ============================================================================

/// Fixed-size R×C matrix, `m[row][col]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix<const R: usize, const C: usize> {
    pub m: [[f32; C]; R],
}

pub type Mat3 = Matrix<3, 3>;
pub type Mat4 = Matrix<4, 4>;

impl<const R: usize, const C: usize> Matrix<R, C> {
    pub const ZERO: Self = Self { m: [[0.0; C]; R] };

    pub fn from_rows(m: [[f32; C]; R]) -> Self {
        Self { m }
    }

    pub fn transpose(&self) -> Matrix<C, R> {
        let mut out = Matrix::<C, R>::ZERO;
        for r in 0..R {
            for c in 0..C {
                out.m[c][r] = self.m[r][c];
            }
        }
        out
    }
}

impl<const N: usize> Matrix<N, N> {
    pub fn identity() -> Self {
        let mut out = Self::ZERO;
        for i in 0..N {
            out.m[i][i] = 1.0;
        }
        out
    }
}

impl<const N: usize> Default for Matrix<N, N> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<const R: usize, const K: usize, const C: usize> Mul<Matrix<K, C>> for Matrix<R, K> {
    type Output = Matrix<R, C>;
    fn mul(self, other: Matrix<K, C>) -> Matrix<R, C> {
        let mut out = Matrix::<R, C>::ZERO;
        for r in 0..R {
            for c in 0..C {
                let mut sum = 0.0;
                for k in 0..K {
                    sum += self.m[r][k] * other.m[k][c];
                }
                out.m[r][c] = sum;
            }
        }
        out
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    fn mul(self, v: Vec4) -> Vec4 {
        let m = &self.m;
        Vec4 {
            x: m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z + m[0][3] * v.w,
            y: m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z + m[1][3] * v.w,
            z: m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z + m[2][3] * v.w,
            w: m[3][0] * v.x + m[3][1] * v.y + m[3][2] * v.z + m[3][3] * v.w,
        }
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3 {
            x: m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            y: m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            z: m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        }
    }
}

impl Mat4 {
    /// Upper-left 3×3 block (rotation/scale part)
    pub fn upper3(&self) -> Mat3 {
        let mut out = Mat3::ZERO;
        for r in 0..3 {
            out.m[r].copy_from_slice(&self.m[r][..3]);
        }
        out
    }
}

/// Determinant by Gaussian elimination with partial pivoting
pub fn determinant<const N: usize>(mat: &Matrix<N, N>) -> f32 {
    let mut a = mat.m;
    let mut det = 1.0;
    for col in 0..N {
        let pivot = (col..N)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col] == 0.0 {
            return 0.0;
        }
        if pivot != col {
            a.swap(pivot, col);
            det = -det;
        }
        det *= a[col][col];
        for row in (col + 1)..N {
            let f = a[row][col] / a[col][col];
            for k in col..N {
                a[row][k] -= f * a[col][k];
            }
        }
    }
    det
}

/// Gauss-Jordan inverse. Returns None for singular matrices.
pub fn inverse<const N: usize>(mat: &Matrix<N, N>) -> Option<Matrix<N, N>> {
    let mut a = mat.m;
    let mut inv = Matrix::<N, N>::identity().m;

    for col in 0..N {
        let pivot = (col..N)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < f32::EPSILON * 1e-3 {
            return None;
        }
        a.swap(pivot, col);
        inv.swap(pivot, col);

        let p = a[col][col];
        for k in 0..N {
            a[col][k] /= p;
            inv[col][k] /= p;
        }

        for row in 0..N {
            if row == col {
                continue;
            }
            let f = a[row][col];
            if f == 0.0 {
                continue;
            }
            for k in 0..N {
                a[row][k] -= f * a[col][k];
                inv[row][k] -= f * inv[col][k];
            }
        }
    }

    Some(Matrix { m: inv })
}

/// Inverse-transpose of the model matrix's 3×3 block, for transforming normals.
/// Falls back to the plain 3×3 block when it is singular.
pub fn normal_matrix(model: &Mat4) -> Mat3 {
    let upper = model.upper3();
    inverse(&upper).map(|inv| inv.transpose()).unwrap_or(upper)
}

pub fn translate(x: f32, y: f32, z: f32) -> Mat4 {
    let mut mat = Mat4::identity();
    mat.m[0][3] = x;
    mat.m[1][3] = y;
    mat.m[2][3] = z;
    mat
}

pub fn scale(x: f32, y: f32, z: f32) -> Mat4 {
    let mut mat = Mat4::identity();
    mat.m[0][0] = x;
    mat.m[1][1] = y;
    mat.m[2][2] = z;
    mat
}

/// Rotation of `degrees` around `axis` (right-handed)
pub fn rotation(degrees: f32, axis: Vec3) -> Mat4 {
    let a = axis.normalize();
    let (s, c) = degrees.to_radians().sin_cos();
    let t = 1.0 - c;

    Mat4::from_rows([
        [t * a.x * a.x + c, t * a.x * a.y - s * a.z, t * a.x * a.z + s * a.y, 0.0],
        [t * a.x * a.y + s * a.z, t * a.y * a.y + c, t * a.y * a.z - s * a.x, 0.0],
        [t * a.x * a.z - s * a.y, t * a.y * a.z + s * a.x, t * a.z * a.z + c, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// OpenGL-style frustum: eye looks down -Z, near maps to NDC z = -1, far to +1
pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let xdist = right - left;
    let ydist = top - bottom;
    let zdist = far - near;

    Mat4::from_rows([
        [2.0 * near / xdist, 0.0, (right + left) / xdist, 0.0],
        [0.0, 2.0 * near / ydist, (top + bottom) / ydist, 0.0],
        [0.0, 0.0, -(far + near) / zdist, -2.0 * far * near / zdist],
        [0.0, 0.0, -1.0, 0.0],
    ])
}

/// Perspective projection from aspect ratio and vertical field of view in degrees
pub fn perspective(aspect: f32, fov_degrees: f32, near: f32, far: f32) -> Mat4 {
    let top = near * (fov_degrees.to_radians() * 0.5).tan();
    let right = top * aspect;
    frustum(-right, right, -top, top, near, far)
}

pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let mut mat = Mat4::identity();
    mat.m[0][0] = 2.0 / (right - left);
    mat.m[1][1] = 2.0 / (top - bottom);
    mat.m[2][2] = -2.0 / (far - near);
    mat.m[0][3] = -(right + left) / (right - left);
    mat.m[1][3] = -(top + bottom) / (top - bottom);
    mat.m[2][3] = -(far + near) / (far - near);
    mat
}

/// Maps NDC x,y in [-1, 1] to pixel coordinates [-0.5, size - 0.5], Y flipped.
/// Applied before the perspective divide, so offsets scale with w.
pub fn screen_space(half_width: f32, half_height: f32) -> Mat4 {
    let mut mat = Mat4::identity();
    mat.m[0][0] = half_width;
    mat.m[1][1] = -half_height;
    mat.m[0][3] = half_width - 0.5;
    mat.m[1][3] = half_height - 0.5;
    mat
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_vec3_dot() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert!((a.dot(b) - 32.0).abs() < 0.001);
    }

    #[test]
    fn test_vec3_cross() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        let c = a.cross(b);
        assert!((c.z - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_mix_endpoints() {
        let a = Vec4::new(0.0, 1.0, 2.0, 3.0);
        let b = Vec4::new(4.0, 5.0, 6.0, 7.0);
        assert_eq!(a.mix(b, 0.0), a);
        assert_eq!(a.mix(b, 1.0), b);
        assert_eq!(a.mix(b, 0.5), Vec4::new(2.0, 3.0, 4.0, 5.0));
    }

    #[test]
    fn test_translate_moves_points_not_directions() {
        let t = translate(1.0, 2.0, 3.0);
        assert_eq!(t * Vec4::new(0.0, 0.0, 0.0, 1.0), Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(t * Vec4::new(1.0, 0.0, 0.0, 0.0), Vec4::new(1.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_inverse_roundtrip() {
        let m = translate(3.0, -2.0, 5.0) * rotation(37.0, Vec3::new(1.0, 1.0, 0.0)) * scale(2.0, 3.0, 0.5);
        let inv = inverse(&m).expect("matrix is invertible");
        let id = m * inv;
        for r in 0..4 {
            for c in 0..4 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert!(approx(id.m[r][c], expected), "({}, {}) = {}", r, c, id.m[r][c]);
            }
        }
    }

    #[test]
    fn test_singular_has_no_inverse() {
        let m = scale(1.0, 0.0, 1.0);
        assert!(inverse(&m).is_none());
        assert_eq!(determinant(&m), 0.0);
    }

    #[test]
    fn test_determinant_of_scale() {
        assert!(approx(determinant(&scale(2.0, 3.0, 4.0)), 24.0));
        assert!(approx(determinant(&scale(2.0, 3.0, 4.0).upper3()), 24.0));
    }

    #[test]
    fn test_normal_matrix_keeps_normals_perpendicular() {
        // Non-uniform scale skews normals unless inverse-transposed
        let model = scale(4.0, 1.0, 1.0);
        let tangent = (model * Vec4::new(1.0, -1.0, 0.0, 0.0)).xyz();
        let normal = normal_matrix(&model) * Vec3::new(1.0, 1.0, 0.0);
        assert!(approx(tangent.dot(normal), 0.0));
    }

    #[test]
    fn test_perspective_depth_range() {
        let p = perspective(1.0, 90.0, 0.5, 10.0);
        let near = p * Vec4::new(0.0, 0.0, -0.5, 1.0);
        let far = p * Vec4::new(0.0, 0.0, -10.0, 1.0);
        assert!(approx(near.z / near.w, -1.0));
        assert!(approx(far.z / far.w, 1.0));
        // 90 degrees: the frustum edge sits at x = -z
        let edge = p * Vec4::new(2.0, 0.0, -2.0, 1.0);
        assert!(approx(edge.x / edge.w, 1.0));
    }

    #[test]
    fn test_ortho_maps_box_to_ndc_cube() {
        let o = ortho(0.0, 320.0, 0.0, 240.0, 1.0, 10.0);
        let near_corner = o * Vec4::new(0.0, 0.0, -1.0, 1.0);
        let far_corner = o * Vec4::new(320.0, 240.0, -10.0, 1.0);
        assert!(approx(near_corner.x, -1.0) && approx(near_corner.y, -1.0) && approx(near_corner.z, -1.0));
        assert!(approx(far_corner.x, 1.0) && approx(far_corner.y, 1.0) && approx(far_corner.z, 1.0));
        assert_eq!(far_corner.w, 1.0);
    }

    #[test]
    fn test_screen_space_maps_ndc_to_pixels() {
        let s = screen_space(50.0, 50.0);
        let tl = s * Vec4::new(-1.0, 1.0, 0.0, 1.0);
        let br = s * Vec4::new(1.0, -1.0, 0.0, 1.0);
        assert_eq!((tl.x, tl.y), (-0.5, -0.5));
        assert_eq!((br.x, br.y), (99.5, 99.5));
    }
}
