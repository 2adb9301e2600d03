//! Minimal linear-algebra types shared by the compiler and the tracer:
//! a 3-vector, a 3x3 rotation, and a 4x4 homogeneous transform. Kept
//! hand-rolled (as the teacher's own `core::geometry` module is) rather
//! than pulled in from a vector-math crate, since the element-transform
//! and quadric-coefficient math below is cheap and fully specified by
//! spec.md §3/§4.2.

use impl_ops::impl_op_ex;
use serde::{Deserialize, Serialize};

use super::numeric::Float;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: Float, y: Float, z: Float) -> Self {
        Vec3 { x, y, z }
    }

    pub fn dot(self, rhs: Vec3) -> Float {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(self, rhs: Vec3) -> Vec3 {
        Vec3::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    pub fn length(self) -> Float {
        self.dot(self).sqrt()
    }

    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len == 0.0 {
            self
        } else {
            self / len
        }
    }

    /// Reflect `self` (an incoming direction) about normal `n` (unit length).
    pub fn reflect(self, n: Vec3) -> Vec3 {
        self - n * (2.0 * self.dot(n))
    }
}

impl_op_ex!(+ |a: &Vec3, b: &Vec3| -> Vec3 { Vec3::new(a.x + b.x, a.y + b.y, a.z + b.z) });
impl_op_ex!(- |a: &Vec3, b: &Vec3| -> Vec3 { Vec3::new(a.x - b.x, a.y - b.y, a.z - b.z) });
impl_op_ex!(- |a: &Vec3| -> Vec3 { Vec3::new(-a.x, -a.y, -a.z) });
impl_op_ex!(* |a: &Vec3, s: Float| -> Vec3 { Vec3::new(a.x * s, a.y * s, a.z * s) });
impl_op_ex!(/ |a: &Vec3, s: Float| -> Vec3 { Vec3::new(a.x / s, a.y / s, a.z / s) });

/// Row-major 3x3 rotation matrix.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mat3(pub [[Float; 3]; 3]);

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    /// Elemental rotation about the x-axis (radians).
    pub fn rotation_x(a: Float) -> Mat3 {
        let (s, c) = a.sin_cos();
        Mat3([[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]])
    }

    /// Elemental rotation about the y-axis (radians).
    pub fn rotation_y(a: Float) -> Mat3 {
        let (s, c) = a.sin_cos();
        Mat3([[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]])
    }

    /// Elemental rotation about the z-axis (radians).
    pub fn rotation_z(a: Float) -> Mat3 {
        let (s, c) = a.sin_cos();
        Mat3([[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]])
    }

    pub fn transpose(self) -> Mat3 {
        let m = self.0;
        Mat3([
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ])
    }

    pub fn mul_vec(self, v: Vec3) -> Vec3 {
        let m = self.0;
        Vec3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }

    pub fn mul_mat(self, rhs: Mat3) -> Mat3 {
        let a = self.0;
        let b = rhs.0;
        let mut out = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                out[i][j] = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
            }
        }
        Mat3(out)
    }
}

/// Row-major 4x4 homogeneous transform: `m_inTrans`/`m_outTrans` of spec.md §3.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mat4(pub [[Float; 4]; 4]);

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    pub fn translation(t: Vec3) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        m.0[0][3] = t.x;
        m.0[1][3] = t.y;
        m.0[2][3] = t.z;
        m
    }

    pub fn from_rotation(r: Mat3) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        for i in 0..3 {
            for j in 0..3 {
                m.0[i][j] = r.0[i][j];
            }
        }
        m
    }

    pub fn mul_mat(self, rhs: Mat4) -> Mat4 {
        let a = self.0;
        let b = rhs.0;
        let mut out = [[0.0; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                out[i][j] = (0..4).map(|k| a[i][k] * b[k][j]).sum();
            }
        }
        Mat4(out)
    }

    pub fn transform_point(self, p: Vec3) -> Vec3 {
        let m = self.0;
        Vec3::new(
            m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z + m[0][3],
            m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z + m[1][3],
            m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z + m[2][3],
        )
    }

    /// Transforms a direction (ignores translation).
    pub fn transform_dir(self, d: Vec3) -> Vec3 {
        let m = self.0;
        Vec3::new(
            m[0][0] * d.x + m[0][1] * d.y + m[0][2] * d.z,
            m[1][0] * d.x + m[1][1] * d.y + m[1][2] * d.z,
            m[2][0] * d.x + m[2][1] * d.y + m[2][2] * d.z,
        )
    }

    /// Inverse of a rigid transform built from `translation`/`from_rotation`
    /// compositions only — exploits `R^-1 = R^T` rather than a general
    /// Gauss-Jordan inverse, since every `Mat4` this crate builds is rigid.
    pub fn rigid_inverse(self) -> Mat4 {
        let m = self.0;
        let r = Mat3([
            [m[0][0], m[0][1], m[0][2]],
            [m[1][0], m[1][1], m[1][2]],
            [m[2][0], m[2][1], m[2][2]],
        ]);
        let rt = r.transpose();
        let t = Vec3::new(m[0][3], m[1][3], m[2][3]);
        let t_inv = rt.mul_vec(t) * -1.0;
        let mut out = Mat4::from_rotation(rt);
        out.0[0][3] = t_inv.x;
        out.0[1][3] = t_inv.y;
        out.0[2][3] = t_inv.z;
        out
    }

    /// Check `self * other == I` within `eps`, used to validate the
    /// `in_transform · out_transform = I` invariant of spec.md §3/§8.
    pub fn approx_inverse_of(self, other: Mat4, eps: Float) -> bool {
        let prod = self.mul_mat(other);
        for i in 0..4 {
            for j in 0..4 {
                let expect = if i == j { 1.0 } else { 0.0 };
                if (prod.0[i][j] - expect).abs() > eps {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn vec3_reflect_normal_incidence() {
        let d = Vec3::new(0.0, 0.0, 1.0);
        let n = Vec3::new(0.0, 0.0, -1.0);
        let r = d.reflect(n);
        assert_abs_diff_eq!(r.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.y, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.z, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn rigid_inverse_round_trips() {
        let r = Mat3::rotation_y(0.37).mul_mat(Mat3::rotation_x(0.12));
        let t = Vec3::new(1.0, -2.0, 3.5);
        let m = Mat4::translation(t * -1.0).mul_mat(Mat4::from_rotation(r));
        let inv = m.rigid_inverse();
        assert!(m.approx_inverse_of(inv, 1e-10));
    }
}
