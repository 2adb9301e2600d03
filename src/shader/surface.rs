//! Surface curvature: quadric matrix, toroid radii, plane, or cubic.
//!
//! Grounded in `original_source/.../Shader/Surface.h` for the
//! Quadric/Toroid/PlaneXY variants (field order matches
//! `serializeQuadric`/`serializeToroid` exactly); `Cubic` is named by
//! spec.md §3/§4.2 as a fourth surface kind but has no on-device
//! layout in the retrieved source slice, so its packed form is this
//! crate's own choice: ten coefficients, the same shape as the quadric
//! block, documented in DESIGN.md.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::core::numeric::Float;

/// Symmetric 4x4 quadric matrix `A`, stored as the 10 independent
/// upper-triangular entries `a11..a44`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuadricCoeffs {
    pub a11: Float,
    pub a12: Float,
    pub a13: Float,
    pub a14: Float,
    pub a22: Float,
    pub a23: Float,
    pub a24: Float,
    pub a33: Float,
    pub a34: Float,
    pub a44: Float,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Surface {
    /// `icurv` selects the root (+1 concave, -1 convex) at intersection time.
    Quadric { icurv: i32, coeffs: QuadricCoeffs },
    Toroid { long_radius: Float, short_radius: Float, concave: bool },
    Cubic { coeffs: QuadricCoeffs, cubic: [Float; 4] },
    PlaneXY,
}

impl QuadricCoeffs {
    fn is_finite(&self) -> bool {
        [self.a11, self.a12, self.a13, self.a14, self.a22, self.a23, self.a24, self.a33, self.a34, self.a44]
            .iter()
            .all(|c| c.is_finite())
    }
}

impl Surface {
    /// Per spec.md §4.2's compile-time failure conditions: a surface
    /// resolved from a degenerate arm-length/angle formula (division by
    /// zero, out-of-range `asin`/`atan`) carries a NaN or infinite
    /// coefficient, which this catches before the surface is packaged
    /// into a `CompiledElement`.
    pub fn is_finite(&self) -> bool {
        match self {
            Surface::Quadric { coeffs, .. } => coeffs.is_finite(),
            Surface::Toroid { long_radius, short_radius, .. } => long_radius.is_finite() && short_radius.is_finite(),
            Surface::Cubic { coeffs, cubic } => coeffs.is_finite() && cubic.iter().all(|c| c.is_finite()),
            Surface::PlaneXY => true,
        }
    }
}

const STYPE_QUADRIC: Float = 0.0;
const STYPE_TOROID: Float = 1.0;
const STYPE_PLANE_XY: Float = 2.0;
const STYPE_CUBIC: Float = 3.0;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuSurface {
    pub kind: Float,
    pub params: [Float; 16],
}

fn quadric_to_params(c: QuadricCoeffs) -> [Float; 10] {
    [c.a11, c.a12, c.a13, c.a14, c.a22, c.a23, c.a24, c.a33, c.a34, c.a44]
}

fn params_to_quadric(p: &[Float]) -> QuadricCoeffs {
    QuadricCoeffs { a11: p[0], a12: p[1], a13: p[2], a14: p[3], a22: p[4], a23: p[5], a24: p[6], a33: p[7], a34: p[8], a44: p[9] }
}

impl From<Surface> for GpuSurface {
    fn from(s: Surface) -> Self {
        let mut params = [0.0; 16];
        let kind = match s {
            Surface::Quadric { icurv, coeffs } => {
                params[0] = icurv as Float;
                params[1..11].copy_from_slice(&quadric_to_params(coeffs));
                STYPE_QUADRIC
            }
            Surface::Toroid { long_radius, short_radius, concave } => {
                params[0] = long_radius;
                params[1] = short_radius;
                params[2] = if concave { 1.0 } else { 0.0 };
                STYPE_TOROID
            }
            Surface::Cubic { coeffs, cubic } => {
                params[0..10].copy_from_slice(&quadric_to_params(coeffs));
                params[10..14].copy_from_slice(&cubic);
                STYPE_CUBIC
            }
            Surface::PlaneXY => STYPE_PLANE_XY,
        };
        GpuSurface { kind, params }
    }
}

impl From<GpuSurface> for Surface {
    fn from(g: GpuSurface) -> Self {
        let p = g.params;
        if g.kind == STYPE_QUADRIC {
            Surface::Quadric { icurv: p[0] as i32, coeffs: params_to_quadric(&p[1..11]) }
        } else if g.kind == STYPE_TOROID {
            Surface::Toroid { long_radius: p[0], short_radius: p[1], concave: p[2] != 0.0 }
        } else if g.kind == STYPE_CUBIC {
            Surface::Cubic { coeffs: params_to_quadric(&p[0..10]), cubic: p[10..14].try_into().unwrap() }
        } else {
            Surface::PlaneXY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadric_roundtrip() {
        let s = Surface::Quadric {
            icurv: -1,
            coeffs: QuadricCoeffs { a11: 1.0, a12: 0.0, a13: 0.0, a14: 0.0, a22: 1.0, a23: 0.0, a24: -5.0, a33: 1.0, a34: 0.0, a44: 0.0 },
        };
        let gpu: GpuSurface = s.into();
        let back: Surface = gpu.into();
        assert_eq!(s, back);
    }

    #[test]
    fn toroid_roundtrip() {
        let s = Surface::Toroid { long_radius: 1000.0, short_radius: 10.0, concave: true };
        let gpu: GpuSurface = s.into();
        let back: Surface = gpu.into();
        assert_eq!(s, back);
    }

    #[test]
    fn non_finite_quadric_is_rejected() {
        let s = Surface::Quadric {
            icurv: 1,
            coeffs: QuadricCoeffs { a11: f64::NAN, a12: 0.0, a13: 0.0, a14: 0.0, a22: 1.0, a23: 0.0, a24: 0.0, a33: 1.0, a34: 0.0, a44: 0.0 },
        };
        assert!(!s.is_finite());
    }

    #[test]
    fn non_finite_toroid_is_rejected() {
        let s = Surface::Toroid { long_radius: f64::INFINITY, short_radius: 10.0, concave: false };
        assert!(!s.is_finite());
    }
}
