//! 2D bounding shapes in an element's local XZ-plane.
//!
//! Grounded in `original_source/.../Shader/Cutout.h`: the on-device
//! layout there packs every variant into `(type: f64, params: [f64; 3])`
//! so it uploads as a fixed-size GPU struct; this host-side type keeps
//! that shape (see [`GpuCutout`]) but exposes it as an ordinary Rust
//! enum everywhere else, per the host/device split spec.md §9 calls for.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::core::numeric::Float;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Cutout {
    /// Width in X, length in Z, centered at the origin.
    Rect { width: Float, length: Float },
    /// `(x/rx)^2 + (z/rz)^2 <= 1`, given as full diameters.
    Elliptical { diameter_x: Float, diameter_z: Float },
    /// Two parallel edges along X separated by `length` in Z.
    Trapezoid { width_a: Float, width_b: Float, length: Float },
    Unlimited,
}

impl Cutout {
    /// Membership test on the element's local (x, z) plane.
    ///
    /// Per spec.md §8's boundary rule, the test is closed on the
    /// negative edge and open on the positive edge in both axes, so a
    /// point exactly on a shared edge between two abutting cutouts is
    /// classified deterministically rather than to either or neither.
    pub fn contains(&self, x: Float, z: Float) -> bool {
        match *self {
            Cutout::Rect { width, length } => {
                let hw = width / 2.0;
                let hl = length / 2.0;
                x >= -hw && x < hw && z >= -hl && z < hl
            }
            Cutout::Elliptical { diameter_x, diameter_z } => {
                let rx = diameter_x / 2.0;
                let rz = diameter_z / 2.0;
                if rx == 0.0 || rz == 0.0 {
                    return false;
                }
                (x / rx).powi(2) + (z / rz).powi(2) <= 1.0
            }
            Cutout::Trapezoid { width_a, width_b, length } => {
                let hl = length / 2.0;
                if z < -hl || z >= hl {
                    return false;
                }
                // linear interpolation of the half-width between the two parallel edges
                let t = (z + hl) / length;
                let half_width = (width_a + t * (width_b - width_a)) / 2.0;
                x >= -half_width && x < half_width
            }
            Cutout::Unlimited => true,
        }
    }
}

const CTYPE_RECT: Float = 0.0;
const CTYPE_ELLIPTICAL: Float = 1.0;
const CTYPE_TRAPEZOID: Float = 2.0;
const CTYPE_UNLIMITED: Float = 3.0;

/// Shader-portable packed layout: `(type, params[3])`, matching `Cutout`
/// in `Shader/Cutout.h` field for field.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuCutout {
    pub kind: Float,
    pub params: [Float; 3],
}

impl From<Cutout> for GpuCutout {
    fn from(c: Cutout) -> Self {
        match c {
            Cutout::Rect { width, length } => GpuCutout { kind: CTYPE_RECT, params: [width, length, 0.0] },
            Cutout::Elliptical { diameter_x, diameter_z } => {
                GpuCutout { kind: CTYPE_ELLIPTICAL, params: [diameter_x, diameter_z, 0.0] }
            }
            Cutout::Trapezoid { width_a, width_b, length } => {
                GpuCutout { kind: CTYPE_TRAPEZOID, params: [width_a, width_b, length] }
            }
            Cutout::Unlimited => GpuCutout { kind: CTYPE_UNLIMITED, params: [0.0; 3] },
        }
    }
}

impl From<GpuCutout> for Cutout {
    fn from(g: GpuCutout) -> Self {
        if g.kind == CTYPE_RECT {
            Cutout::Rect { width: g.params[0], length: g.params[1] }
        } else if g.kind == CTYPE_ELLIPTICAL {
            Cutout::Elliptical { diameter_x: g.params[0], diameter_z: g.params[1] }
        } else if g.kind == CTYPE_TRAPEZOID {
            Cutout::Trapezoid { width_a: g.params[0], width_b: g.params[1], length: g.params[2] }
        } else {
            Cutout::Unlimited
        }
    }
}
