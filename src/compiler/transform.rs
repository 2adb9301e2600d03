//! World <-> element coordinate transform composition.
//!
//! Grounded in spec.md §4.2's `in_transform = T(-p) · R` /
//! `out_transform = R^T · T(p)` plus the misalignment transform that
//! multiplies onto `in_transform` from the right (its inverse onto
//! `out_transform` from the left), replacing the source's legacy
//! `setTemporaryMisalignment` mid-behavior stack per spec.md's
//! REDESIGN FLAGS — one fixed (in, out) pair per element, no transform
//! stack.

use crate::beamline::Misalignment;
use crate::core::geometry::{Mat3, Mat4, Vec3};

/// Swaps the design plane's Y and Z axes, for elements whose curvature
/// was authored in an XY design plane rather than the tracer's default
/// XZ plane, per spec.md §4.2.
const SWAP_YZ: Mat3 = Mat3([[1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]]);

/// Composes the misalignment's translation and its x/y/z elemental
/// rotations (`dpsi`, `dphi`, `dchi` respectively) into a single rigid
/// transform, applied in that order per spec.md §4.2.
fn misalignment_transform(m: Misalignment) -> Mat4 {
    let rotation = Mat3::rotation_x(m.dpsi).mul_mat(Mat3::rotation_y(m.dphi)).mul_mat(Mat3::rotation_z(m.dchi));
    Mat4::translation(Vec3::new(m.dx, m.dy, m.dz)).mul_mat(Mat4::from_rotation(rotation))
}

/// Builds the `(in_transform, out_transform)` pair for an element at
/// world `position`/`orientation`, folding in `misalignment` and the
/// optional Y<->Z design-plane swap.
pub fn compile_transforms(position: Vec3, orientation: Mat3, misalignment: Misalignment, xy_design_plane: bool) -> (Mat4, Mat4) {
    let r = if xy_design_plane { orientation.mul_mat(SWAP_YZ) } else { orientation };

    let base_in = Mat4::translation(position * -1.0).mul_mat(Mat4::from_rotation(r));
    let base_out = Mat4::from_rotation(r.transpose()).mul_mat(Mat4::translation(position));

    let mis = misalignment_transform(misalignment);
    let in_transform = base_in.mul_mat(mis);
    let out_transform = mis.rigid_inverse().mul_mat(base_out);

    (in_transform, out_transform)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_placement_round_trips() {
        let (in_t, out_t) = compile_transforms(Vec3::ZERO, Mat3::IDENTITY, Misalignment::default(), false);
        assert!(in_t.approx_inverse_of(out_t, 1e-10));
    }

    #[test]
    fn misaligned_placement_still_round_trips() {
        let misalignment = Misalignment { dx: 0.3, dy: -0.1, dz: 0.05, dpsi: 0.01, dphi: -0.02, dchi: 0.015 };
        let orientation = Mat3::rotation_y(0.2).mul_mat(Mat3::rotation_x(0.1));
        let (in_t, out_t) = compile_transforms(Vec3::new(1.0, 2.0, 3.0), orientation, misalignment, false);
        assert!(in_t.approx_inverse_of(out_t, 1e-9));
    }

    #[test]
    fn xy_design_plane_swap_still_round_trips() {
        let (in_t, out_t) = compile_transforms(Vec3::new(0.5, 0.0, 10.0), Mat3::rotation_x(0.05), Misalignment::default(), true);
        assert!(in_t.approx_inverse_of(out_t, 1e-9));
    }
}
