//! Slope-error perturbation of a surface normal.
//!
//! Per spec.md §4.4: two independent Gaussians (sagittal, meridional)
//! rotate the local normal before reflection/diffraction; position is
//! never touched. Grounded in `Shader/Element.h`'s `SlopeError` field
//! list (carried in [`crate::shader::SlopeError`]) and sampled with
//! the crate's own counter-based RNG rather than the source's
//! `std::mt19937`, per spec.md §4.5/§9.

use crate::core::geometry::{Mat3, Vec3};
use crate::core::rng::CounterRng;
use crate::shader::SlopeError;

/// Perturbs `normal` (unit length, in the element's local frame) by
/// independent Gaussian rotations about the sagittal (x) and
/// meridional (z) axes, with standard deviations `slope_error.sag` and
/// `.mer` (radians). A zero-sigma axis contributes no rotation.
pub fn perturb_normal(normal: Vec3, slope_error: SlopeError, rng: &mut CounterRng) -> Vec3 {
    if slope_error.sag == 0.0 && slope_error.mer == 0.0 {
        return normal;
    }
    let d_mer = if slope_error.mer > 0.0 { rng.normal(0.0, slope_error.mer) } else { 0.0 };
    let d_sag = if slope_error.sag > 0.0 { rng.normal(0.0, slope_error.sag) } else { 0.0 };
    let rotation = Mat3::rotation_x(d_sag).mul_mat(Mat3::rotation_z(d_mer));
    rotation.mul_vec(normal).normalized()
}
