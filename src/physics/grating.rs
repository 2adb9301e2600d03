//! Grating/RZP diffraction: the in-plane grating equation, VLS local
//! line density, and the RZP's position-dependent line density.
//!
//! Grounded in `original_source/.../RayCore/Beamline/Objects/PlaneGrating.cpp`'s
//! `focus()` routine for the `sin α − sin β = m λ ρ` mount equation
//! (there expressed as `a = |λ|·|lineDensity|·order·1e-6`, λ in nm and
//! line density in lines/mm — the `1e-6` converts lines/mm to
//! lines/nm) and `Shader/Behaviour.h`'s `m_vls[6]` field list for the
//! VLS polynomial's shape. The exact VLS polynomial coefficients
//! beyond "six correction terms" aren't in the retrieved source slice;
//! this crate uses the conventional Taylor-expansion-in-z form
//! documented in DESIGN.md.

use crate::core::numeric::Float;
use crate::shader::behaviour::RzpParams;

/// Converts lines/mm to lines/nm, the unit the grating equation below
/// is evaluated in (matching `PlaneGrating::focus`'s `1e-6` factor).
const LINES_PER_MM_TO_NM: Float = 1.0e-6;

/// Local line density (lines/nm) at position `z` (mm, measured from
/// element center) for a grating with nominal `line_density` (lines/mm)
/// and VLS coefficients `vls[0..6]` (dimensionless Taylor terms).
pub fn vls_line_density(line_density: Float, vls: [Float; 6], z: Float) -> Float {
    let mut correction = 1.0;
    let mut zn = z;
    for &c in &vls {
        correction += c * zn;
        zn *= z;
    }
    line_density * LINES_PER_MM_TO_NM * correction
}

/// Solves the grating equation `sin α − sin β = m λ ρ` for `β`, given
/// the incidence angle `alpha` (radians from the surface) and the
/// local line density `rho` (lines/nm). Returns `None` when the
/// diffracted order doesn't exist (the argument of `asin` would fall
/// outside `[-1, 1]`), matching spec.md §4.2's "asin out-of-range"
/// failure mode — here surfaced to the caller instead of aborting
/// compilation, since this runs per-ray at trace time.
pub fn diffracted_beta(alpha: Float, wavelength_nm: Float, rho: Float, order: Float) -> Option<Float> {
    let arg = alpha.sin() - order * wavelength_nm * rho;
    if arg.abs() > 1.0 {
        None
    } else {
        Some(arg.asin())
    }
}

/// RZP local line density at local coordinates `(x, z)` mm, derived
/// from the 14 design parameters per spec.md §4.2/§4.4. Grounded in
/// `original_source/.../ReflectionZonePlate.cpp`'s derivation shape
/// (zone-plate line density from focus geometry) but expressed in this
/// crate's own idiom rather than transliterated.
///
/// The zone-plate line density at a point is the local fringe spacing
/// between the two design foci (entrance/exit arms at the design
/// angles): `rho(x,z) = (1/λ_design) * d/dz [ r_exit(x,z) - r_in(x,z) ]`.
/// order`th order diffraction is then `order * rho` per `diffracted_beta`.
pub fn rzp_line_density(p: &RzpParams, x: Float, z: Float) -> Float {
    let lambda = p.design_wavelength;
    let order = p.design_order_of_diffraction.max(1.0);

    let alpha = p.design_alpha_angle;
    let beta = p.design_beta_angle;

    // Design foci sit in the meridional (z) plane at the entrance/exit
    // arm lengths and design angles, offset in x by the sagittal arms;
    // the zone plate's defining property is that every zone boundary
    // is a half-wavelength increment of the total entrance+exit path,
    // so the local line density is the z-gradient of that path length.
    let focus_in = (-p.design_sagittal_entrance_arm_length, 0.0, -p.design_meridional_entrance_arm_length * alpha.cos());
    let focus_out = (p.design_sagittal_exit_arm_length, 0.0, p.design_meridional_exit_arm_length * beta.cos());

    let path_length = |zz: Float| -> Float {
        let d_in = ((x - focus_in.0).powi(2) + focus_in.1.powi(2) + (zz - focus_in.2).powi(2)).sqrt();
        let d_out = ((x - focus_out.0).powi(2) + focus_out.1.powi(2) + (zz - focus_out.2).powi(2)).sqrt();
        d_in + d_out
    };

    let eps = 1.0e-6;
    let d_path = (path_length(z + eps) - path_length(z - eps)) / (2.0 * eps);
    (d_path / lambda * order).abs()
}
