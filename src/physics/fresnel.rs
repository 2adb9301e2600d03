//! Fresnel reflectance of a grazing-incidence mirror.
//!
//! Grounded in the standard thin-film-free Fresnel equations (no direct
//! analogue survives in the retrieved `original_source/` slice, which
//! only carries the tabulated-index side of the calculation in
//! `Material/Material.cpp`); `REFLECTIVE` material short-circuits to
//! `R_s = R_p = 1` per spec.md §8's invariant.

use num_complex::Complex64;

use crate::core::numeric::Float;

/// `(R_s, R_p)` power reflectance for light hitting a surface of
/// complex refractive index `n - ik` at grazing angle `theta` (radians
/// from the surface, i.e. `pi/2` is normal incidence).
pub fn reflectance(theta_grazing: Float, n: Float, k: Float) -> (Float, Float) {
    let n2 = Complex64::new(n, -k);
    let n1 = Complex64::new(1.0, 0.0);

    let cos_i = theta_grazing.sin();
    let sin_i = theta_grazing.cos();
    let sin_t = n1 * sin_i / n2;
    let cos_t = (Complex64::new(1.0, 0.0) - sin_t * sin_t).sqrt();
    let cos_i = Complex64::new(cos_i, 0.0);

    let r_s = (n1 * cos_i - n2 * cos_t) / (n1 * cos_i + n2 * cos_t);
    let r_p = (n2 * cos_i - n1 * cos_t) / (n2 * cos_i + n1 * cos_t);
    (r_s.norm_sqr(), r_p.norm_sqr())
}

/// Attenuates a ray's electric field (x = s, y = p component in the
/// element's local frame) by the amplitude reflectances at `theta`,
/// preserving phase (only the amplitude coefficients' sign/phase
/// relative to incidence is modeled, as the source material does).
pub fn apply_reflectance(field: [Complex64; 3], theta_grazing: Float, n: Float, k: Float) -> [Complex64; 3] {
    let (r_s, r_p) = reflectance(theta_grazing, n, k);
    [field[0] * r_s.sqrt(), field[1] * r_p.sqrt(), field[2]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn reflective_material_is_perfect_mirror() {
        // A material with k -> infinity models `REFLECTIVE`; instead the
        // tracer special-cases `REFLECTIVE` before calling this function
        // (see `crate::tracer::behave`), so this test checks the
        // approach to unity as absorption grows, not the sentinel path.
        let (rs, rp) = reflectance(0.1, 1.0, 1.0e6);
        assert_abs_diff_eq!(rs, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rp, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn reflectance_is_bounded() {
        for theta in [0.001, 0.01, 0.1, 0.5, 1.0] {
            let (rs, rp) = reflectance(theta, 0.95, 0.02);
            assert!(rs >= 0.0 && rs <= 1.0 + 1e-9);
            assert!(rp >= 0.0 && rp <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn grazing_incidence_reflects_better_than_steep() {
        let (rs_grazing, _) = reflectance(0.01, 0.95, 0.02);
        let (rs_steep, _) = reflectance(1.4, 0.95, 0.02);
        assert!(rs_grazing > rs_steep);
    }
}
