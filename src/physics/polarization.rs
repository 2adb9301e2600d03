//! Stokes vector <-> electric-field conversions.
//!
//! Grounded in `original_source/.../Math/Polarization.h`'s
//! `toLocalElectricField`/`toStokes` pair: a ray's polarization state
//! is produced by the light sources as a Stokes vector `(I, Q, U, V)`
//! and converted once into the local two-component complex field the
//! tracer's `Ray::field` embeds (third component populated with zero
//! until a behavior rotates the frame).

use num_complex::Complex64;

use crate::core::numeric::Float;

pub type Stokes = [Float; 4];

/// `(Ex, Ey)` in the local transverse frame, x real by convention.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalField {
    pub x: Complex64,
    pub y: Complex64,
}

/// `x_real = sqrt((I+Q)/2)`, `y = polar(sqrt((I-Q)/2), -atan2(V, U))`.
pub fn stokes_to_local_field(stokes: Stokes) -> LocalField {
    let [i, q, u, v] = stokes;
    let x_real = ((i + q) / 2.0).max(0.0).sqrt();
    let y_mag = ((i - q) / 2.0).max(0.0).sqrt();
    let y_theta = -v.atan2(u);
    LocalField { x: Complex64::new(x_real, 0.0), y: Complex64::from_polar(y_mag, y_theta) }
}

pub fn local_field_to_stokes(field: LocalField) -> Stokes {
    let mag_x = field.x.norm();
    let mag_y = field.y.norm();
    let theta_x = field.x.arg();
    let theta_y = field.y.arg();
    [
        mag_x * mag_x + mag_y * mag_y,
        mag_x * mag_x - mag_y * mag_y,
        2.0 * mag_x * mag_y * (theta_x - theta_y).cos(),
        2.0 * mag_x * mag_y * (theta_x - theta_y).sin(),
    ]
}

/// Embeds a local 2-component field into the 3-component world-frame
/// field a `Ray` carries, rotating by `orientation` (applied to real
/// and imaginary parts independently, since the rotation is real).
pub fn local_field_to_world(field: LocalField, orientation: crate::core::geometry::Mat3) -> [Complex64; 3] {
    let re = orientation.mul_vec(crate::core::geometry::Vec3::new(field.x.re, field.y.re, 0.0));
    let im = orientation.mul_vec(crate::core::geometry::Vec3::new(field.x.im, field.y.im, 0.0));
    [
        Complex64::new(re.x, im.x),
        Complex64::new(re.y, im.y),
        Complex64::new(re.z, im.z),
    ]
}
