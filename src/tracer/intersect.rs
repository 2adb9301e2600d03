//! Collision math per surface type, per spec.md §4.4.
//!
//! The quadric solve and the `icurv` root-selection convention follow
//! `original_source/.../detail/Compile/Curvature.cpp`'s coefficient
//! layout; the toroid's bounded Newton-Raphson iteration and the plane
//! analytic solve are transcribed directly from spec.md's text since no
//! single original-source file isolates them from device-specific
//! plumbing.

use crate::core::geometry::Vec3;
use crate::core::numeric::Float;
use crate::shader::surface::QuadricCoeffs;
use crate::shader::{CompiledElement, Cutout, Surface};

/// Rays closer than this to the origin of their own local frame are
/// self-intersections and discarded, per spec.md §4.4.
pub const EPS_SELF: Float = 1.0e-11;
const TOROID_MAX_ITER: u32 = 16;
const TOROID_TOLERANCE: Float = 1.0e-10;

/// A validated hit: local-frame parameters plus the quantities the
/// tracer needs in world space to continue the ray.
#[derive(Clone, Copy, Debug)]
pub struct Collision {
    pub t: Float,
    pub point_local: Vec3,
    pub point_world: Vec3,
    pub normal_world: Vec3,
}

fn quadric_value(c: &QuadricCoeffs, v: Vec3) -> Float {
    c.a11 * v.x * v.x
        + 2.0 * c.a12 * v.x * v.y
        + 2.0 * c.a13 * v.x * v.z
        + 2.0 * c.a14 * v.x
        + c.a22 * v.y * v.y
        + 2.0 * c.a23 * v.y * v.z
        + 2.0 * c.a24 * v.y
        + c.a33 * v.z * v.z
        + 2.0 * c.a34 * v.z
        + c.a44
}

/// Gradient of the quadric form at `v`, i.e. `2 * (A*v + b)` — the
/// surface normal direction at any point on the quadric.
fn quadric_gradient(c: &QuadricCoeffs, v: Vec3) -> Vec3 {
    Vec3::new(
        2.0 * (c.a11 * v.x + c.a12 * v.y + c.a13 * v.z + c.a14),
        2.0 * (c.a12 * v.x + c.a22 * v.y + c.a23 * v.z + c.a24),
        2.0 * (c.a13 * v.x + c.a23 * v.y + c.a33 * v.z + c.a34),
    )
}

fn solve_quadratic(a: Float, b: Float, c: Float) -> Vec<Float> {
    if a.abs() < 1.0e-14 {
        if b.abs() < 1.0e-14 {
            return vec![];
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return vec![];
    }
    let sq = disc.sqrt();
    let t1 = (-b - sq) / (2.0 * a);
    let t2 = (-b + sq) / (2.0 * a);
    if t1 <= t2 {
        vec![t1, t2]
    } else {
        vec![t2, t1]
    }
}

fn intersect_quadric(p: Vec3, d: Vec3, icurv: i32, coeffs: &QuadricCoeffs) -> Option<Float> {
    // F(p + t d) expanded into a quadratic in t by separating the
    // quadric's pure-quadratic, bilinear, and linear contributions.
    let q_d = coeffs.a11 * d.x * d.x
        + coeffs.a22 * d.y * d.y
        + coeffs.a33 * d.z * d.z
        + 2.0 * coeffs.a12 * d.x * d.y
        + 2.0 * coeffs.a13 * d.x * d.z
        + 2.0 * coeffs.a23 * d.y * d.z;
    let bilinear_pd = coeffs.a11 * p.x * d.x
        + coeffs.a22 * p.y * d.y
        + coeffs.a33 * p.z * d.z
        + coeffs.a12 * (p.x * d.y + p.y * d.x)
        + coeffs.a13 * (p.x * d.z + p.z * d.x)
        + coeffs.a23 * (p.y * d.z + p.z * d.y);
    let linear_d = coeffs.a14 * d.x + coeffs.a24 * d.y + coeffs.a34 * d.z;

    let a_coeff = q_d;
    let b_coeff = 2.0 * (bilinear_pd + linear_d);
    let c_coeff = quadric_value(coeffs, p);

    let roots: Vec<Float> = solve_quadratic(a_coeff, b_coeff, c_coeff).into_iter().filter(|&t| t > EPS_SELF).collect();
    match roots.len() {
        0 => None,
        1 => Some(roots[0]),
        _ => Some(if icurv >= 0 { roots[0] } else { roots[1] }),
    }
}

fn intersect_toroid(p: Vec3, d: Vec3, long_radius: Float, short_radius: Float) -> Option<Float> {
    let f = |t: Float| -> Float {
        let v = p + d * t;
        let u = (v.x * v.x + v.z * v.z).sqrt();
        (u - long_radius).powi(2) + v.y * v.y - short_radius * short_radius
    };
    let df = |t: Float| -> Float {
        let v = p + d * t;
        let u = (v.x * v.x + v.z * v.z).sqrt();
        if u < 1.0e-14 {
            return 2.0 * v.y * d.y;
        }
        let du = (v.x * d.x + v.z * d.z) / u;
        2.0 * (u - long_radius) * du + 2.0 * v.y * d.y
    };

    let mut t = if d.y.abs() > 1.0e-16 { -p.y / d.y } else { 0.0 };
    for _ in 0..TOROID_MAX_ITER {
        let fv = f(t);
        if fv.abs() < TOROID_TOLERANCE {
            return (t > EPS_SELF).then_some(t);
        }
        let dfv = df(t);
        if dfv.abs() < 1.0e-14 {
            return None;
        }
        t -= fv / dfv;
    }
    None
}

fn intersect_plane_xy(p: Vec3, d: Vec3) -> Option<Float> {
    if d.y.abs() < 1.0e-16 {
        return None;
    }
    let t = -p.y / d.y;
    (t > EPS_SELF).then_some(t)
}

/// Newton-Raphson root of the quadric form plus a height correction in
/// `cubic`, starting from the pure quadric's own root (or the plane
/// fallback `t = -p.y/d.y` if the quadric has none). The exact cubic
/// convention has no surviving reference in `original_source/`'s
/// retrieved slice; this crate treats `cubic` as
/// `c0*x^3 + c1*x^2*z + c2*x*z^2 + c3*z^3` added to the quadric form,
/// a choice documented in DESIGN.md.
fn intersect_cubic(p: Vec3, d: Vec3, icurv: i32, coeffs: &QuadricCoeffs, cubic: [Float; 4]) -> Option<Float> {
    let cubic_term = |v: Vec3| -> Float { cubic[0] * v.x.powi(3) + cubic[1] * v.x.powi(2) * v.z + cubic[2] * v.x * v.z.powi(2) + cubic[3] * v.z.powi(3) };

    let f = |t: Float| quadric_value(coeffs, p + d * t) + cubic_term(p + d * t);
    let mut t = intersect_quadric(p, d, icurv, coeffs).unwrap_or_else(|| if d.y.abs() > 1.0e-16 { -p.y / d.y } else { 0.0 });

    for _ in 0..TOROID_MAX_ITER {
        let fv = f(t);
        if fv.abs() < TOROID_TOLERANCE {
            return (t > EPS_SELF).then_some(t);
        }
        let eps = 1.0e-6;
        let df = (f(t + eps) - f(t - eps)) / (2.0 * eps);
        if df.abs() < 1.0e-14 {
            return None;
        }
        t -= fv / df;
    }
    None
}

/// Outward surface normal at local point `v`, unit length.
fn surface_normal(surface: &Surface, v: Vec3) -> Vec3 {
    match *surface {
        Surface::Quadric { coeffs, .. } => quadric_gradient(&coeffs, v).normalized(),
        Surface::Cubic { coeffs, cubic } => {
            let grad = quadric_gradient(&coeffs, v);
            let cubic_grad = Vec3::new(
                3.0 * cubic[0] * v.x * v.x + 2.0 * cubic[1] * v.x * v.z + cubic[2] * v.z * v.z,
                0.0,
                cubic[1] * v.x * v.x + 2.0 * cubic[2] * v.x * v.z + 3.0 * cubic[3] * v.z * v.z,
            );
            (grad + cubic_grad).normalized()
        }
        Surface::Toroid { long_radius, .. } => {
            let u = (v.x * v.x + v.z * v.z).sqrt();
            if u < 1.0e-14 {
                return Vec3::new(0.0, 1.0, 0.0);
            }
            let ring = Vec3::new(v.x / u * long_radius, 0.0, v.z / u * long_radius);
            (v - ring).normalized()
        }
        Surface::PlaneXY => Vec3::new(0.0, 1.0, 0.0),
    }
}

/// A toroid's Newton-Raphson solve failed to converge within
/// [`TOROID_MAX_ITER`] iterations. Distinct from a clean miss: the
/// caller tags the ray `FatalError` rather than `BeyondHorizon`, per
/// spec.md §4.4.
#[derive(Clone, Copy, Debug)]
pub struct NonConvergent;

/// Intersects a world-frame ray `(p, d)` with `element`, enforcing the
/// element's cutout and the `icurv`/toroid/plane rules of spec.md
/// §4.4. `Ok(None)` is a clean miss (no root, or the hit point falls
/// outside the cutout); `Err(NonConvergent)` is a toroid whose Newton
/// iteration never settled, which the caller must not silently treat
/// as a miss.
pub fn intersect(p_world: Vec3, d_world: Vec3, element: &CompiledElement) -> Result<Option<Collision>, NonConvergent> {
    let p = element.in_transform.transform_point(p_world);
    let d = element.in_transform.transform_dir(d_world);

    let t = match element.surface {
        Surface::Quadric { icurv, coeffs } => intersect_quadric(p, d, icurv, &coeffs),
        Surface::Toroid { long_radius, short_radius, .. } => match intersect_toroid(p, d, long_radius, short_radius) {
            Some(t) => Some(t),
            None => return Err(NonConvergent),
        },
        Surface::Cubic { coeffs, cubic } => intersect_cubic(p, d, 1, &coeffs, cubic),
        Surface::PlaneXY => intersect_plane_xy(p, d),
    };
    let Some(t) = t else { return Ok(None) };

    let point_local = p + d * t;
    if !element.cutout.contains(point_local.x, point_local.z) {
        return Ok(None);
    }

    let normal_local = surface_normal(&element.surface, point_local);
    let point_world = element.out_transform.transform_point(point_local);
    let normal_world = element.out_transform.transform_dir(normal_local).normalized();

    Ok(Some(Collision { t, point_local, point_world, normal_world }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Mat4;
    use crate::shader::{Behaviour, SlopeError};
    use approx::assert_abs_diff_eq;

    fn identity_element(surface: Surface, cutout: Cutout) -> CompiledElement {
        CompiledElement {
            in_transform: Mat4::IDENTITY,
            out_transform: Mat4::IDENTITY,
            behaviour: Behaviour::Mirror,
            surface,
            cutout,
            slope_error: SlopeError::default(),
            azimuthal_angle: 0.0,
            material: crate::materials::VACUUM,
            monte_carlo_reflectance: false,
        }
    }

    #[test]
    fn plane_xy_hits_straight_down() {
        let element = identity_element(Surface::PlaneXY, Cutout::Unlimited);
        let collision = intersect(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0), &element).unwrap().unwrap();
        assert_abs_diff_eq!(collision.t, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(collision.point_world.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn plane_xy_parallel_ray_is_non_hit() {
        let element = identity_element(Surface::PlaneXY, Cutout::Unlimited);
        assert!(intersect(Vec3::new(0.0, 5.0, 0.0), Vec3::new(1.0, 0.0, 0.0), &element).unwrap().is_none());
    }

    #[test]
    fn sphere_intersection_lands_on_surface() {
        let coeffs = QuadricCoeffs { a11: 1.0, a12: 0.0, a13: 0.0, a14: 0.0, a22: 1.0, a23: 0.0, a24: -1000.0, a33: 1.0, a34: 0.0, a44: 0.0 };
        let element = identity_element(Surface::Quadric { icurv: 1, coeffs }, Cutout::Unlimited);
        let collision = intersect(Vec3::new(0.0, -990.0, 0.0), Vec3::new(0.0, 1.0, 0.0), &element).unwrap().unwrap();
        let residual = quadric_value(&coeffs, collision.point_local);
        assert_abs_diff_eq!(residual, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn cutout_rejects_outside_hits() {
        let element = identity_element(Surface::PlaneXY, Cutout::Rect { width: 1.0, length: 1.0 });
        assert!(intersect(Vec3::new(10.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0), &element).unwrap().is_none());
    }

    #[test]
    fn toroid_newton_converges_on_axis() {
        let element = identity_element(Surface::Toroid { long_radius: 1000.0, short_radius: 10.0, concave: true }, Cutout::Unlimited);
        let collision = intersect(Vec3::new(0.0, 5.0, -1000.0), Vec3::new(0.0, -1.0, 0.0), &element);
        assert!(collision.unwrap().is_some());
    }
}
