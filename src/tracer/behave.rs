//! Behaviour application at a collision point: mirror reflection,
//! grating/RZP diffraction, slit transmission, and image-plane
//! absorption, per spec.md §4.2/§4.4.
//!
//! The s/p polarization split and Fresnel attenuation are grounded in
//! [`crate::physics::fresnel`]; the grating/RZP diffraction direction
//! uses Rodrigues' rotation formula to rotate the mirror-reflected
//! direction about the groove axis by `alpha - beta`, a construction
//! chosen so that order 0 (where `diffracted_beta` returns `beta =
//! alpha`) degenerates exactly to plain mirror reflection, matching
//! `physics::grating`'s own `zero_order_grating_acts_as_mirror` test.

use num_complex::Complex64;

use crate::core::geometry::Vec3;
use crate::core::numeric::{to_wavelength_nm, Float};
use crate::core::rng::CounterRng;
use crate::materials::{refractive_index, MaterialTables, REFLECTIVE};
use crate::physics::fresnel::reflectance;
use crate::physics::grating::{diffracted_beta, rzp_line_density, vls_line_density};
use crate::physics::slope_error::perturb_normal;
use crate::shader::behaviour::RzpParams;
use crate::shader::event::EventType;
use crate::shader::{Behaviour, CompiledElement, Cutout, Ray};

use super::intersect::Collision;

/// `additionalOrder` doubles a grating/RZP's zero-order output per
/// spec.md §9, which leaves the split policy unspecified; this crate
/// resolves it deterministically by the ray's own `path_id` parity
/// (even -> the element's nominal order, odd -> zero order), so a
/// fixed seed always reproduces the same split. Recorded in DESIGN.md.
fn resolve_order(nominal_order: Float, additional_order: bool, path_id: i32) -> Float {
    if additional_order && path_id % 2 != 0 {
        0.0
    } else {
        nominal_order
    }
}

/// Rotates `v` about unit axis `axis` by `angle` radians (Rodrigues).
fn rotate_about_axis(v: Vec3, axis: Vec3, angle: Float) -> Vec3 {
    let (s, c) = angle.sin_cos();
    v * c + axis.cross(v) * s + axis * axis.dot(v) * (1.0 - c)
}

/// Splits a world-frame field into its s/p amplitudes at a surface hit
/// with direction `d` and normal `n`, both unit length. `s` is
/// perpendicular to the plane of incidence, `p` completes the
/// right-handed basis with `d`.
fn s_p_basis(d: Vec3, n: Vec3) -> (Vec3, Vec3) {
    let s = if d.cross(n).length() > 1.0e-9 { d.cross(n).normalized() } else { Vec3::new(1.0, 0.0, 0.0).cross(n).normalized() };
    let p = s.cross(d).normalized();
    (s, p)
}

fn project_field(field: [Complex64; 3], s_hat: Vec3, p_hat: Vec3) -> (Complex64, Complex64) {
    let f = Vec3::new(field[0].re, field[1].re, field[2].re);
    let fi = Vec3::new(field[0].im, field[1].im, field[2].im);
    let fs = Complex64::new(f.dot(s_hat), fi.dot(s_hat));
    let fp = Complex64::new(f.dot(p_hat), fi.dot(p_hat));
    (fs, fp)
}

fn reconstruct_field(fs: Complex64, fp: Complex64, s_hat: Vec3, p_hat: Vec3) -> [Complex64; 3] {
    let re = s_hat * fs.re + p_hat * fp.re;
    let im = s_hat * fs.im + p_hat * fp.im;
    [Complex64::new(re.x, im.x), Complex64::new(re.y, im.y), Complex64::new(re.z, im.z)]
}

/// Outcome of a Fresnel reflectance application at a collision: the
/// ray survives (field attenuated, or passed at full amplitude under a
/// Monte-Carlo draw), is absorbed outright by a Monte-Carlo draw, or
/// hits the `RuntimeRayError` "refractive-index out-of-table" case of
/// spec.md §7, which the caller turns into `FatalError`.
enum FresnelOutcome {
    Survived,
    Absorbed,
    OutOfTable,
}

/// Attenuates `ray.field` by the material's Fresnel reflectance at
/// this hit, using the world-frame `direction`/`normal`. `REFLECTIVE`
/// is a perfect mirror with no absorption, per spec.md §8.
///
/// Per spec.md §4.4's Mirror behavior, `monte_carlo` selects between
/// two modes: `false` deterministically scales the field by `sqrt(R)`
/// (every ray survives); `true` draws one `rng` sample and absorbs the
/// ray outright with probability `1 - R` (the unpolarized average of
/// the s/p coefficients), passing it through at full amplitude
/// otherwise.
fn apply_fresnel(
    ray: &mut Ray,
    direction: Vec3,
    normal: Vec3,
    material: i32,
    monte_carlo: bool,
    tables: &MaterialTables,
    rng: &mut CounterRng,
) -> FresnelOutcome {
    let (s_hat, p_hat) = s_p_basis(direction, normal);
    let (fs, fp) = project_field(ray.field, s_hat, p_hat);

    let (r_s, r_p) = if material == REFLECTIVE {
        (1.0, 1.0)
    } else {
        match refractive_index(tables, material, ray.energy) {
            Some((n, k)) => {
                let theta_grazing = direction.dot(normal).abs().asin();
                reflectance(theta_grazing, n, k)
            }
            None => return FresnelOutcome::OutOfTable,
        }
    };

    if monte_carlo {
        let r = 0.5 * (r_s + r_p);
        if rng.uniform() >= r {
            return FresnelOutcome::Absorbed;
        }
        return FresnelOutcome::Survived;
    }

    ray.field = reconstruct_field(fs * r_s.sqrt(), fp * r_p.sqrt(), s_hat, p_hat);
    FresnelOutcome::Survived
}

/// Applies `element.behaviour` to `ray` at `collision`, mutating its
/// position, direction, field, and event state in place. `rng` drives
/// slope-error perturbation; `tables` resolves the element's material.
pub fn behave(ray: &mut Ray, element: &CompiledElement, collision: &Collision, tables: &MaterialTables, rng: &mut CounterRng) {
    ray.position = collision.point_world;

    let normal = perturb_local_then_world(element, collision, rng);

    match element.behaviour {
        Behaviour::Mirror => {
            ray.direction = ray.direction.reflect(normal);
            match apply_fresnel(ray, ray.direction, normal, element.material, element.monte_carlo_reflectance, tables, rng) {
                FresnelOutcome::Survived => {}
                FresnelOutcome::Absorbed => ray.event_type = EventType::Absorbed,
                FresnelOutcome::OutOfTable => ray.event_type = EventType::FatalError,
            }
        }
        Behaviour::Grating { vls, line_density, order } => {
            diffract(ray, element, collision, normal, tables, rng, |z| vls_line_density(line_density, vls, z), order, false);
        }
        Behaviour::Rzp(params) => {
            let RzpParams { order_of_diffraction, additional_order, .. } = params;
            diffract(
                ray,
                element,
                collision,
                normal,
                tables,
                rng,
                |_| rzp_line_density(&params, collision.point_local.x, collision.point_local.z),
                order_of_diffraction,
                additional_order != 0.0,
            );
        }
        Behaviour::Slit { opening, beamstop } => {
            let (x, z) = (collision.point_local.x, collision.point_local.z);
            if contains_open(opening, beamstop, x, z) {
                ray.event_type = EventType::HitElement;
            } else {
                ray.event_type = EventType::Absorbed;
            }
        }
        Behaviour::ImagePlane => {
            ray.event_type = EventType::Absorbed;
        }
    }
}

fn contains_open(opening: Cutout, beamstop: Cutout, x: Float, z: Float) -> bool {
    opening.contains(x, z) && !beamstop.contains(x, z)
}

fn perturb_local_then_world(element: &CompiledElement, collision: &Collision, rng: &mut CounterRng) -> Vec3 {
    let normal_local = element.in_transform.transform_dir(collision.normal_world).normalized();
    let perturbed_local = perturb_normal(normal_local, element.slope_error, rng);
    element.out_transform.transform_dir(perturbed_local).normalized()
}

#[allow(clippy::too_many_arguments)]
fn diffract(
    ray: &mut Ray,
    element: &CompiledElement,
    collision: &Collision,
    normal: Vec3,
    tables: &MaterialTables,
    rng: &mut CounterRng,
    rho_at: impl Fn(Float) -> Float,
    nominal_order: Float,
    additional_order: bool,
) {
    let d_mirror = ray.direction.reflect(normal);
    let alpha = ray.direction.dot(normal).abs().asin();
    let wavelength_nm = to_wavelength_nm(ray.energy);
    let rho = rho_at(collision.point_local.z);
    let order = resolve_order(nominal_order, additional_order, ray.path_id);

    match diffracted_beta(alpha, wavelength_nm, rho, order) {
        Some(beta) => {
            let groove_axis = s_p_basis(ray.direction, normal).0;
            ray.direction = rotate_about_axis(d_mirror, groove_axis, alpha - beta).normalized();
            ray.order = order as i32;
            match apply_fresnel(ray, ray.direction, normal, element.material, element.monte_carlo_reflectance, tables, rng) {
                FresnelOutcome::Survived => {}
                FresnelOutcome::Absorbed => ray.event_type = EventType::Absorbed,
                FresnelOutcome::OutOfTable => ray.event_type = EventType::FatalError,
            }
        }
        None => {
            ray.event_type = EventType::Absorbed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Mat4;
    use crate::shader::{SlopeError, Surface};
    use approx::assert_abs_diff_eq;

    fn flat_element(material: i32, behaviour: Behaviour) -> CompiledElement {
        CompiledElement {
            in_transform: Mat4::IDENTITY,
            out_transform: Mat4::IDENTITY,
            behaviour,
            surface: Surface::PlaneXY,
            cutout: Cutout::Unlimited,
            slope_error: SlopeError::default(),
            azimuthal_angle: 0.0,
            material,
            monte_carlo_reflectance: false,
        }
    }

    fn flat_element_mc(material: i32, behaviour: Behaviour) -> CompiledElement {
        CompiledElement { monte_carlo_reflectance: true, ..flat_element(material, behaviour) }
    }

    fn incoming_ray(direction: Vec3) -> Ray {
        Ray {
            path_id: 0,
            path_event_id: 1,
            position: Vec3::ZERO,
            direction,
            field: [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0)],
            optical_path_length: 0.0,
            energy: 500.0,
            order: 0,
            object_id: 0,
            source_id: 0,
            event_type: EventType::HitElement,
            rand_counter: 0,
        }
    }

    #[test]
    fn reflective_mirror_reflects_direction() {
        let element = flat_element(REFLECTIVE, Behaviour::Mirror);
        let collision = Collision { t: 1.0, point_local: Vec3::ZERO, point_world: Vec3::ZERO, normal_world: Vec3::new(0.0, 1.0, 0.0) };
        let mut ray = incoming_ray(Vec3::new(0.0, -1.0, 0.1).normalized());
        let mut rng = CounterRng::new(1, 1);
        let tables = MaterialTables::default();
        behave(&mut ray, &element, &collision, &tables, &mut rng);
        assert!(ray.direction.y > 0.0);
        assert_abs_diff_eq!(ray.direction.length(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn monte_carlo_reflectance_never_absorbs_a_perfect_reflector() {
        // REFLECTIVE has R = 1.0 at every angle/energy, so the `rng.uniform()
        // >= r` absorption draw can never fire regardless of the stream.
        let element = flat_element_mc(REFLECTIVE, Behaviour::Mirror);
        let collision = Collision { t: 1.0, point_local: Vec3::ZERO, point_world: Vec3::ZERO, normal_world: Vec3::new(0.0, 1.0, 0.0) };
        let tables = MaterialTables::default();
        for seed in 0..8 {
            let mut ray = incoming_ray(Vec3::new(0.0, -1.0, 0.1).normalized());
            let mut rng = CounterRng::new(seed, seed);
            behave(&mut ray, &element, &collision, &tables, &mut rng);
            assert_ne!(ray.event_type, EventType::Absorbed);
            assert!(ray.direction.y > 0.0);
        }
    }

    #[test]
    fn imageplane_absorbs() {
        let element = flat_element(crate::materials::VACUUM, Behaviour::ImagePlane);
        let collision = Collision { t: 1.0, point_local: Vec3::ZERO, point_world: Vec3::ZERO, normal_world: Vec3::new(0.0, 1.0, 0.0) };
        let mut ray = incoming_ray(Vec3::new(0.0, -1.0, 0.0));
        let mut rng = CounterRng::new(1, 1);
        let tables = MaterialTables::default();
        behave(&mut ray, &element, &collision, &tables, &mut rng);
        assert_eq!(ray.event_type, EventType::Absorbed);
    }

    #[test]
    fn slit_beamstop_absorbs_center() {
        let element = flat_element(
            crate::materials::VACUUM,
            Behaviour::Slit { opening: Cutout::Rect { width: 10.0, length: 10.0 }, beamstop: Cutout::Rect { width: 1.0, length: 1.0 } },
        );
        let collision = Collision { t: 1.0, point_local: Vec3::ZERO, point_world: Vec3::ZERO, normal_world: Vec3::new(0.0, 1.0, 0.0) };
        let mut ray = incoming_ray(Vec3::new(0.0, -1.0, 0.0));
        let mut rng = CounterRng::new(1, 1);
        let tables = MaterialTables::default();
        behave(&mut ray, &element, &collision, &tables, &mut rng);
        assert_eq!(ray.event_type, EventType::Absorbed);
    }

    #[test]
    fn zero_order_grating_matches_mirror_direction() {
        let grating = flat_element(crate::materials::VACUUM, Behaviour::Grating { vls: [0.0; 6], line_density: 1200.0, order: 0.0 });
        let mirror = flat_element(crate::materials::VACUUM, Behaviour::Mirror);
        let collision = Collision { t: 1.0, point_local: Vec3::ZERO, point_world: Vec3::ZERO, normal_world: Vec3::new(0.0, 1.0, 0.0) };

        let mut ray_g = incoming_ray(Vec3::new(0.05, -1.0, 0.0).normalized());
        let mut ray_m = ray_g;
        let tables = MaterialTables::default();
        behave(&mut ray_g, &grating, &collision, &tables, &mut CounterRng::new(1, 1));
        behave(&mut ray_m, &mirror, &collision, &tables, &mut CounterRng::new(1, 1));

        assert_abs_diff_eq!(ray_g.direction.x, ray_m.direction.x, epsilon = 1e-9);
        assert_abs_diff_eq!(ray_g.direction.y, ray_m.direction.y, epsilon = 1e-9);
        assert_abs_diff_eq!(ray_g.direction.z, ray_m.direction.z, epsilon = 1e-9);
    }
}
