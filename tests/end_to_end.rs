//! End-to-end scenarios exercising the full pipeline — declarative
//! [`Beamline`] through [`compile_beamline`] through [`CpuTracer`] —
//! rather than any single module in isolation.

use rayx_core::beamline::source::{generate_rays, DipoleSourceConfig, PointSourceConfig, SourceConfig, Spread};
use rayx_core::beamline::{Beamline, BehaviourDesign, Curvature, ElementDesign, Misalignment};
use rayx_core::compiler::compile_beamline;
use rayx_core::core::geometry::{Mat3, Vec3};
use rayx_core::core::numeric::{to_radians, to_wavelength_nm, PI};
use rayx_core::materials::{MaterialTables, REFLECTIVE, VACUUM};
use rayx_core::physics::grating::{diffracted_beta, vls_line_density};
use rayx_core::shader::{Cutout, EventType, Ray, SlopeError};
use rayx_core::tracer::cpu::CpuTracer;
use rayx_core::tracer::{PushConstants, TraceConfig, Tracer};

use num_complex::Complex64;

/// `orientation` that puts a `PlaneXY` surface at grazing angle
/// `grazing_rad` to a ray arriving along `+z`, together with the
/// `position` that places its local origin at world `(0, 0, distance)`.
/// Derived from `compile_transforms`'s `in_transform = [r | -position]`
/// with `r = orientation`: a ray along `(0, 0, 1)` starting at the
/// world origin only reaches local `y = 0` where `p_local = r·p_world -
/// position` vanishes in `y`, which happens at `t = distance` exactly
/// when `position = r·(0, 0, distance)`.
fn grazing_element(grazing_deg: f64, distance: f64) -> (Mat3, Vec3) {
    let r = Mat3::rotation_x(PI + to_radians(grazing_deg));
    let position = r.mul_vec(Vec3::new(0.0, 0.0, distance));
    (r, position)
}

/// `orientation`/`position` for an element struck head-on by a ray
/// travelling along `+z` — a slit or image plane standing perpendicular
/// to the beam, the `grazing_deg = 90` boundary of [`grazing_element`]'s
/// construction approached from the other rotation sense (`-pi/2`
/// rather than `pi/2`), which is what keeps the resulting collision
/// distance positive.
fn head_on_element(distance: f64) -> (Mat3, Vec3) {
    let r = Mat3::rotation_x(-PI / 2.0);
    let position = r.mul_vec(Vec3::new(0.0, 0.0, distance));
    (r, position)
}

fn flat_ray(path_id: i32, position: Vec3, direction: Vec3, energy: f64) -> Ray {
    Ray {
        path_id,
        path_event_id: 0,
        position,
        direction: direction.normalized(),
        field: [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0)],
        optical_path_length: 0.0,
        energy,
        order: 0,
        object_id: -1,
        source_id: 0,
        event_type: EventType::Emitted,
        rand_counter: 0,
    }
}

fn element(orientation: Mat3, position: Vec3, behaviour: BehaviourDesign, cutout: Cutout, material: i32) -> ElementDesign {
    ElementDesign {
        position,
        orientation,
        misalignment: Misalignment::default(),
        curvature: Curvature::PlaneXY,
        behaviour,
        cutout,
        slope_error: SlopeError::default(),
        azimuthal_angle: 0.0,
        material,
        xy_design_plane: false,
        monte_carlo_reflectance: false,
    }
}

/// A 1-degree grazing mirror reflects a ray along `+z` into outgoing
/// direction `(0, sin 2deg, cos 2deg)`, the mirror-reflection
/// double-angle identity, recorded as exactly two events: the hit
/// (pre-bounce direction) and a beyond-horizon tail once nothing else
/// is downstream.
#[test]
fn grazing_mirror_reflects_by_twice_the_grazing_angle() {
    let (orientation, position) = grazing_element(1.0, 1000.0);
    let beamline = Beamline {
        sources: vec![],
        elements: vec![element(orientation, position, BehaviourDesign::Mirror, Cutout::Rect { width: 100.0, length: 100.0 }, REFLECTIVE)],
    };
    let tables = MaterialTables::default();
    let compiled = compile_beamline(&beamline, &tables).unwrap();

    let ray = flat_ray(0, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), 1000.0);
    let pc = PushConstants { max_events: 4, ..Default::default() };
    let out = CpuTracer.trace(&compiled, vec![ray], pc, &tables, &TraceConfig::default()).unwrap();

    let events = &out.paths[0].events;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, EventType::HitElement);
    assert!((events[0].position - Vec3::new(0.0, 0.0, 1000.0)).length() < 1e-8);
    assert_eq!(events[1].event_type, EventType::BeyondHorizon);

    let expected = Vec3::new(0.0, to_radians(2.0).sin(), to_radians(2.0).cos());
    assert!((events[1].direction - expected).length() < 1e-9);
}

/// A slit with a beamstop: a ray through the center is absorbed at the
/// beamstop; rays through the open annulus pass through to an image
/// plane downstream and are absorbed there instead.
#[test]
fn slit_beamstop_blocks_center_and_passes_periphery() {
    let (slit_orientation, slit_position) = head_on_element(100.0);
    let (plane_orientation, plane_position) = head_on_element(200.0);

    let slit = element(
        slit_orientation,
        slit_position,
        BehaviourDesign::Slit { opening: Cutout::Rect { width: 2.0, length: 2.0 }, beamstop: Cutout::Rect { width: 0.5, length: 0.5 } },
        Cutout::Unlimited,
        VACUUM,
    );
    let image_plane = element(plane_orientation, plane_position, BehaviourDesign::ImagePlane, Cutout::Unlimited, VACUUM);

    let beamline = Beamline { sources: vec![], elements: vec![slit, image_plane] };
    let tables = MaterialTables::default();
    let compiled = compile_beamline(&beamline, &tables).unwrap();

    let rays = vec![
        flat_ray(0, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), 500.0),
        flat_ray(1, Vec3::new(0.9, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0), 500.0),
        flat_ray(2, Vec3::new(-0.9, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0), 500.0),
        flat_ray(3, Vec3::new(0.0, 0.9, 0.0), Vec3::new(0.0, 0.0, 1.0), 500.0),
        flat_ray(4, Vec3::new(0.0, -0.9, 0.0), Vec3::new(0.0, 0.0, 1.0), 500.0),
    ];

    let pc = PushConstants { max_events: 8, ..Default::default() };
    let out = CpuTracer.trace(&compiled, rays, pc, &tables, &TraceConfig::default()).unwrap();

    let central = &out.paths[0];
    assert_eq!(central.events.last().unwrap().event_type, EventType::Absorbed);
    assert_eq!(central.events.last().unwrap().object_id, 0);

    for path in &out.paths[1..] {
        let last = path.events.last().unwrap();
        assert_eq!(last.event_type, EventType::Absorbed);
        assert_eq!(last.object_id, 1, "peripheral ray should reach the image plane, not stop at the slit");
    }
}

/// A plane grating's outgoing direction satisfies the grating equation
/// `sin(alpha) - sin(beta) = m * lambda * rho` for order 1, matching
/// what [`diffracted_beta`] predicts standalone for the same inputs.
#[test]
fn plane_grating_first_order_matches_grating_equation() {
    let grazing_deg = 2.0;
    let (orientation, position) = grazing_element(grazing_deg, 500.0);
    let line_density = 1200.0;
    let energy_ev = 500.0;

    let grating = element(
        orientation,
        position,
        BehaviourDesign::Grating { line_density, order: 1.0, vls: [0.0; 6], design_energy_ev: energy_ev },
        Cutout::Unlimited,
        VACUUM,
    );
    let beamline = Beamline { sources: vec![], elements: vec![grating] };
    let tables = MaterialTables::default();
    let compiled = compile_beamline(&beamline, &tables).unwrap();

    let ray = flat_ray(0, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), energy_ev);
    let pc = PushConstants { max_events: 4, ..Default::default() };
    let out = CpuTracer.trace(&compiled, vec![ray], pc, &tables, &TraceConfig::default()).unwrap();

    let outgoing = out.paths[0].events[1].direction;

    // World normal for this construction is (0, -cos(g), sin(g)); see
    // grazing_element's derivation.
    let g = to_radians(grazing_deg);
    let normal = Vec3::new(0.0, -g.cos(), g.sin());
    let beta_actual = outgoing.dot(normal).abs().asin();

    let wavelength_nm = to_wavelength_nm(energy_ev);
    let rho = vls_line_density(line_density, [0.0; 6], 0.0);
    let expected_beta = diffracted_beta(g, wavelength_nm, rho, 1.0).unwrap();

    assert!((beta_actual - expected_beta).abs() < 1e-9);
    assert!((g.sin() - beta_actual.sin() - wavelength_nm * rho).abs() < 1e-9);
}

/// A dipole source's emitted energies are all finite and positive, and
/// cluster around the configured center rather than collapsing to a
/// single value or wandering arbitrarily far from it.
#[test]
fn dipole_source_energy_spectrum_is_centered_and_finite() {
    let cfg = DipoleSourceConfig {
        electron_energy_gev: 1.7,
        bending_radius_m: 4.36,
        energy_center_ev: 500.0,
        energy_spread_ev: 200.0,
        horizontal_divergence: 1.0e-3,
        electron_beam_sigma_vertical_mrad: 0.05,
        source_width: 1.0e-4,
        source_depth: 0.0,
        clockwise: true,
    };
    let rays = generate_rays(&SourceConfig::Dipole(cfg), 2000, 0, 0, 123, Vec3::ZERO, Mat3::IDENTITY);

    let energies: Vec<f64> = rays.iter().map(|r| r.energy).collect();
    assert!(energies.iter().all(|e| e.is_finite() && *e > 0.0));

    let mean: f64 = energies.iter().sum::<f64>() / energies.len() as f64;
    let variance: f64 = energies.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / energies.len() as f64;
    assert!(variance > 0.0, "dipole energies should not all collapse to one value");

    // Loose sanity bound, not a chi-squared fit: the sampled energies
    // should land within a few spreads of the configured center.
    assert!(mean > cfg.energy_center_ev - 3.0 * cfg.energy_spread_ev);
    assert!(mean < cfg.energy_center_ev + 3.0 * cfg.energy_spread_ev);
}

/// Tracing the same beamline in sequential (element-ordered) mode and
/// in nearest-collision mode produces identical event histories when
/// every ray's collisions are already in beamline order — there is no
/// out-of-order hit for the two modes to disagree about.
#[test]
fn sequential_and_nearest_collision_modes_agree_on_monotone_paths() {
    let (mirror_orientation, mirror_position) = grazing_element(3.0, 500.0);
    let (plane_orientation, plane_position) = head_on_element(1500.0);

    let mirror = element(mirror_orientation, mirror_position, BehaviourDesign::Mirror, Cutout::Rect { width: 50.0, length: 50.0 }, REFLECTIVE);
    let image_plane = element(plane_orientation, plane_position, BehaviourDesign::ImagePlane, Cutout::Unlimited, VACUUM);

    let beamline = Beamline { sources: vec![], elements: vec![mirror, image_plane] };
    let tables = MaterialTables::default();
    let compiled = compile_beamline(&beamline, &tables).unwrap();

    let rays: Vec<Ray> = (0..6).map(|i| flat_ray(i, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), 500.0)).collect();

    let pc_nearest = PushConstants { max_events: 8, sequential_mode: false, ..Default::default() };
    let pc_sequential = PushConstants { max_events: 8, sequential_mode: true, ..Default::default() };

    let out_nearest = CpuTracer.trace(&compiled, rays.clone(), pc_nearest, &tables, &TraceConfig::default()).unwrap();
    let out_sequential = CpuTracer.trace(&compiled, rays, pc_sequential, &tables, &TraceConfig::default()).unwrap();

    for (a, b) in out_nearest.paths.iter().zip(out_sequential.paths.iter()) {
        assert_eq!(a.events.len(), b.events.len());
        for (ea, eb) in a.events.iter().zip(b.events.iter()) {
            assert_eq!(ea.event_type, eb.event_type);
            assert_eq!(ea.object_id, eb.object_id);
            assert!((ea.position - eb.position).length() < 1e-9);
            assert!((ea.direction - eb.direction).length() < 1e-9);
        }
    }
}

/// Two traces of the same compiled beamline and the same seeded point
/// source produce byte-for-byte identical event histories: positions,
/// directions, fields, energies, and event counts all match exactly.
#[test]
fn tracing_is_reproducible_with_a_fixed_seed() {
    let (orientation, position) = grazing_element(5.0, 800.0);
    let beamline = Beamline {
        sources: vec![],
        elements: vec![element(orientation, position, BehaviourDesign::Mirror, Cutout::Rect { width: 80.0, length: 80.0 }, REFLECTIVE)],
    };
    let tables = MaterialTables::default();
    let compiled = compile_beamline(&beamline, &tables).unwrap();

    let source_cfg = PointSourceConfig {
        width: Spread::HardEdge(1.0),
        height: Spread::HardEdge(1.0),
        depth: 0.0,
        horizontal_divergence: Spread::Gaussian(1.0e-4),
        vertical_divergence: Spread::Gaussian(1.0e-4),
        energy_ev: 500.0,
        energy_spread_ev: 5.0,
        stokes: [1.0, 0.0, 0.0, 0.0],
    };

    let make_rays = || generate_rays(&SourceConfig::Point(source_cfg), 32, 0, 0, 42, Vec3::ZERO, Mat3::IDENTITY);

    let pc = PushConstants { seed: 42, max_events: 8, ..Default::default() };
    let out1 = CpuTracer.trace(&compiled, make_rays(), pc, &tables, &TraceConfig::default()).unwrap();
    let out2 = CpuTracer.trace(&compiled, make_rays(), pc, &tables, &TraceConfig::default()).unwrap();

    assert_eq!(out1.paths.len(), out2.paths.len());
    for (a, b) in out1.paths.iter().zip(out2.paths.iter()) {
        assert_eq!(a.events.len(), b.events.len());
        for (ea, eb) in a.events.iter().zip(b.events.iter()) {
            assert_eq!(ea.event_type, eb.event_type);
            assert_eq!(ea.position, eb.position);
            assert_eq!(ea.direction, eb.direction);
            assert_eq!(ea.field, eb.field);
            assert_eq!(ea.energy, eb.energy);
        }
    }
}

/// An identity beamline with a point source of zero divergence and
/// extent, traced against a single downstream element, hits that
/// element at exactly the position its on-axis ray would predict.
#[test]
fn zero_divergence_point_source_hits_element_on_axis() {
    let distance = 1234.5;
    let (orientation, position) = head_on_element(distance);
    let beamline = Beamline {
        sources: vec![],
        elements: vec![element(orientation, position, BehaviourDesign::ImagePlane, Cutout::Unlimited, VACUUM)],
    };
    let tables = MaterialTables::default();
    let compiled = compile_beamline(&beamline, &tables).unwrap();

    let ray = flat_ray(0, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), 500.0);
    let pc = PushConstants { max_events: 4, ..Default::default() };
    let out = CpuTracer.trace(&compiled, vec![ray], pc, &tables, &TraceConfig::default()).unwrap();

    let hit = &out.paths[0].events[0];
    assert_eq!(hit.event_type, EventType::HitElement);
    assert!((hit.position - Vec3::new(0.0, 0.0, distance)).length() < 1e-8);
}
