//! `rayon`-backed CPU implementation of [`Tracer`].
//!
//! Runs the main loop of spec.md §4.4 verbatim per ray: a per-ray
//! `rayon` task owns its `Ray` and [`CounterRng`] with no shared
//! mutable state, matching the "one logical thread per ray" model
//! spec.md §5 asks for.

use rayon::prelude::*;

use crate::core::rng::CounterRng;
use crate::materials::MaterialTables;
use crate::shader::{CompiledElement, EventType, Ray};

use super::behave::behave;
use super::intersect::{intersect, Collision};
use super::{HostError, PushConstants, RayPath, TraceConfig, TraceOutput, Tracer};

/// Same-`t` hits within this tolerance are tie-broken by element id,
/// matching spec.md §4.4's tie-break rule.
const TIE_BREAK_EPS: f64 = 1.0e-12;

/// The outcome of a collision search against the whole beamline (or,
/// in sequential mode, against the single next element): a clean hit,
/// a clean miss, or a toroid whose Newton solve never converged, which
/// spec.md §4.4/§7 requires surfacing as `FatalError` rather than
/// silently treating the element as absent.
enum CollisionSearch {
    Hit(usize, Collision),
    Miss,
    Fatal,
}

fn nearest_collision(ray: &Ray, beamline: &[CompiledElement]) -> CollisionSearch {
    let mut best: Option<(usize, Collision)> = None;
    for (id, element) in beamline.iter().enumerate() {
        let collision = match intersect(ray.position, ray.direction, element) {
            Ok(Some(collision)) => collision,
            Ok(None) => continue,
            Err(_) => return CollisionSearch::Fatal,
        };
        best = Some(match best {
            None => (id, collision),
            Some((best_id, best_collision)) => {
                if (collision.t - best_collision.t).abs() <= TIE_BREAK_EPS {
                    if id > best_id {
                        (id, collision)
                    } else {
                        (best_id, best_collision)
                    }
                } else if collision.t < best_collision.t {
                    (id, collision)
                } else {
                    (best_id, best_collision)
                }
            }
        });
    }
    match best {
        Some((id, collision)) => CollisionSearch::Hit(id, collision),
        None => CollisionSearch::Miss,
    }
}

fn sequential_collision(ray: &Ray, beamline: &[CompiledElement]) -> CollisionSearch {
    let target = ray.object_id as usize + 1;
    if target >= beamline.len() {
        return CollisionSearch::Miss;
    }
    match intersect(ray.position, ray.direction, &beamline[target]) {
        Ok(Some(collision)) => CollisionSearch::Hit(target, collision),
        Ok(None) => CollisionSearch::Miss,
        Err(_) => CollisionSearch::Fatal,
    }
}

/// Whether an event hitting `element_id` should be written to the
/// output, per `PushConstants::record_element_index`: other elements
/// are still traced and still affect the ray, they just don't appear
/// in the recorded history.
fn should_record_element(pc: &PushConstants, element_id: i32) -> bool {
    pc.record_element_index.map_or(true, |want| want == element_id)
}

/// Traces a single ray to termination, returning its recorded history.
fn trace_one(mut ray: Ray, beamline: &[CompiledElement], tables: &MaterialTables, pc: &PushConstants) -> RayPath {
    let mut rng = CounterRng::at(pc.seed, ray.path_id as u64, ray.rand_counter);
    let mut path = RayPath::default();
    ray.object_id = -1;

    // `max_events = 0` means the loop body never runs at all: the ray
    // stays `Emitted` and that is the entire recorded history, per
    // spec.md §8 (distinct from reaching the cap after at least one
    // iteration, which instead appends a `TooManyEvents` entry).
    if pc.max_events == 0 {
        path.events.push(ray);
        return path;
    }

    let mut event_idx = 0u32;
    while event_idx < pc.max_events {
        let found = if pc.sequential_mode { sequential_collision(&ray, beamline) } else { nearest_collision(&ray, beamline) };

        let (element_id, collision) = match found {
            CollisionSearch::Hit(id, collision) => (id, collision),
            CollisionSearch::Miss => {
                ray.event_type = EventType::BeyondHorizon;
                if event_idx >= pc.start_event_id {
                    path.events.push(ray);
                }
                return path;
            }
            CollisionSearch::Fatal => {
                ray.event_type = EventType::FatalError;
                if event_idx >= pc.start_event_id {
                    path.events.push(ray);
                }
                return path;
            }
        };

        let prev_position = ray.position;
        ray.object_id = element_id as i32;
        ray.optical_path_length += (collision.point_world - prev_position).length();
        ray.path_event_id = event_idx as i32;
        ray.event_type = EventType::HitElement;
        if event_idx >= pc.start_event_id && should_record_element(pc, element_id as i32) {
            path.events.push(ray);
        }

        behave(&mut ray, &beamline[element_id], &collision, tables, &mut rng);
        ray.rand_counter = rng.counter();

        let sequential_done = pc.sequential_mode && element_id + 1 == beamline.len();
        if ray.event_type.is_terminated() || sequential_done {
            if sequential_done && !ray.event_type.is_terminated() {
                ray.event_type = EventType::Absorbed;
            }
            if event_idx >= pc.start_event_id && should_record_element(pc, element_id as i32) {
                path.events.push(ray);
            }
            return path;
        }

        event_idx += 1;
    }

    ray.event_type = EventType::TooManyEvents;
    path.events.push(ray);
    path
}

/// CPU tracer backend: data-parallel over rays via `rayon`, per
/// spec.md §4.4/§5. Never errors — `HostError` exists only for the
/// GPU backend's device failures.
pub struct CpuTracer;

impl Tracer for CpuTracer {
    fn trace(
        &self,
        beamline: &[CompiledElement],
        rays: Vec<Ray>,
        push_constants: PushConstants,
        tables: &MaterialTables,
        config: &TraceConfig,
    ) -> Result<TraceOutput, HostError> {
        let mut paths = Vec::with_capacity(rays.len());
        for batch in rays.chunks(config.max_batch_size) {
            if config.cancel.load(std::sync::atomic::Ordering::Relaxed) {
                break;
            }
            let batch_paths: Vec<RayPath> = batch.par_iter().map(|ray| trace_one(*ray, beamline, tables, &push_constants)).collect();
            paths.extend(batch_paths);
        }
        Ok(TraceOutput { paths })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::{Mat4, Vec3};
    use crate::materials::VACUUM;
    use crate::shader::{Behaviour, Cutout, SlopeError, Surface};
    use num_complex::Complex64;

    fn mirror_then_image_plane() -> Vec<CompiledElement> {
        let mirror = CompiledElement {
            in_transform: Mat4::IDENTITY,
            out_transform: Mat4::IDENTITY,
            behaviour: Behaviour::Mirror,
            surface: Surface::PlaneXY,
            cutout: Cutout::Unlimited,
            slope_error: SlopeError::default(),
            azimuthal_angle: 0.0,
            material: VACUUM,
            monte_carlo_reflectance: false,
        };
        let image_plane = CompiledElement {
            in_transform: Mat4::translation(Vec3::new(0.0, -10.0, 0.0)),
            out_transform: Mat4::translation(Vec3::new(0.0, 10.0, 0.0)),
            behaviour: Behaviour::ImagePlane,
            surface: Surface::PlaneXY,
            cutout: Cutout::Unlimited,
            slope_error: SlopeError::default(),
            azimuthal_angle: 0.0,
            material: VACUUM,
            monte_carlo_reflectance: false,
        };
        vec![mirror, image_plane]
    }

    fn downward_ray(path_id: i32) -> Ray {
        Ray {
            path_id,
            path_event_id: 0,
            position: Vec3::new(0.0, 5.0, 0.0),
            direction: Vec3::new(0.0, -1.0, 0.1).normalized(),
            field: [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0)],
            optical_path_length: 0.0,
            energy: 500.0,
            order: 0,
            object_id: -1,
            source_id: 0,
            event_type: EventType::Emitted,
            rand_counter: 0,
        }
    }

    #[test]
    fn ray_bounces_off_mirror_onto_image_plane() {
        let beamline = mirror_then_image_plane();
        let tables = MaterialTables::default();
        let tracer = CpuTracer;
        let pc = PushConstants { max_events: 8, ..Default::default() };
        let out = tracer.trace(&beamline, vec![downward_ray(0)], pc, &tables, &TraceConfig::default()).unwrap();
        assert_eq!(out.paths.len(), 1);
        let events: Vec<EventType> = out.paths[0].events.iter().map(|r| r.event_type).collect();
        assert_eq!(events, vec![EventType::HitElement, EventType::HitElement, EventType::Absorbed]);
    }

    #[test]
    fn beyond_horizon_when_nothing_is_hit() {
        let tables = MaterialTables::default();
        let tracer = CpuTracer;
        let pc = PushConstants { max_events: 4, ..Default::default() };
        let mut ray = downward_ray(0);
        ray.direction = Vec3::new(1.0, 0.0, 0.0);
        let out = tracer.trace(&[], vec![ray], pc, &tables, &TraceConfig::default()).unwrap();
        assert_eq!(out.paths[0].events.last().unwrap().event_type, EventType::BeyondHorizon);
    }

    #[test]
    fn max_events_zero_only_emits() {
        let beamline = mirror_then_image_plane();
        let tables = MaterialTables::default();
        let tracer = CpuTracer;
        let pc = PushConstants { max_events: 0, ..Default::default() };
        let out = tracer.trace(&beamline, vec![downward_ray(0)], pc, &tables, &TraceConfig::default()).unwrap();
        assert_eq!(out.paths[0].events.len(), 1);
        assert_eq!(out.paths[0].events[0].event_type, EventType::Emitted);
    }

    #[test]
    fn record_element_index_filters_other_elements_events() {
        let beamline = mirror_then_image_plane();
        let tables = MaterialTables::default();
        let tracer = CpuTracer;
        let pc = PushConstants { max_events: 8, record_element_index: Some(1), ..Default::default() };
        let out = tracer.trace(&beamline, vec![downward_ray(0)], pc, &tables, &TraceConfig::default()).unwrap();
        // The mirror's HitElement (element 0) is suppressed; only the
        // image plane's (element 1) hit-and-absorb pair is recorded.
        let events: Vec<EventType> = out.paths[0].events.iter().map(|r| r.event_type).collect();
        assert_eq!(events, vec![EventType::HitElement, EventType::Absorbed]);
        assert!(out.paths[0].events.iter().all(|r| r.object_id == 1));
    }

    #[test]
    fn reproducible_with_fixed_seed() {
        let beamline = mirror_then_image_plane();
        let tables = MaterialTables::default();
        let tracer = CpuTracer;
        let pc = PushConstants { seed: 42, max_events: 8, ..Default::default() };
        let rays: Vec<Ray> = (0..16).map(downward_ray).collect();
        let out1 = tracer.trace(&beamline, rays.clone(), pc, &tables, &TraceConfig::default()).unwrap();
        let out2 = tracer.trace(&beamline, rays, pc, &tables, &TraceConfig::default()).unwrap();
        for (a, b) in out1.paths.iter().zip(out2.paths.iter()) {
            assert_eq!(a.events.len(), b.events.len());
            for (ea, eb) in a.events.iter().zip(b.events.iter()) {
                assert_eq!(ea.position, eb.position);
                assert_eq!(ea.event_type, eb.event_type);
            }
        }
    }
}
