//! The unit of work the tracer operates on.
//!
//! Field list matches `original_source/.../Trace/RayAttrMask.h`'s
//! X-macro exactly (`path_id, path_event_id, position_*, direction_*,
//! electric_field_*, optical_path_length, energy, order, object_id,
//! source_id, event_type, rand_counter`). The ergonomic host-side
//! [`Ray`] and the GPU-uploadable [`GpuRay`] carry the same
//! information; [`GpuRay`] keeps every field a plain `f64`/`u64` (no
//! mixed-width scalars) so the layout matches std430 with zero padding,
//! the same trick the source's legacy `Ray` struct and `Element.h`'s
//! double-typed tags use to stay GLSL-compatible.

use bytemuck::{Pod, Zeroable};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::core::geometry::Vec3;
use crate::core::numeric::Float;
use crate::shader::event::EventType;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub path_id: i32,
    pub path_event_id: i32,
    pub position: Vec3,
    pub direction: Vec3,
    /// Electric field in world coordinates, one complex amplitude per axis.
    pub field: [Complex64; 3],
    pub optical_path_length: Float,
    pub energy: Float,
    pub order: i32,
    pub object_id: i32,
    pub source_id: i32,
    pub event_type: EventType,
    pub rand_counter: u64,
}

impl Ray {
    /// `|direction| = 1` within `eps`; spec.md §8 requires this for
    /// every `Emitted`/`HitElement` ray.
    pub fn direction_is_unit(&self, eps: Float) -> bool {
        (self.direction.length() - 1.0).abs() <= eps
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuRay {
    pub path_id: Float,
    pub path_event_id: Float,
    pub position: [Float; 3],
    pub direction: [Float; 3],
    pub field: [Float; 6],
    pub optical_path_length: Float,
    pub energy: Float,
    pub order: Float,
    pub object_id: Float,
    pub source_id: Float,
    pub event_type: Float,
    pub rand_counter: u64,
}

impl From<Ray> for GpuRay {
    fn from(r: Ray) -> Self {
        GpuRay {
            path_id: r.path_id as Float,
            path_event_id: r.path_event_id as Float,
            position: [r.position.x, r.position.y, r.position.z],
            direction: [r.direction.x, r.direction.y, r.direction.z],
            field: [r.field[0].re, r.field[0].im, r.field[1].re, r.field[1].im, r.field[2].re, r.field[2].im],
            optical_path_length: r.optical_path_length,
            energy: r.energy,
            order: r.order as Float,
            object_id: r.object_id as Float,
            source_id: r.source_id as Float,
            event_type: (r.event_type as u32) as Float,
            rand_counter: r.rand_counter,
        }
    }
}

impl From<GpuRay> for Ray {
    fn from(g: GpuRay) -> Self {
        let event_type = match g.event_type as u32 {
            0 => EventType::Uninitialized,
            1 => EventType::Emitted,
            2 => EventType::HitElement,
            3 => EventType::FatalError,
            4 => EventType::Absorbed,
            5 => EventType::BeyondHorizon,
            _ => EventType::TooManyEvents,
        };
        Ray {
            path_id: g.path_id as i32,
            path_event_id: g.path_event_id as i32,
            position: Vec3::new(g.position[0], g.position[1], g.position[2]),
            direction: Vec3::new(g.direction[0], g.direction[1], g.direction[2]),
            field: [
                Complex64::new(g.field[0], g.field[1]),
                Complex64::new(g.field[2], g.field[3]),
                Complex64::new(g.field[4], g.field[5]),
            ],
            optical_path_length: g.optical_path_length,
            energy: g.energy,
            order: g.order as i32,
            object_id: g.object_id as i32,
            source_id: g.source_id as i32,
            event_type,
            rand_counter: g.rand_counter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ray() -> Ray {
        Ray {
            path_id: 3,
            path_event_id: 1,
            position: Vec3::new(1.0, 2.0, 3.0),
            direction: Vec3::new(0.0, 0.0, 1.0),
            field: [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.5), Complex64::new(0.0, 0.0)],
            optical_path_length: 10.0,
            energy: 500.0,
            order: 1,
            object_id: 2,
            source_id: 0,
            event_type: EventType::HitElement,
            rand_counter: 42,
        }
    }

    #[test]
    fn gpu_roundtrip_preserves_fields() {
        let r = sample_ray();
        let gpu: GpuRay = r.into();
        let back: Ray = gpu.into();
        assert_eq!(r, back);
    }

    #[test]
    fn unit_direction_invariant() {
        let r = sample_ray();
        assert!(r.direction_is_unit(1e-12));
    }
}
