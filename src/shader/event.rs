//! Per-ray lifecycle state.
//!
//! Values match `original_source/.../Trace/EventType.h` exactly so a
//! CPU-recorded trace and a GPU-recorded trace tag rays identically.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Uninitialized = 0,
    Emitted = 1,
    HitElement = 2,
    FatalError = 3,
    Absorbed = 4,
    BeyondHorizon = 5,
    TooManyEvents = 6,
}

impl EventType {
    pub fn is_terminated(self) -> bool {
        !matches!(self, EventType::Emitted | EventType::HitElement)
    }

    fn from_u32(v: u32) -> Self {
        match v {
            0 => EventType::Uninitialized,
            1 => EventType::Emitted,
            2 => EventType::HitElement,
            3 => EventType::FatalError,
            4 => EventType::Absorbed,
            5 => EventType::BeyondHorizon,
            6 => EventType::TooManyEvents,
            _ => EventType::FatalError,
        }
    }
}

/// `EventType` stored as a plain `u32` in GPU buffers; `bytemuck`
/// cannot derive `Pod` for a non-exhaustive-by-discriminant enum, so
/// the packed representation is this wrapper instead.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct GpuEventType(pub u32);

impl From<EventType> for GpuEventType {
    fn from(e: EventType) -> Self {
        GpuEventType(e as u32)
    }
}

impl From<GpuEventType> for EventType {
    fn from(g: GpuEventType) -> Self {
        EventType::from_u32(g.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminated_predicate() {
        assert!(!EventType::Emitted.is_terminated());
        assert!(!EventType::HitElement.is_terminated());
        assert!(EventType::Absorbed.is_terminated());
        assert!(EventType::BeyondHorizon.is_terminated());
        assert!(EventType::FatalError.is_terminated());
        assert!(EventType::TooManyEvents.is_terminated());
    }

    #[test]
    fn values_match_reference_enum() {
        assert_eq!(EventType::Uninitialized as u32, 0);
        assert_eq!(EventType::Emitted as u32, 1);
        assert_eq!(EventType::HitElement as u32, 2);
        assert_eq!(EventType::FatalError as u32, 3);
        assert_eq!(EventType::Absorbed as u32, 4);
        assert_eq!(EventType::BeyondHorizon as u32, 5);
        assert_eq!(EventType::TooManyEvents as u32, 6);
    }
}
