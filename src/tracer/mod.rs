//! The tracing engine: turns a compiled beamline and a batch of rays
//! into per-ray event histories, per spec.md §4.4.
//!
//! [`Tracer`] is the single seam between the host and a backend;
//! [`CpuTracer`] (always available) realizes it with `rayon`, and
//! `GpuTracer` (feature `gpu`) realizes it with `wgpu`. Both run the
//! exact same `intersect`/`behave` kernel body — the CPU backend calls
//! it directly per ray, the GPU backend runs its WGSL translation.

pub mod behave;
pub mod cpu;
pub mod intersect;

#[cfg(feature = "gpu")]
pub mod gpu;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use thiserror::Error;

use crate::materials::MaterialTables;
use crate::shader::{CompiledElement, Ray, RayAttrMask};

/// Per-batch scalar block handed to the kernel, per spec.md §4.4/§6.
#[derive(Clone, Copy, Debug)]
pub struct PushConstants {
    /// `path_id` assigned to `rays[0]`; subsequent rays get consecutive ids.
    pub ray_id_start: i32,
    /// Global seed folded into each ray's counter-RNG stream, per spec.md §4.5.
    pub seed: u64,
    /// Event-history capacity per ray; reaching it without terminating
    /// records a final `TooManyEvents` entry, per spec.md §4.4.
    pub max_events: u32,
    /// First event index materialized into the output buffer; earlier
    /// events are still simulated but not recorded.
    pub start_event_id: u32,
    /// Element-ordered tracing (`next_element_id`) vs. globally nearest.
    pub sequential_mode: bool,
    /// Ray attributes written to the event history; narrowing this
    /// shrinks the output buffer without changing the physics.
    pub record_mask: RayAttrMask,
    /// Restricts event recording to hits on this element id; other
    /// elements are still traced (and still affect the ray's physics)
    /// but their `HitElement`/terminal events are not written to the
    /// output, per spec.md §6's `record_element_index`. `None` records
    /// every element.
    pub record_element_index: Option<i32>,
}

impl Default for PushConstants {
    fn default() -> Self {
        PushConstants {
            ray_id_start: 0,
            seed: 0,
            max_events: 64,
            start_event_id: 0,
            sequential_mode: false,
            record_mask: RayAttrMask::ALL,
            record_element_index: None,
        }
    }
}

/// Host-level settings that don't change the kernel's numerics: batch
/// size and a cooperative cancellation flag, per spec.md §5.
#[derive(Clone)]
pub struct TraceConfig {
    /// Caps per-dispatch ray count on both backends, per spec.md §4.4.
    pub max_batch_size: usize,
    /// Checked between batches; does not interrupt in-flight work, per
    /// spec.md §5's "Cancellation/timeout".
    pub cancel: Arc<AtomicBool>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        TraceConfig { max_batch_size: 1 << 16, cancel: Arc::new(AtomicBool::new(false)) }
    }
}

/// One ray's recorded event history, per spec.md's "Event history" data model.
#[derive(Clone, Debug, Default)]
pub struct RayPath {
    pub events: Vec<Ray>,
}

/// The complete result of a `Tracer::trace` call: one [`RayPath`] per
/// input ray, in the same order.
#[derive(Clone, Debug, Default)]
pub struct TraceOutput {
    pub paths: Vec<RayPath>,
}

impl TraceOutput {
    /// Flattens every path's events into a single buffer, in path
    /// order, for writers that don't care about per-ray boundaries.
    pub fn flatten(&self) -> Vec<Ray> {
        self.paths.iter().flat_map(|p| p.events.iter().copied()).collect()
    }
}

/// Failures a backend can hit, surfaced only for device-level problems
/// the kernel itself never produces (the kernel always runs every ray
/// to completion, tagging `FatalError`/`TooManyEvents` in-ray instead
/// of erroring, per spec.md §7/§9).
#[derive(Debug, Error)]
pub enum HostError {
    #[error("no compatible graphics device was found")]
    NoDevice,
    #[error("device lost while dispatching a trace batch: {reason}")]
    DeviceLost { reason: String },
    #[error("failed to map the output buffer for readback: {reason}")]
    BufferMapFailed { reason: String },
}

/// A tracing backend: CPU (`rayon`) or GPU (`wgpu`, feature `gpu`).
/// Implementations always return one [`RayPath`] per input ray, even
/// for rays that terminate immediately or never collide with
/// anything; `Err` is reserved for backend/device failures, never for
/// per-ray physics outcomes.
pub trait Tracer {
    fn trace(
        &self,
        beamline: &[CompiledElement],
        rays: Vec<Ray>,
        push_constants: PushConstants,
        tables: &MaterialTables,
        config: &TraceConfig,
    ) -> Result<TraceOutput, HostError>;
}
