//! The compiled, shader-portable optical model.
//!
//! The types in this module mirror `original_source/.../Shader/*.h`:
//! the compiler (see [`crate::compiler`]) turns a [`crate::beamline`]
//! description into a flat list of [`CompiledElement`]s, and the
//! tracer (see [`crate::tracer`]) only ever looks at this module and
//! [`attr_mask`]/[`ray`].

pub mod attr_mask;
pub mod behaviour;
pub mod cutout;
pub mod event;
pub mod ray;
pub mod surface;

pub use attr_mask::RayAttrMask;
pub use behaviour::{Behaviour, GpuBehaviour, RzpParams};
pub use cutout::{Cutout, GpuCutout};
pub use event::{EventType, GpuEventType};
pub use ray::{GpuRay, Ray};
pub use surface::{GpuSurface, QuadricCoeffs, Surface};

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::core::geometry::Mat4;
use crate::core::numeric::Float;

/// Per-element random perturbation of the local surface normal.
///
/// Field order and names (`sag`/`mer` aliasing `slopeErrorX`/`Z`) match
/// `Shader/Element.h`'s `SlopeError`. The thermal-distortion and
/// cylindrical-bowing fields are carried but unused by
/// [`crate::physics::slope_error`], same as in the source: no element
/// in this crate's beamline model ever sets them to a nonzero value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SlopeError {
    pub sag: Float,
    pub mer: Float,
    pub thermal_distortion_amp: Float,
    pub thermal_distortion_sigma_x: Float,
    pub thermal_distortion_sigma_z: Float,
    pub cylindrical_bowing_amp: Float,
    pub cylindrical_bowing_radius: Float,
}

/// A single beamline element after compilation: everything the tracer
/// needs to intersect a ray with it and apply its behaviour, with no
/// further reference to how it was designed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompiledElement {
    /// World coordinates -> this element's local coordinates.
    pub in_transform: Mat4,
    /// This element's local coordinates -> world coordinates; the
    /// inverse of `in_transform`.
    pub out_transform: Mat4,
    pub behaviour: Behaviour,
    pub surface: Surface,
    pub cutout: Cutout,
    pub slope_error: SlopeError,
    pub azimuthal_angle: Float,
    /// A periodic-table atomic number, or [`crate::materials::VACUUM`] /
    /// [`crate::materials::REFLECTIVE`].
    pub material: i32,
    /// `true` selects Monte-Carlo reflectance (stochastic absorb with
    /// probability `1 - R`) over deterministic field attenuation for
    /// this element's Fresnel step, per spec.md §4.4.
    pub monte_carlo_reflectance: bool,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuSlopeError {
    pub sag: Float,
    pub mer: Float,
    pub thermal_distortion_amp: Float,
    pub thermal_distortion_sigma_x: Float,
    pub thermal_distortion_sigma_z: Float,
    pub cylindrical_bowing_amp: Float,
    pub cylindrical_bowing_radius: Float,
    /// pads the struct to a multiple of 8 `Float`s, mirroring
    /// `Element::m_padding` keeping `sizeof(Element)` a multiple of
    /// `sizeof(dmat4)` for std430 compatibility.
    pub _padding: Float,
}

impl From<SlopeError> for GpuSlopeError {
    fn from(s: SlopeError) -> Self {
        GpuSlopeError {
            sag: s.sag,
            mer: s.mer,
            thermal_distortion_amp: s.thermal_distortion_amp,
            thermal_distortion_sigma_x: s.thermal_distortion_sigma_x,
            thermal_distortion_sigma_z: s.thermal_distortion_sigma_z,
            cylindrical_bowing_amp: s.cylindrical_bowing_amp,
            cylindrical_bowing_radius: s.cylindrical_bowing_radius,
            _padding: 0.0,
        }
    }
}

impl From<GpuSlopeError> for SlopeError {
    fn from(g: GpuSlopeError) -> Self {
        SlopeError {
            sag: g.sag,
            mer: g.mer,
            thermal_distortion_amp: g.thermal_distortion_amp,
            thermal_distortion_sigma_x: g.thermal_distortion_sigma_x,
            thermal_distortion_sigma_z: g.thermal_distortion_sigma_z,
            cylindrical_bowing_amp: g.cylindrical_bowing_amp,
            cylindrical_bowing_radius: g.cylindrical_bowing_radius,
        }
    }
}

/// Flat std430-compatible layout for a [`CompiledElement`], matching
/// `Shader/Element.h` field order: both `dmat4`s first, then the
/// tagged unions, then the scalar trailer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuElement {
    pub in_transform: [[Float; 4]; 4],
    pub out_transform: [[Float; 4]; 4],
    pub behaviour: GpuBehaviour,
    pub surface: GpuSurface,
    pub cutout: GpuCutout,
    pub slope_error: GpuSlopeError,
    pub azimuthal_angle: Float,
    pub material: Float,
}

impl From<CompiledElement> for GpuElement {
    fn from(e: CompiledElement) -> Self {
        GpuElement {
            in_transform: e.in_transform.0,
            out_transform: e.out_transform.0,
            behaviour: e.behaviour.into(),
            surface: e.surface.into(),
            cutout: e.cutout.into(),
            slope_error: e.slope_error.into(),
            azimuthal_angle: e.azimuthal_angle,
            material: e.material as Float,
        }
    }
}

impl From<GpuElement> for CompiledElement {
    fn from(g: GpuElement) -> Self {
        CompiledElement {
            in_transform: Mat4(g.in_transform),
            out_transform: Mat4(g.out_transform),
            behaviour: g.behaviour.into(),
            surface: g.surface.into(),
            cutout: g.cutout.into(),
            slope_error: g.slope_error.into(),
            azimuthal_angle: g.azimuthal_angle,
            material: g.material as i32,
        }
    }
}
