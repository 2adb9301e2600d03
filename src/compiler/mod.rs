//! Translates a declarative [`crate::beamline::Beamline`] into the
//! flat, shader-ready [`CompiledElement`] list the tracer consumes.
//!
//! Non-trivial geometry (cylinder radius from the focusing condition,
//! ellipsoid half-axes, grating alpha/beta feasibility) is resolved
//! here rather than at trace time, per spec.md §2/§4.2; the per-ray
//! grating/RZP diffraction angle itself is still solved per-ray by
//! [`crate::physics::grating`] since it depends on each ray's energy.

pub mod curvature;
pub mod transform;

use thiserror::Error;

use crate::beamline::{BehaviourDesign, Beamline, ElementDesign};
use crate::core::numeric::{to_radians, to_wavelength_nm};
use crate::materials::{MaterialTables, REFLECTIVE, VACUUM};
use crate::physics::grating::{diffracted_beta, vls_line_density};
use crate::shader::{Behaviour, CompiledElement};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("element {index}: material id {material} has no loaded optical-constant table")]
    UnknownMaterial { index: usize, material: i32 },
    #[error("element {index}: grating mount with order {order} and the given line density cannot diffract at any grazing angle")]
    InfeasibleGratingMount { index: usize, order: f64 },
    #[error("element {index}: compiled surface has a non-finite coefficient (degenerate arm-length/angle formula)")]
    NonFiniteSurface { index: usize },
}

/// Grazing angle used for the grating mount's compile-time feasibility
/// check; the ray's actual angle of incidence depends on its direction
/// and is resolved per-ray at trace time, so this is a sanity check
/// only (a mount that cannot diffract at a representative steep
/// incidence almost certainly cannot diffract at all), documented in
/// DESIGN.md.
const GRATING_SANITY_GRAZING_ANGLE_DEG: f64 = 88.0;

fn compile_behaviour(design: &BehaviourDesign, index: usize) -> Result<Behaviour, CompileError> {
    match *design {
        BehaviourDesign::Mirror => Ok(Behaviour::Mirror),
        BehaviourDesign::Grating { line_density, order, vls, design_energy_ev } => {
            let wavelength_nm = to_wavelength_nm(design_energy_ev);
            let rho = vls_line_density(line_density, vls, 0.0);
            let alpha = to_radians(GRATING_SANITY_GRAZING_ANGLE_DEG);
            if diffracted_beta(alpha, wavelength_nm, rho, order).is_none() {
                return Err(CompileError::InfeasibleGratingMount { index, order });
            }
            Ok(Behaviour::Grating { vls, line_density, order })
        }
        BehaviourDesign::Slit { opening, beamstop } => Ok(Behaviour::Slit { opening, beamstop }),
        BehaviourDesign::Rzp(params) => Ok(Behaviour::Rzp(params)),
        BehaviourDesign::ImagePlane => Ok(Behaviour::ImagePlane),
    }
}

fn compile_element(design: &ElementDesign, tables: &MaterialTables, index: usize) -> Result<CompiledElement, CompileError> {
    if design.material != VACUUM && design.material != REFLECTIVE && !tables.elements.contains(&design.material) {
        return Err(CompileError::UnknownMaterial { index, material: design.material });
    }

    let surface = curvature::compile_curvature(&design.curvature);
    if !surface.is_finite() {
        return Err(CompileError::NonFiniteSurface { index });
    }
    let behaviour = compile_behaviour(&design.behaviour, index)?;
    let (in_transform, out_transform) =
        transform::compile_transforms(design.position, design.orientation, design.misalignment, design.xy_design_plane);

    tracing::debug!(index, material = design.material, "compiled element");

    Ok(CompiledElement {
        in_transform,
        out_transform,
        behaviour,
        surface,
        cutout: design.cutout,
        slope_error: design.slope_error,
        azimuthal_angle: design.azimuthal_angle,
        material: design.material,
        monte_carlo_reflectance: design.monte_carlo_reflectance,
    })
}

/// Compiles every element of `beamline` in order; element ids in the
/// tracer's output are the index into the returned `Vec`, matching
/// `Beamline::elements`'s own indexing per spec.md §3.
pub fn compile_beamline(beamline: &Beamline, tables: &MaterialTables) -> Result<Vec<CompiledElement>, CompileError> {
    let compiled: Result<Vec<CompiledElement>, CompileError> = beamline
        .elements
        .iter()
        .enumerate()
        .map(|(index, design)| compile_element(design, tables, index))
        .collect();
    let compiled = compiled?;
    tracing::info!(elements = compiled.len(), "beamline compiled");
    Ok(compiled)
}
