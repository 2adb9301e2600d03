//! Per-behavior physics kernels shared by every tracer backend.
//!
//! Everything in this module is a plain function of its numeric
//! inputs — no beamline or ray types — so the exact same code runs on
//! the CPU tracer and (mirrored 1:1 in WGSL) on the GPU tracer, per
//! spec.md §2's "single numerical specification" requirement.

pub mod bessel;
pub mod fresnel;
pub mod grating;
pub mod polarization;
pub mod schwinger;
pub mod slope_error;

pub use fresnel::{apply_reflectance, reflectance};
pub use grating::{diffracted_beta, rzp_line_density, vls_line_density};
pub use slope_error::perturb_normal;
