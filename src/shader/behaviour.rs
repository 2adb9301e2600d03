//! What happens to a ray on collision with an element.
//!
//! Grounded in `original_source/.../Shader/Behaviour.h`'s
//! `(type: f64, params: [f64; 16])` tagged union; field offsets below
//! match `serializeGrating`/`serializeSlit`/`serializeRZP` exactly.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::core::numeric::Float;
use crate::shader::cutout::{Cutout, GpuCutout};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RzpParams {
    pub image_type: Float,
    pub rzp_type: Float,
    pub derivation_method: Float,
    pub design_wavelength: Float,
    pub design_order_of_diffraction: Float,
    pub order_of_diffraction: Float,
    pub fresnel_z_offset: Float,
    pub design_sagittal_entrance_arm_length: Float,
    pub design_sagittal_exit_arm_length: Float,
    pub design_meridional_entrance_arm_length: Float,
    pub design_meridional_exit_arm_length: Float,
    pub design_alpha_angle: Float,
    pub design_beta_angle: Float,
    pub additional_order: Float,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Behaviour {
    Mirror,
    Grating { vls: [Float; 6], line_density: Float, order: Float },
    Slit { opening: Cutout, beamstop: Cutout },
    Rzp(RzpParams),
    ImagePlane,
}

const BTYPE_MIRROR: Float = 0.0;
const BTYPE_GRATING: Float = 1.0;
const BTYPE_SLIT: Float = 2.0;
const BTYPE_RZP: Float = 3.0;
const BTYPE_IMAGE_PLANE: Float = 4.0;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuBehaviour {
    pub kind: Float,
    pub params: [Float; 16],
}

impl From<Behaviour> for GpuBehaviour {
    fn from(b: Behaviour) -> Self {
        let mut params = [0.0; 16];
        let kind = match b {
            Behaviour::Mirror => BTYPE_MIRROR,
            Behaviour::Grating { vls, line_density, order } => {
                params[0..6].copy_from_slice(&vls);
                params[6] = line_density;
                params[7] = order;
                BTYPE_GRATING
            }
            Behaviour::Slit { opening, beamstop } => {
                let o: GpuCutout = opening.into();
                let s: GpuCutout = beamstop.into();
                params[0] = o.kind;
                params[1..4].copy_from_slice(&o.params);
                params[4] = s.kind;
                params[5..8].copy_from_slice(&s.params);
                BTYPE_SLIT
            }
            Behaviour::Rzp(r) => {
                params[0] = r.image_type;
                params[1] = r.rzp_type;
                params[2] = r.derivation_method;
                params[3] = r.design_wavelength;
                params[4] = r.design_order_of_diffraction;
                params[5] = r.order_of_diffraction;
                params[6] = r.fresnel_z_offset;
                params[7] = r.design_sagittal_entrance_arm_length;
                params[8] = r.design_sagittal_exit_arm_length;
                params[9] = r.design_meridional_entrance_arm_length;
                params[10] = r.design_meridional_exit_arm_length;
                params[11] = r.design_alpha_angle;
                params[12] = r.design_beta_angle;
                params[13] = r.additional_order;
                BTYPE_RZP
            }
            Behaviour::ImagePlane => BTYPE_IMAGE_PLANE,
        };
        GpuBehaviour { kind, params }
    }
}

impl From<GpuBehaviour> for Behaviour {
    fn from(g: GpuBehaviour) -> Self {
        let p = g.params;
        if g.kind == BTYPE_MIRROR {
            Behaviour::Mirror
        } else if g.kind == BTYPE_GRATING {
            Behaviour::Grating { vls: p[0..6].try_into().unwrap(), line_density: p[6], order: p[7] }
        } else if g.kind == BTYPE_SLIT {
            let opening: Cutout = GpuCutout { kind: p[0], params: [p[1], p[2], p[3]] }.into();
            let beamstop: Cutout = GpuCutout { kind: p[4], params: [p[5], p[6], p[7]] }.into();
            Behaviour::Slit { opening, beamstop }
        } else if g.kind == BTYPE_RZP {
            Behaviour::Rzp(RzpParams {
                image_type: p[0],
                rzp_type: p[1],
                derivation_method: p[2],
                design_wavelength: p[3],
                design_order_of_diffraction: p[4],
                order_of_diffraction: p[5],
                fresnel_z_offset: p[6],
                design_sagittal_entrance_arm_length: p[7],
                design_sagittal_exit_arm_length: p[8],
                design_meridional_entrance_arm_length: p[9],
                design_meridional_exit_arm_length: p[10],
                design_alpha_angle: p[11],
                design_beta_angle: p[12],
                additional_order: p[13],
            })
        } else {
            Behaviour::ImagePlane
        }
    }
}
