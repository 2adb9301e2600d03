//! The declarative, user-facing beamline description: the compiler's
//! input. Everything here is expressed in the units a beamline
//! designer would actually type (degrees, millimeters, arm lengths in
//! meters) rather than the tracer's flat radian/coefficient form —
//! [`crate::compiler`] does that translation.
//!
//! Grounded in the shape of `original_source/.../Beamline/Types.h` and
//! the per-object constructors under `Beamline/Objects/*.cpp`: one
//! struct per element kind there becomes one [`Curvature`] /
//! [`BehaviourDesign`] variant here, since spec.md §9 asks for a
//! tagged union in place of the source's class hierarchy.

pub mod source;

pub use source::SourceConfig;

use crate::core::numeric::Float;
use crate::shader::Cutout;

/// Which axis a cylinder's curvature follows, per spec.md §4.2 and
/// `original_source/.../detail/Compile/Curvature.cpp`'s
/// `CylinderDirection`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CylinderDirection {
    LongRadiusR,
    ShortRadiusRho,
}

/// Whether a paraboloid's design arm is the focusing or collimating side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParabolicKind {
    Focussing,
    Collimate,
}

/// Whether an ellipsoid's figure-rotation parameter is taken literally
/// or forced to a rotationally symmetric / flat (`a11`) limit, per
/// `EllipticalCurvature`'s `figureRotation`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FigureRotation {
    Yes,
    No,
    Plane,
}

/// User-facing curvature description, resolved by [`crate::compiler`]
/// into a [`crate::shader::Surface`]. Mirrors
/// `detail::Compile::Curvature.h`'s variant set exactly (one struct per
/// `compileCurvature` overload).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Curvature {
    PlaneXY,
    Sphere {
        radius: Float,
    },
    Cylinder {
        direction: CylinderDirection,
        /// 0.0 means "derive from the focusing condition below".
        radius: Float,
        grazing_incidence: Float,
        entrance_arm_length: Float,
        exit_arm_length: Float,
    },
    Paraboloid {
        arm_length: Float,
        parameter_p: Float,
        kind: ParabolicKind,
        grazing_incidence: Float,
        a11: Float,
    },
    Cone {
        grazing_incidence: Float,
        entrance_arm_length: Float,
        exit_arm_length: Float,
        total_length: Float,
    },
    Ellipsoid {
        entrance_arm_length: Float,
        exit_arm_length: Float,
        short_half_axis_b: Float,
        long_half_axis_a: Float,
        design_grazing_incidence: Float,
        figure_rotation: FigureRotation,
        a11: Float,
    },
    Toroid {
        long_radius: Float,
        short_radius: Float,
        concave: bool,
    },
    Cubic {
        coeffs: crate::shader::surface::QuadricCoeffs,
        cubic: [Float; 4],
    },
}

/// The six legacy VLS-mount misalignment parameters, composed as
/// translation then x/y/z rotation per spec.md §4.2.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Misalignment {
    pub dx: Float,
    pub dy: Float,
    pub dz: Float,
    pub dpsi: Float,
    pub dphi: Float,
    pub dchi: Float,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BehaviourDesign {
    Mirror,
    Grating { line_density: Float, order: Float, vls: [Float; 6], design_energy_ev: Float },
    Slit { opening: Cutout, beamstop: Cutout },
    Rzp(crate::shader::behaviour::RzpParams),
    ImagePlane,
}

/// A beamline element before compilation: world placement, curvature,
/// behavior, cutout, and ambient fields (slope error, azimuth,
/// material) exactly as spec.md §3/§4.2 describes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementDesign {
    pub position: crate::core::geometry::Vec3,
    pub orientation: crate::core::geometry::Mat3,
    pub misalignment: Misalignment,
    pub curvature: Curvature,
    pub behaviour: BehaviourDesign,
    pub cutout: Cutout,
    pub slope_error: crate::shader::SlopeError,
    pub azimuthal_angle: Float,
    pub material: i32,
    /// `true` for elements whose design plane swaps Y and Z before
    /// applying `in_transform`, per spec.md §4.2's "optionally swap
    /// Y<->Z for XY-design-plane elements".
    pub xy_design_plane: bool,
    /// Selects Monte-Carlo reflectance for this element's Fresnel
    /// attenuation, per spec.md §4.4's Mirror behavior: `false` (the
    /// default) scales the field deterministically by `sqrt(R)` and
    /// every ray survives; `true` draws one uniform sample per hit and
    /// absorbs the ray outright with probability `1 - R`.
    pub monte_carlo_reflectance: bool,
}

/// An ordered sequence of sources followed by an ordered sequence of
/// elements, per spec.md §3. Element ids are stable and equal to
/// their index in `elements`.
#[derive(Clone, Debug, Default)]
pub struct Beamline {
    pub sources: Vec<SourceConfig>,
    pub elements: Vec<ElementDesign>,
}

impl Beamline {
    pub fn atomic_numbers(&self) -> Vec<i32> {
        let mut zs: Vec<i32> = self
            .elements
            .iter()
            .map(|e| e.material)
            .filter(|&m| m != crate::materials::VACUUM && m != crate::materials::REFLECTIVE)
            .collect();
        zs.sort_unstable();
        zs.dedup();
        zs
    }
}
