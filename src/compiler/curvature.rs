//! [`Curvature`] -> [`Surface`] compilation.
//!
//! Transliterated from `original_source/.../detail/Compile/Curvature.cpp`'s
//! `toQuadric` overloads, one per [`Curvature`] variant; `PlaneXY`,
//! `Toroid`, and `Cubic` pass straight through as the source's
//! `compileCurvature(QuadraticCurvature|ToroidialCurvature|CubicCurvature)`
//! identity overloads do.

use crate::beamline::{CylinderDirection, FigureRotation, ParabolicKind};
use crate::beamline::Curvature;
use crate::core::numeric::Float;
use crate::shader::surface::QuadricCoeffs;
use crate::shader::Surface;

fn quadric(icurv: i32, a11: Float, a22: Float, a23: Float, a24: Float, a33: Float, a34: Float, a44: Float) -> Surface {
    Surface::Quadric {
        icurv,
        coeffs: QuadricCoeffs { a11, a12: 0.0, a13: 0.0, a14: 0.0, a22, a23, a24, a33, a34, a44 },
    }
}

fn compile_cylinder(direction: CylinderDirection, mut radius: Float, grazing_incidence: Float, entrance_arm_length: Float, exit_arm_length: Float) -> Surface {
    let (a11, a33) = match direction {
        CylinderDirection::LongRadiusR => (0.0, 1.0),
        CylinderDirection::ShortRadiusRho => (1.0, 0.0),
    };
    let mut a24 = -radius;
    let icurv = if a24 > 0.0 { -1 } else { 1 };

    if radius == 0.0 {
        radius = match direction {
            CylinderDirection::LongRadiusR => 2.0 / grazing_incidence.sin() / (1.0 / entrance_arm_length + 1.0 / exit_arm_length),
            CylinderDirection::ShortRadiusRho => {
                if entrance_arm_length == 0.0 || exit_arm_length == 0.0 || grazing_incidence == 0.0 {
                    0.0
                } else {
                    2.0 * grazing_incidence.sin() / (1.0 / entrance_arm_length + 1.0 / exit_arm_length)
                }
            }
        };
        a24 = -radius;
    }

    quadric(icurv, a11, 1.0, 0.0, a24, a33, 0.0, 0.0)
}

fn compile_sphere(radius: Float) -> Surface {
    quadric(1, 1.0, 1.0, 0.0, -radius, 1.0, 0.0, 0.0)
}

fn compile_paraboloid(arm_length: Float, parameter_p: Float, kind: ParabolicKind, grazing_incidence: Float, a11: Float) -> Surface {
    let sign = match kind {
        ParabolicKind::Collimate => 1.0,
        ParabolicKind::Focussing => -1.0,
    };
    let sin1 = (2.0 * grazing_incidence).sin();
    let cos1 = (2.0 * grazing_incidence).cos();
    let y0 = arm_length * sin1;
    let z0 = arm_length * cos1 * sign;

    let a24 = -y0;
    let a34 = -parameter_p;
    let a44 = y0.powi(2) - 2.0 * parameter_p * z0 - parameter_p.powi(2);

    quadric(1, a11, 1.0, 0.0, a24, 0.0, a34, a44)
}

fn compile_cone(grazing_incidence: Float, entrance_arm_length: Float, exit_arm_length: Float, total_length: Float) -> Surface {
    let ra = entrance_arm_length;
    let rb = exit_arm_length;
    let zl2 = (total_length / 2.0).powi(2);
    let sth = grazing_incidence.sin();
    let cth = grazing_incidence.cos();

    let rmax1 = (zl2 + ra.powi(2) - total_length * ra * cth).sqrt();
    let rmax2 = (zl2 + rb.powi(2) + total_length * rb * cth).sqrt();
    let rmin1 = (zl2 + ra.powi(2) + total_length * ra * cth).sqrt();
    let rmin2 = (zl2 + rb.powi(2) - total_length * rb * cth).sqrt();
    let thmax = (ra * sth / rmax1).asin();
    let thmin = (ra * sth / rmin1).asin();
    let sthmax = thmax.sin();
    let sthmin = thmin.sin();

    let upstream_radius = 2.0 * sthmax / (1.0 / rmax1 + 1.0 / rmax2);
    let downstream_radius = 2.0 * sthmin / (1.0 / rmin1 + 1.0 / rmin2);

    let cm = ((upstream_radius - downstream_radius) / total_length).powi(2);

    let a11 = 1.0 - cm;
    let a22 = 1.0 - 2.0 * cm;
    let a23 = (cm - cm * cm).max(0.0).sqrt();
    let icurv = if a22 > 0.0 { 1 } else { 0 };

    let a24 = if a23 != 0.0 { -a23 * (upstream_radius / cm.sqrt() - total_length / 2.0) } else { -upstream_radius };

    quadric(icurv, a11, a22, a23, a24, 0.0, 0.0, 0.0)
}

#[allow(clippy::too_many_arguments)]
fn compile_ellipsoid(
    entrance_arm_length: Float,
    exit_arm_length: Float,
    short_half_axis_b: Float,
    long_half_axis_a: Float,
    design_grazing_incidence: Float,
    figure_rotation: FigureRotation,
    a11_design: Float,
) -> Surface {
    let y0 = if long_half_axis_a > short_half_axis_b {
        if design_grazing_incidence > 0.0 {
            -short_half_axis_b.powi(2) / design_grazing_incidence.tan()
                / (long_half_axis_a.powi(2) - short_half_axis_b.powi(2)).sqrt()
        } else {
            -short_half_axis_b
        }
    } else {
        0.0
    };

    let z0 = if entrance_arm_length > exit_arm_length && -short_half_axis_b < y0 {
        long_half_axis_a * (short_half_axis_b.powi(2) - y0.powi(2)).sqrt() / short_half_axis_b
    } else if entrance_arm_length < exit_arm_length && -short_half_axis_b < y0 {
        -long_half_axis_a * (short_half_axis_b.powi(2) - y0.powi(2)).sqrt() / short_half_axis_b
    } else {
        0.0
    };

    let mt = if long_half_axis_a > 0.0 && y0 < 0.0 { (short_half_axis_b / long_half_axis_a).powi(2) * z0 / y0 } else { 0.0 };

    let a11 = match figure_rotation {
        FigureRotation::Yes => 1.0,
        FigureRotation::Plane => 0.0,
        FigureRotation::No => a11_design,
    };

    let tangent_angle = mt.atan();
    let (ts, tc) = tangent_angle.sin_cos();

    let a22 = tc.powi(2) + (short_half_axis_b * ts / long_half_axis_a).powi(2);
    let a23 = (short_half_axis_b.powi(2) - long_half_axis_a.powi(2)) * tc * ts / long_half_axis_a.powi(2);
    let a24 = (short_half_axis_b / long_half_axis_a).powi(2) * z0 * ts + y0 * tc;
    let a33 = ts.powi(2) + (short_half_axis_b * tc / long_half_axis_a).powi(2);
    let a34 = (short_half_axis_b / long_half_axis_a).powi(2) * z0 * tc - y0 * ts;
    let a44 = -short_half_axis_b.powi(2) + y0.powi(2) + (z0 * short_half_axis_b / long_half_axis_a).powi(2);

    quadric(1, a11, a22, a23, a24, a33, a34, a44)
}

/// Resolves a design-time [`Curvature`] into a tracer-ready [`Surface`].
pub fn compile_curvature(curvature: &Curvature) -> Surface {
    match *curvature {
        Curvature::PlaneXY => Surface::PlaneXY,
        Curvature::Sphere { radius } => compile_sphere(radius),
        Curvature::Cylinder { direction, radius, grazing_incidence, entrance_arm_length, exit_arm_length } => {
            compile_cylinder(direction, radius, grazing_incidence, entrance_arm_length, exit_arm_length)
        }
        Curvature::Paraboloid { arm_length, parameter_p, kind, grazing_incidence, a11 } => {
            compile_paraboloid(arm_length, parameter_p, kind, grazing_incidence, a11)
        }
        Curvature::Cone { grazing_incidence, entrance_arm_length, exit_arm_length, total_length } => {
            compile_cone(grazing_incidence, entrance_arm_length, exit_arm_length, total_length)
        }
        Curvature::Ellipsoid {
            entrance_arm_length,
            exit_arm_length,
            short_half_axis_b,
            long_half_axis_a,
            design_grazing_incidence,
            figure_rotation,
            a11,
        } => compile_ellipsoid(
            entrance_arm_length,
            exit_arm_length,
            short_half_axis_b,
            long_half_axis_a,
            design_grazing_incidence,
            figure_rotation,
            a11,
        ),
        Curvature::Toroid { long_radius, short_radius, concave } => Surface::Toroid { long_radius, short_radius, concave },
        Curvature::Cubic { coeffs, cubic } => Surface::Cubic { coeffs, cubic },
    }
}
