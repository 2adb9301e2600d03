//! Schwinger synchrotron-radiation spectrum: the universal flux
//! function of a bending-magnet source, its log-log interpolation
//! table, and the Stokes-vector polarization integral built on top of
//! it. Grounded in `original_source/.../DipoleSource.cpp`
//! (`schwinger`, `getInterpolation`, `getStokesSyn`, `dipoleFold`).

use crate::core::numeric::{constants, Float, PI};
use crate::physics::bessel::bessel_k;
use crate::physics::polarization::Stokes;

/// `x` values of the universal function table (`Y0`, dimensionless).
pub const SCHWINGER_X: [Float; 59] = [
    1.0e-4, 1.0e-3, 2.0e-3, 4.0e-3, 6.0e-3, 8.0e-3, 1.0e-2, 2.0e-2, 3.0e-2, 4.0e-2, 5.0e-2, 6.0e-2, 7.0e-2, 8.0e-2, 9.0e-2, 1.0e-1, 0.15, 0.2,
    0.25, 0.3, 0.35, 0.4, 0.45, 0.5, 0.55, 0.6, 0.65, 0.7, 0.75, 0.8, 0.85, 0.9, 1.0, 1.25, 1.5, 1.75, 2.0, 2.25, 2.5, 2.75, 3.0, 3.25, 3.5, 3.75,
    4.0, 4.25, 4.5, 4.75, 5.0, 5.5, 6.0, 6.5, 7.0, 7.5, 8.0, 8.5, 9.0, 9.5, 10.0,
];

/// `y` values of the universal function table, paired with [`SCHWINGER_X`].
pub const SCHWINGER_Y: [Float; 59] = [
    973.0, 213.6, 133.6, 83.49, 63.29, 51.92, 44.5, 27.36, 20.45, 16.57, 14.03, 12.22, 10.85, 9.777, 8.905, 8.182, 5.832, 4.517, 3.663, 3.059,
    2.607, 2.255, 1.973, 1.742, 1.549, 1.386, 1.246, 1.126, 1.02, 9.28e-1, 8.465e-1, 7.74e-1, 6.514e-1, 4.359e-1, 3.004e-1, 2.113e-1, 1.508e-1,
    1.089e-1, 7.926e-2, 5.811e-2, 4.286e-2, 3.175e-2, 2.362e-2, 1.764e-2, 1.321e-2, 9.915e-3, 7.461e-3, 5.626e-3, 4.25e-3, 2.436e-3, 1.404e-3,
    8.131e-4, 4.842e-4, 2.755e-4, 1.611e-4, 9.439e-5, 5.543e-5, 3.262e-5, 1.922e-5,
];

/// The universal table, log-log transformed once (`x = ln(X)`, `y = ln(X*Y)`)
/// so `interpolate` can work in log space, per `setLogInterpolation`.
#[derive(Clone, Debug)]
pub struct SchwingerTable {
    x: Vec<Float>,
    y: Vec<Float>,
}

impl Default for SchwingerTable {
    fn default() -> Self {
        let x: Vec<Float> = SCHWINGER_X.to_vec();
        let y: Vec<Float> = SCHWINGER_X.iter().zip(SCHWINGER_Y.iter()).map(|(&xi, &yi)| (xi * yi).ln()).collect();
        let x: Vec<Float> = x.iter().map(|v| v.ln()).collect();
        SchwingerTable { x, y }
    }
}

impl SchwingerTable {
    /// Three-point Lagrange interpolation in log-log space, matching
    /// `getInterpolation`'s `x0Position-1, x0Position, x0Position+1` stencil.
    pub fn interpolate(&self, log_energy: Float) -> Float {
        let mut pos = 0usize;
        while pos < self.x.len() && log_energy >= self.x[pos] {
            pos += 1;
        }
        let pos = pos.clamp(1, self.x.len() - 2);

        let dx0 = log_energy - self.x[pos - 1];
        let dx1 = log_energy - self.x[pos];
        let dx2 = log_energy - self.x[pos + 1];

        let f1 = (dx0 * self.y[pos] - dx1 * self.y[pos - 1]) / (dx0 - dx1);
        let f2 = (dx0 * self.y[pos + 1] - dx2 * self.y[pos - 1]) / (dx0 - dx2);

        (dx1 * f2 - dx2 * f1) / (dx1 - dx2)
    }
}

/// Schwinger flux at `energy` (eV) for a source with critical energy
/// `critical_energy` (eV) and Lorentz factor `gamma`.
pub fn schwinger_flux(table: &SchwingerTable, energy: Float, critical_energy: Float, gamma: Float) -> Float {
    let pre_factor = constants::FACTOR_SCHWINGER_RAY * 1.0e-3;
    let y0 = energy / critical_energy / 1000.0;

    let yg0 = if y0 <= 0.0 {
        0.0
    } else if y0 > 10.0 {
        0.777 * y0.sqrt() * std::f64::consts::E.powf(-y0)
    } else if y0 < 1.0e-4 {
        1.333 * y0.powf(1.0 / 3.0)
    } else {
        table.interpolate(y0.ln()).exp()
    };

    pre_factor * gamma * yg0
}

/// Natural vertical opening half-angle `sigma_psi(E)`, combined in
/// quadrature with the electron beam's own divergence `sigv` (mrad),
/// per `DipoleSource::vDivergence`.
pub fn vertical_divergence(gamma: Float, critical_energy_ev: Float, energy_ev: Float, sigv_mrad: Float) -> Float {
    if gamma == 0.0 || critical_energy_ev == 0.0 {
        return 0.0;
    }
    let psi = constants::factor_omega() * 1.0e-18 * 0.1 / gamma * (critical_energy_ev * 1000.0 / energy_ev).powf(0.43);
    (psi.powi(2) + (sigv_mrad * 0.001).powi(2)).sqrt()
}

/// Stokes-vector synchrotron-polarization integral over `[psi1, psi2]`
/// (mrad), per `getStokesSyn`.
pub fn stokes_syn(energy_ev: Float, psi1: Float, psi2: Float, gamma: Float, critical_energy_ev: Float, clockwise: bool) -> Stokes {
    const FAK: Float = 3_453_345_200_000_000.0;
    let y0 = energy_ev / critical_energy_ev / 1000.0;
    let xnue1 = 1.0 / 3.0;
    let xnue2 = 2.0 / 3.0;

    let mut dpsi = (psi2 - psi1) / 101.0;
    if dpsi < 0.001 {
        dpsi = 0.001;
    }
    let mut psi = psi1 + dpsi / 2.0;

    let mut stokes: Stokes = [0.0; 4];
    while psi <= psi2 {
        let sign1 = (if clockwise { PI } else { -PI }) / 2.0;
        let sign2 = if psi >= 0.0 { 1.0 } else { -1.0 };
        let phase = -(sign1 * sign2);
        let x = gamma * psi * 0.001;
        let zeta = (1.0 + x.powi(2)).powf(1.5) * 0.5 * y0;
        let xkn2 = bessel_k(xnue2, zeta);
        let xkn1 = bessel_k(xnue1, zeta);
        let xint = FAK * gamma.powi(2) * y0.powi(2) * (1.0 + x.powi(2)).powi(2);
        let mut xintp = xint * xkn2.powi(2);
        let mut xints = xint * (x.powi(2) / (1.0 + x.powi(2)) * xkn1.powi(2));
        xintp *= dpsi * 1.0e-6;
        xints *= dpsi * 1.0e-6;

        stokes[0] += xintp - xints;
        stokes[1] += 2.0 * (xintp * xints).sqrt() * phase.sin();
        stokes[2] += xintp;
        stokes[3] += xints;
        psi += dpsi;
    }
    stokes
}

/// Folds the polarization integral over the electron-beam vertical
/// divergence `sigpsi` (mrad) by Monte-Carlo averaging `ln` samples
/// drawn from a Gaussian weight, per `dipoleFold`. Returns the folded
/// `psi` actually sampled and the averaged, re-ordered Stokes vector
/// `(linear, circular=0 placeholder, V)` the caller embeds into a ray.
///
/// The original's `if (ln == (int)sigpsi; ... if(ln = 0))` was an
/// assignment-for-comparison typo (spec.md's documented open question);
/// this implementation uses `==` throughout, per DESIGN.md.
pub fn dipole_fold(
    psi: Float,
    photon_energy_ev: Float,
    sigpsi_mrad: Float,
    gamma: Float,
    critical_energy_ev: Float,
    clockwise: bool,
    mut draw_uniform: impl FnMut() -> Float,
) -> (Float, Stokes) {
    let mut ln = sigpsi_mrad as i32;
    let (trsgyp, sgyp) = if sigpsi_mrad != 0.0 {
        if ln > 10 {
            ln = 10;
        }
        if ln == 0 {
            ln = 10;
        }
        (-0.5 / sigpsi_mrad / sigpsi_mrad, 4.0e-3 * sigpsi_mrad)
    } else {
        ln = 1;
        (0.0, 0.0)
    };

    let mut sum = [0.0; 4];
    let mut new_psi = psi;
    for _ in 0..ln {
        let (mut sy, mut wy);
        loop {
            sy = (draw_uniform() - 0.5) * sgyp;
            let zw = trsgyp * sy * sy;
            wy = zw.exp();
            if wy - draw_uniform() >= 0.0 {
                break;
            }
        }
        new_psi = psi + sy;
        let stokes = stokes_syn(photon_energy_ev, new_psi, new_psi, gamma, critical_energy_ev, clockwise);
        for i in 0..4 {
            sum[i] += stokes[i];
        }
    }
    let averaged: Stokes = [sum[0] / ln as Float, sum[1] / ln as Float, sum[2] / ln as Float, sum[3] / ln as Float];

    let folded = [averaged[2] + averaged[3], averaged[0], 0.0, averaged[1]];
    (new_psi, folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flux_is_nonnegative_across_spectrum() {
        let table = SchwingerTable::default();
        for e in [10.0, 100.0, 500.0, 2000.0, 10000.0] {
            let flux = schwinger_flux(&table, e, 2000.0, 1957.0 * 1000.0);
            assert!(flux >= 0.0, "flux at {e} was {flux}");
        }
    }

    #[test]
    fn flux_peaks_below_critical_energy() {
        let table = SchwingerTable::default();
        let gamma = 1957.0 * 1000.0;
        let low = schwinger_flux(&table, 500.0, 2000.0, gamma);
        let high = schwinger_flux(&table, 20000.0, 2000.0, gamma);
        assert!(low > high);
    }

    #[test]
    fn vertical_divergence_nonnegative() {
        let v = vertical_divergence(1957.0 * 1000.0, 2000.0, 500.0, 0.1);
        assert!(v > 0.0);
    }

    #[test]
    fn stokes_syn_total_intensity_nonnegative() {
        let s = stokes_syn(500.0, -1.0, 1.0, 1957.0 * 1000.0, 2000.0, true);
        assert!(s[2] + s[3] >= 0.0);
    }
}
