//! Scalar type and physical/mathematical constants shared by every
//! subsystem. The tracer works exclusively in `f64`: the source data
//! (grazing angles, energies, VLS coefficients) spans many orders of
//! magnitude and the invariants in spec.md §8 are stated at 1e-9..1e-12
//! tolerances, well past what `f32` can hold.

/// Scalar type used throughout the crate.
pub type Float = f64;

pub const PI: Float = std::f64::consts::PI;
pub const TWO_PI: Float = 2.0 * PI;

/// nm <-> eV conversion factor (`E[eV] * lambda[nm] = INV_NM_TO_EVOLT`).
pub const INV_NM_TO_EVOLT: Float = 1239.841984332002622;

pub mod constants {
    use super::Float;

    /// Joule per electron-volt.
    pub const ELECTRON_VOLT: Float = 1.602176634e-19;
    /// Speed of light in vacuum, m/s.
    pub const SPEED_OF_LIGHT: Float = 299_792_458.0;
    /// Elementary charge, As.
    pub const ELEMENTARY_CHARGE: Float = 1.602176634e-19;
    /// Planck constant, Js.
    pub const PLANCK: Float = 6.62607015e-34;
    /// Planck's reduced constant, Js.
    pub const PLANCK_BAR: Float = PLANCK / (2.0 * super::PI);
    /// Electron rest mass, kg.
    pub const ELECTRON_MASS: Float = 9.1093837015e-31;
    /// RAY-UI's `factorElectronEnergy` shortcut (gamma = |E_e| * this).
    pub const FACTOR_ELECTRON_ENERGY_SC: Float = 1957.0;
    /// Fine-structure constant (dimensionless).
    pub const FINE_STRUCTURE_CONSTANT: Float = 7.2973525693e-3;
    /// Vacuum electric permittivity, As/Vm.
    pub const ELECTRIC_PERMITTIVITY: Float = 8.8541878128e-12;
    /// RAY's lumped prefactor appearing in the Schwinger flux equation.
    pub const FACTOR_SCHWINGER_RAY: Float = 1.2556937e15;
    /// Classical electron radius, nm.
    pub const ELECTRON_RADIUS: Float = 2.8179403205e-6;

    /// `hbar / (2 c^5 m_e^3) * eV^2 * 1e24` — RAY-UI's critical-energy prefactor.
    pub fn factor_critical_energy() -> Float {
        3.0 * PLANCK_BAR / (2.0 * SPEED_OF_LIGHT.powi(5) * ELECTRON_MASS.powi(3)) * ELECTRON_VOLT.powi(2) * 1.0e24
    }

    pub fn factor_electron_energy() -> Float {
        ELECTRON_VOLT * 1.0e9 / (ELECTRON_MASS * SPEED_OF_LIGHT.powi(2))
    }

    pub fn factor_omega() -> Float {
        3.0 * FINE_STRUCTURE_CONSTANT
            / (4.0 * super::PI.powi(2) * ELEMENTARY_CHARGE * SPEED_OF_LIGHT.powi(4) * ELECTRON_MASS.powi(2) / (ELECTRON_VOLT * 1.0e9).powi(2))
    }
}

pub fn to_wavelength_nm(energy_ev: Float) -> Float {
    INV_NM_TO_EVOLT / energy_ev
}

pub fn to_electron_volt(wavelength_nm: Float) -> Float {
    INV_NM_TO_EVOLT / wavelength_nm
}

pub fn to_radians(deg: Float) -> Float {
    deg * PI / 180.0
}

pub fn to_degrees(rad: Float) -> Float {
    rad * 180.0 / PI
}
