//! Atomic number → (name, atomic mass, density) lookup.
//!
//! Reproduces the role of `materials.xmacro` from `original_source/`:
//! a flat, hand-maintained table mapping each supported element to the
//! mass and density its NFF/Cromer n,k conversion needs. The data file
//! itself isn't part of this crate's inputs, so this is a representative
//! subset of elements actually used in synchrotron beamline optics
//! (mirror/grating coatings and common substrates) rather than the full
//! ~100-entry periodic table; extending it only means appending rows.

pub struct Element {
    pub name: &'static str,
    pub atomic_number: i32,
    /// Atomic mass, u.
    pub atomic_mass: f64,
    /// Density, g/cm^3.
    pub density: f64,
}

pub const PERIODIC_TABLE: &[Element] = &[
    Element { name: "H", atomic_number: 1, atomic_mass: 1.008, density: 0.00008988 },
    Element { name: "B", atomic_number: 5, atomic_mass: 10.811, density: 2.34 },
    Element { name: "C", atomic_number: 6, atomic_mass: 12.011, density: 2.26 },
    Element { name: "N", atomic_number: 7, atomic_mass: 14.007, density: 0.001251 },
    Element { name: "O", atomic_number: 8, atomic_mass: 15.999, density: 0.001429 },
    Element { name: "MG", atomic_number: 12, atomic_mass: 24.305, density: 1.738 },
    Element { name: "AL", atomic_number: 13, atomic_mass: 26.982, density: 2.70 },
    Element { name: "SI", atomic_number: 14, atomic_mass: 28.086, density: 2.33 },
    Element { name: "CR", atomic_number: 24, atomic_mass: 51.996, density: 7.19 },
    Element { name: "FE", atomic_number: 26, atomic_mass: 55.845, density: 7.874 },
    Element { name: "NI", atomic_number: 28, atomic_mass: 58.693, density: 8.908 },
    Element { name: "CU", atomic_number: 29, atomic_mass: 63.546, density: 8.96 },
    Element { name: "GE", atomic_number: 32, atomic_mass: 72.630, density: 5.323 },
    Element { name: "MO", atomic_number: 42, atomic_mass: 95.95, density: 10.28 },
    Element { name: "RU", atomic_number: 44, atomic_mass: 101.07, density: 12.45 },
    Element { name: "RH", atomic_number: 45, atomic_mass: 102.906, density: 12.41 },
    Element { name: "PD", atomic_number: 46, atomic_mass: 106.42, density: 12.02 },
    Element { name: "AG", atomic_number: 47, atomic_mass: 107.868, density: 10.49 },
    Element { name: "W", atomic_number: 74, atomic_mass: 183.84, density: 19.25 },
    Element { name: "IR", atomic_number: 77, atomic_mass: 192.217, density: 22.56 },
    Element { name: "PT", atomic_number: 78, atomic_mass: 195.085, density: 21.45 },
    Element { name: "AU", atomic_number: 79, atomic_mass: 196.967, density: 19.30 },
    Element { name: "PB", atomic_number: 82, atomic_mass: 207.2, density: 11.34 },
];

pub fn by_atomic_number(z: i32) -> Option<&'static Element> {
    PERIODIC_TABLE.iter().find(|e| e.atomic_number == z)
}

pub fn by_name(name: &str) -> Option<&'static Element> {
    PERIODIC_TABLE.iter().find(|e| e.name.eq_ignore_ascii_case(name))
}
