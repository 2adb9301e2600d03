//! Scalar types, constants, linear algebra and randomness shared by
//! every other module in the crate.

pub mod geometry;
pub mod numeric;
pub mod rng;

pub use geometry::{Mat3, Mat4, Vec3};
pub use numeric::Float;
pub use rng::CounterRng;
