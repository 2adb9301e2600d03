//! The seam an external RML (ray-machine-language) importer plugs into.
//!
//! Parsing beamline description files is explicitly out of scope for
//! this crate (spec.md §1): an importer lives elsewhere and turns its
//! own file format into a sequence of typed key/value lookups, which it
//! exposes through [`DesignObject`]. This crate never depends on a
//! concrete parser; [`crate::beamline::ElementDesign`]/[`crate::beamline::Beamline`]
//! values are built by the importer from those lookups however its
//! schema dictates, which is why this module stops at the accessor
//! trait rather than trying to guess a field-name convention.
//!
//! [`MapDesignObject`] is the in-memory reference implementation used
//! by this crate's own tests, the way the teacher's texture pipeline
//! looks named parameters up out of a small owned table rather than a
//! real scene file.

use std::collections::HashMap;

use crate::core::geometry::Vec3;
use crate::core::numeric::Float;

/// Typed accessors over a single design object's named parameters.
///
/// Every getter returns `None` when the key is absent or holds a value
/// of the wrong type, matching the original's "optional parameter with
/// a caller-supplied default" convention rather than erroring eagerly.
pub trait DesignObject {
    fn get_f64(&self, key: &str) -> Option<Float>;
    fn get_i32(&self, key: &str) -> Option<i32>;
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn get_string(&self, key: &str) -> Option<&str>;
    fn get_vec3(&self, key: &str) -> Option<Vec3>;
    fn get_f64_array(&self, key: &str) -> Option<&[Float]>;
}

/// A [`DesignObject`] parameter value, as stored by [`MapDesignObject`].
#[derive(Clone, Debug, PartialEq)]
pub enum DesignValue {
    F64(Float),
    I32(i32),
    Bool(bool),
    String(String),
    Vec3(Vec3),
    F64Array(Vec<Float>),
}

/// In-memory [`DesignObject`] backed by a `HashMap`, for tests and as
/// the simplest possible reference importer.
#[derive(Clone, Debug, Default)]
pub struct MapDesignObject {
    values: HashMap<String, DesignValue>,
}

impl MapDesignObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: DesignValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: DesignValue) {
        self.values.insert(key.into(), value);
    }
}

impl DesignObject for MapDesignObject {
    fn get_f64(&self, key: &str) -> Option<Float> {
        match self.values.get(key)? {
            DesignValue::F64(v) => Some(*v),
            _ => None,
        }
    }

    fn get_i32(&self, key: &str) -> Option<i32> {
        match self.values.get(key)? {
            DesignValue::I32(v) => Some(*v),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key)? {
            DesignValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    fn get_string(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            DesignValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    fn get_vec3(&self, key: &str) -> Option<Vec3> {
        match self.values.get(key)? {
            DesignValue::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    fn get_f64_array(&self, key: &str) -> Option<&[Float]> {
        match self.values.get(key)? {
            DesignValue::F64Array(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}
