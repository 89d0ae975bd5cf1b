//! Atom records consumed by the surface pipeline.

use crate::error::{Result, SolvoxError};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A single atom: world-space center plus van der Waals radius, in Angstrom.
///
/// The pipeline never mutates atoms; radii are inflated by the probe radius
/// on the fly wherever a sphere test runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// World coordinates of the atom center.
    pub position: Vector3<f64>,
    /// Van der Waals radius.
    pub radius: f64,
}

impl Atom {
    /// Create an atom from center coordinates and radius.
    pub fn new(x: f64, y: f64, z: f64, radius: f64) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            radius,
        }
    }

    /// Build an atom list from the flat `[x, y, z, r, x, y, z, r, ...]`
    /// layout used by callers that assemble coordinates elsewhere.
    ///
    /// Fails when the slice length is not a multiple of four.
    pub fn from_xyzr_flat(values: &[f64]) -> Result<Vec<Self>> {
        if values.len() % 4 != 0 {
            return Err(SolvoxError::MalformedAtomData { len: values.len() });
        }
        Ok(values
            .chunks_exact(4)
            .map(|xyzr| Self::new(xyzr[0], xyzr[1], xyzr[2], xyzr[3]))
            .collect())
    }
}
