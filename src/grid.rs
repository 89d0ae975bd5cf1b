//! The integer voxel lattice and the world-to-grid coordinate frame.
//!
//! Voxel `(i, j, k)` of an `(nx, ny, nz)` grid lives at linear index
//! `k + nz * (j + ny * i)`. Every voxel carries an `i32` tag whose meaning
//! shifts as the pipeline advances; see [`tag`] for the lifecycle.

use crate::error::{Result, SolvoxError, check_positive};
use itertools::iproduct;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI32, Ordering};

/// Voxel tag values.
///
/// Tags are reused across pipeline stages: `SOLVENT` marks plain solvent on
/// a fresh grid, candidate surface voxels after extraction, and the kept
/// exposed surface in a finished grid. Cluster tags `>= 2` exist only while
/// enclosed regions are being pruned and never survive the pipeline.
pub mod tag {
    /// Solvent voxel; the grid initialization value. In a finished grid this
    /// marks the solvent-exposed surface.
    pub const SOLVENT: i32 = 1;

    /// Voxel inside the probe-inflated biomolecule.
    pub const PROTEIN: i32 = 0;

    /// Solvent with no biomolecule contact. Assigned during surface
    /// extraction; in a finished grid this is everything that is neither
    /// interior nor surface.
    pub const BULK_SOLVENT: i32 = -1;

    /// Scratch marker for interior voxels reclaimed while shrinking the
    /// accessible shell down to the excluded surface. Never escapes that
    /// stage.
    pub(crate) const SES_SCRATCH: i32 = -2;

    /// Tag handed to the first surface cluster found in scan order.
    pub(crate) const FIRST_CLUSTER: i32 = 2;
}

/// A dense 3D lattice of `i32` voxel tags.
///
/// Storage is atomic so the parallel pipeline stages can share one grid
/// without locking; every access uses relaxed ordering, with the join point
/// of each stage providing the fence between stages. Exclusive accessors
/// (`fill`) bypass the atomics entirely.
#[derive(Debug)]
pub struct VoxelGrid {
    nx: usize,
    ny: usize,
    nz: usize,
    cells: Vec<AtomicI32>,
}

impl VoxelGrid {
    /// Allocate a grid of the given shape with every voxel set to
    /// [`tag::SOLVENT`].
    pub fn new(nx: usize, ny: usize, nz: usize) -> Result<Self> {
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(SolvoxError::InvalidGrid {
                nx,
                ny,
                nz,
                reason: "every axis must be positive".to_string(),
            });
        }
        let voxels = nx
            .checked_mul(ny)
            .and_then(|v| v.checked_mul(nz))
            .ok_or_else(|| SolvoxError::InvalidGrid {
                nx,
                ny,
                nz,
                reason: "voxel count overflows usize".to_string(),
            })?;
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(voxels)
            .map_err(|_| SolvoxError::Allocation { voxels })?;
        cells.resize_with(voxels, || AtomicI32::new(tag::SOLVENT));
        Ok(Self { nx, ny, nz, cells })
    }

    /// Grid shape as `(nx, ny, nz)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    /// Total number of voxels.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when the grid holds no voxels (never the case for a constructed
    /// grid; axes are validated positive).
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    fn linear(&self, i: usize, j: usize, k: usize) -> usize {
        k + self.nz * (j + self.ny * i)
    }

    /// Tag at voxel `(i, j, k)`.
    #[inline]
    pub fn tag(&self, i: usize, j: usize, k: usize) -> i32 {
        debug_assert!(i < self.nx && j < self.ny && k < self.nz);
        self.cells[self.linear(i, j, k)].load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_tag(&self, i: usize, j: usize, k: usize, value: i32) {
        debug_assert!(i < self.nx && j < self.ny && k < self.nz);
        self.cells[self.linear(i, j, k)].store(value, Ordering::Relaxed);
    }

    /// Clipped read: `None` outside `[0, n)` on any axis.
    #[inline]
    pub(crate) fn tag_at(&self, i: isize, j: isize, k: isize) -> Option<i32> {
        let inside = i >= 0
            && j >= 0
            && k >= 0
            && (i as usize) < self.nx
            && (j as usize) < self.ny
            && (k as usize) < self.nz;
        inside.then(|| self.tag(i as usize, j as usize, k as usize))
    }

    /// Clipped write: silently ignored outside the grid.
    #[inline]
    pub(crate) fn set_tag_at(&self, i: isize, j: isize, k: isize, value: i32) {
        if i >= 0
            && j >= 0
            && k >= 0
            && (i as usize) < self.nx
            && (j as usize) < self.ny
            && (k as usize) < self.nz
        {
            self.set_tag(i as usize, j as usize, k as usize, value);
        }
    }

    /// Reset every voxel to `value`.
    pub fn fill(&mut self, value: i32) {
        for cell in &mut self.cells {
            *cell.get_mut() = value;
        }
    }

    /// Number of voxels currently holding `value`.
    pub fn count(&self, value: i32) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.load(Ordering::Relaxed) == value)
            .count()
    }

    /// Snapshot of all voxel tags in linear-index order.
    pub fn tags(&self) -> Vec<i32> {
        self.cells
            .iter()
            .map(|cell| cell.load(Ordering::Relaxed))
            .collect()
    }

    /// True when `(i, j, k)` lies on an outer boundary face.
    #[inline]
    pub(crate) fn on_face(&self, i: usize, j: usize, k: usize) -> bool {
        i == 0 || i == self.nx - 1 || j == 0 || j == self.ny - 1 || k == 0 || k == self.nz - 1
    }

    /// True when any voxel of the 3x3x3 cube centered on `(i, j, k)`
    /// satisfies `pred`. Out-of-grid positions are skipped; the center
    /// itself is inspected too, which is harmless for every caller.
    #[inline]
    pub(crate) fn neighborhood_any(
        &self,
        i: usize,
        j: usize,
        k: usize,
        pred: impl Fn(i32) -> bool,
    ) -> bool {
        let (ci, cj, ck) = (i as isize, j as isize, k as isize);
        iproduct!(ci - 1..=ci + 1, cj - 1..=cj + 1, ck - 1..=ck + 1)
            .any(|(x, y, z)| self.tag_at(x, y, z).is_some_and(|t| pred(t)))
    }
}

// === Coordinate Frame ===

/// Precomputed sines and cosines of the two grid rotation angles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    /// Sine of the rotation about the x axis.
    pub sin_a: f64,
    /// Cosine of the rotation about the x axis.
    pub cos_a: f64,
    /// Sine of the rotation about the y axis.
    pub sin_b: f64,
    /// Cosine of the rotation about the y axis.
    pub cos_b: f64,
}

impl Orientation {
    /// No rotation.
    pub fn identity() -> Self {
        Self {
            sin_a: 0.0,
            cos_a: 1.0,
            sin_b: 0.0,
            cos_b: 1.0,
        }
    }

    /// Build from the two rotation angles, in radians.
    pub fn from_angles(alpha: f64, beta: f64) -> Self {
        let (sin_a, cos_a) = alpha.sin_cos();
        let (sin_b, cos_b) = beta.sin_cos();
        Self {
            sin_a,
            cos_a,
            sin_b,
            cos_b,
        }
    }

    /// Apply the rotation: first about the y axis (beta), then about the
    /// x axis (alpha).
    #[inline]
    pub fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let x = v.x * self.cos_b + v.z * self.sin_b;
        let y = v.y;
        let z = -v.x * self.sin_b + v.z * self.cos_b;
        Vector3::new(
            x,
            y * self.cos_a - z * self.sin_a,
            y * self.sin_a + z * self.cos_a,
        )
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::identity()
    }
}

/// World-to-grid mapping: origin of voxel `(0, 0, 0)`, grid spacing, and
/// grid rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridFrame {
    /// World coordinates of the corner of voxel `(0, 0, 0)`, in Angstrom.
    pub origin: Vector3<f64>,
    /// Grid spacing in Angstrom.
    pub step: f64,
    /// Grid rotation.
    pub orientation: Orientation,
}

impl GridFrame {
    /// Create a frame; `step` must be positive.
    pub fn new(origin: Vector3<f64>, step: f64, orientation: Orientation) -> Result<Self> {
        check_positive(step, "step")?;
        Ok(Self {
            origin,
            step,
            orientation,
        })
    }

    /// Map a world point to fractional voxel coordinates.
    #[inline]
    pub fn to_grid(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.orientation.rotate(&((point - self.origin) / self.step))
    }
}
