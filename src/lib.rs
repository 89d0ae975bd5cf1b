//! # solvox
//!
//! Voxel-grid detection of the solvent-exposed surface of a biomolecule and
//! of the residues that make it up.
//!
//! Atoms are rasterized onto a dense integer grid, the solvent is classified
//! against a spherical probe (solvent-accessible or solvent-excluded mode),
//! enclosed solvent pockets are pruned away by flood fill, and the surviving
//! surface shell is mapped back to the atoms whose spheres touch it.
//!
//! The grid work is data-parallel over a thread pool of configurable width;
//! the caller supplies coordinates, radii, and the grid geometry, and gets
//! back a classified grid plus a sorted list of interface atom indices (or
//! their residue labels).
//!
//! ## Example
//!
//! ```rust,ignore
//! use nalgebra::Vector3;
//! use solvox::{
//!     Atom, GridFrame, Orientation, SurfaceOptions, VoxelGrid, interface_atoms, surface,
//! };
//!
//! let mut grid = VoxelGrid::new(40, 40, 40)?;
//! let frame = GridFrame::new(Vector3::zeros(), 0.5, Orientation::identity())?;
//! let atoms = vec![Atom::new(10.0, 10.0, 10.0, 2.0)];
//! let options = SurfaceOptions::default();
//!
//! surface(&mut grid, &atoms, &frame, &options)?;
//! let exposed = interface_atoms(&grid, &atoms, &frame, &options)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

// Core types
pub mod atom;
pub mod grid;

// Pipeline
pub mod flood;
pub mod interface;
pub mod surface;

// Re-exports for convenience
pub use atom::Atom;
pub use error::{Result, SolvoxError};
pub use flood::ClusterSelection;
pub use grid::{GridFrame, Orientation, VoxelGrid, tag};
pub use interface::{interface_atoms, interface_residues};
pub use surface::{SurfaceMode, SurfaceOptions, surface};
