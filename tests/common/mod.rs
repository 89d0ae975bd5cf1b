//! Shared helpers for exercising the surface pipeline on small grids.

#![allow(dead_code)]

use nalgebra::Vector3;
use solvox::{Atom, GridFrame, Orientation, SurfaceMode, SurfaceOptions, VoxelGrid, surface};

/// Frame with the world origin at voxel (0, 0, 0) and no rotation.
pub fn identity_frame(step: f64) -> GridFrame {
    GridFrame::new(Vector3::zeros(), step, Orientation::identity()).unwrap()
}

/// Accessible-surface options with a zero probe, two workers, no output.
pub fn sas_options() -> SurfaceOptions {
    SurfaceOptions::default()
        .with_mode(SurfaceMode::Sas)
        .with_probe_radius(0.0)
        .with_threads(2)
}

/// Run the full pipeline in SAS mode with a zero probe on a cubic grid.
pub fn run_sas(n: usize, atoms: &[Atom]) -> VoxelGrid {
    let mut grid = VoxelGrid::new(n, n, n).unwrap();
    surface(&mut grid, atoms, &identity_frame(1.0), &sas_options()).unwrap();
    grid
}

/// Euclidean distance of voxel (i, j, k) from a grid-space point.
pub fn voxel_distance(i: usize, j: usize, k: usize, center: &Vector3<f64>) -> f64 {
    (Vector3::new(i as f64, j as f64, k as f64) - center).norm()
}

/// Smallest distance from `center` to any voxel holding `wanted`.
pub fn min_tag_distance(grid: &VoxelGrid, center: &Vector3<f64>, wanted: i32) -> Option<f64> {
    let (nx, ny, nz) = grid.shape();
    let mut best: Option<f64> = None;
    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                if grid.tag(i, j, k) == wanted {
                    let dist = voxel_distance(i, j, k, center);
                    best = Some(best.map_or(dist, |b: f64| b.min(dist)));
                }
            }
        }
    }
    best
}

/// Hollow cube shell of 26 atoms around world point (15, 15, 15) that seals
/// a single-voxel solvent pocket at the grid center.
pub fn pocket_shell_atoms() -> Vec<Atom> {
    let mut atoms = Vec::new();
    for di in [-3.0, 0.0, 3.0] {
        for dj in [-3.0, 0.0, 3.0] {
            for dk in [-3.0, 0.0, 3.0] {
                if di == 0.0 && dj == 0.0 && dk == 0.0 {
                    continue;
                }
                atoms.push(Atom::new(15.0 + di, 15.0 + dj, 15.0 + dk, 2.6));
            }
        }
    }
    atoms
}
