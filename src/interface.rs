//! Mapping of the exposed surface back onto atoms and residues.

use crate::atom::Atom;
use crate::error::{Result, SolvoxError};
use crate::grid::{GridFrame, VoxelGrid, tag};
use crate::surface::{SurfaceOptions, sphere_window};
use nalgebra::Vector3;
use rayon::prelude::*;

/// Indices of atoms whose probe-inflated sphere touches an exposed surface
/// voxel, in strictly ascending order with no duplicates.
///
/// Expects a grid already populated by [`crate::surface::surface`]; pass the
/// same frame and options so the sphere tests agree with the rasterization.
pub fn interface_atoms(
    grid: &VoxelGrid,
    atoms: &[Atom],
    frame: &GridFrame,
    options: &SurfaceOptions,
) -> Result<Vec<usize>> {
    options.validate()?;
    let pool = options.build_pool()?;
    if options.verbose {
        println!("> Retrieving interface residues");
    }

    let mut hits: Vec<usize> = pool.install(|| {
        atoms
            .par_iter()
            .enumerate()
            .filter(|(_, atom)| touches_surface(grid, atom, frame, options.probe_radius))
            .map(|(index, _)| index)
            .collect()
    });
    hits.sort_unstable();
    Ok(hits)
}

/// Residue labels of the interface atoms, in ascending atom-index order.
///
/// `labels` carries one identifier per atom (the same label may repeat for
/// atoms of one residue); its length must match the atom array.
pub fn interface_residues(
    grid: &VoxelGrid,
    labels: &[String],
    atoms: &[Atom],
    frame: &GridFrame,
    options: &SurfaceOptions,
) -> Result<Vec<String>> {
    if labels.len() != atoms.len() {
        return Err(SolvoxError::LabelMismatch {
            labels: labels.len(),
            atoms: atoms.len(),
        });
    }
    let hits = interface_atoms(grid, atoms, frame, options)?;
    Ok(hits.into_iter().map(|index| labels[index].clone()).collect())
}

/// Whether any exposed surface voxel lies within the atom's probe-inflated
/// sphere. The distance test is inclusive, so shell voxels sitting exactly
/// at the combined radius count.
fn touches_surface(grid: &VoxelGrid, atom: &Atom, frame: &GridFrame, probe_radius: f64) -> bool {
    let (nx, ny, nz) = grid.shape();
    let center = frame.to_grid(&atom.position);
    let reach = (atom.radius + probe_radius) / frame.step;

    for (i, j, k) in sphere_window(&center, reach) {
        // The scan window leaves the index-0 faces untouched.
        if i <= 0
            || j <= 0
            || k <= 0
            || i >= nx as isize
            || j >= ny as isize
            || k >= nz as isize
        {
            continue;
        }
        if grid.tag(i as usize, j as usize, k as usize) != tag::SOLVENT {
            continue;
        }
        let offset = Vector3::new(i as f64, j as f64, k as f64) - center;
        if offset.norm() <= reach {
            return true;
        }
    }
    false
}
