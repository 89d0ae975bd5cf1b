//! The solvent-exposed surface pipeline.
//!
//! Stages run strictly in sequence over a single shared grid: reset to
//! solvent, rasterize the probe-inflated atoms, optionally shrink the
//! accessible shell down to the excluded surface, extract surface voxels,
//! prune enclosed pockets, and strip stray surface voxels. Within a stage
//! the work is embarrassingly parallel over atoms or grid slabs; the join
//! point of each stage sequences it against the next.

use crate::atom::Atom;
use crate::error::{Result, SolvoxError, check_non_negative, check_thread_count};
use crate::flood::{ClusterSelection, prune_enclosed_regions};
use crate::grid::{GridFrame, VoxelGrid, tag};
use itertools::iproduct;
use nalgebra::Vector3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Which molecular surface definition the pipeline produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceMode {
    /// Solvent-accessible surface: the locus of the probe center rolled over
    /// the van der Waals spheres. No shrink pass.
    Sas,
    /// Solvent-excluded surface: the accessible shell shrunk back toward the
    /// biomolecule by the probe radius.
    #[default]
    Ses,
}

/// Options shared by the surface and interface operations.
///
/// The interface operation reads `probe_radius`, `n_threads`, and `verbose`;
/// pass the same options value used to surface the grid so the sphere tests
/// agree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceOptions {
    /// Probe sphere radius in Angstrom. Default: 1.4 (water).
    pub probe_radius: f64,
    /// Surface definition. Default: SES.
    pub mode: SurfaceMode,
    /// Which surface cluster survives pruning. Default: first found.
    pub selection: ClusterSelection,
    /// Worker thread count for the parallel stages. Default: available
    /// parallelism.
    pub n_threads: usize,
    /// Print one progress line per stage to stdout.
    pub verbose: bool,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            probe_radius: 1.4,
            mode: SurfaceMode::default(),
            selection: ClusterSelection::default(),
            n_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            verbose: false,
        }
    }
}

impl SurfaceOptions {
    /// Create options with the given probe radius and surface mode.
    pub fn new(probe_radius: f64, mode: SurfaceMode) -> Self {
        Self {
            probe_radius,
            mode,
            ..Default::default()
        }
    }

    /// Set the probe radius.
    pub fn with_probe_radius(mut self, probe_radius: f64) -> Self {
        self.probe_radius = probe_radius;
        self
    }

    /// Set the surface mode.
    pub fn with_mode(mut self, mode: SurfaceMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the cluster selection policy.
    pub fn with_selection(mut self, selection: ClusterSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Set the worker thread count.
    pub fn with_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = n_threads;
        self
    }

    /// Enable or disable per-stage progress lines.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_non_negative(self.probe_radius, "probe_radius")?;
        check_thread_count(self.n_threads)
    }

    pub(crate) fn build_pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.n_threads)
            .build()
            .map_err(|err| SolvoxError::ThreadPool {
                reason: err.to_string(),
            })
    }
}

/// Classify the grid into biomolecule interior ([`tag::PROTEIN`]), exposed
/// surface ([`tag::SOLVENT`]), and bulk solvent ([`tag::BULK_SOLVENT`]).
///
/// The grid is reset first, so a grid may be reused across calls. Atoms
/// wholly outside the grid are clipped away and an empty atom list is valid
/// (the grid ends with no surface at all).
pub fn surface(
    grid: &mut VoxelGrid,
    atoms: &[Atom],
    frame: &GridFrame,
    options: &SurfaceOptions,
) -> Result<()> {
    options.validate()?;
    let pool = options.build_pool()?;
    tracing::debug!(
        n_atoms = atoms.len(),
        shape = ?grid.shape(),
        probe_radius = options.probe_radius,
        mode = ?options.mode,
        "computing solvent-exposed surface"
    );

    if options.verbose && options.mode == SurfaceMode::Sas {
        println!("> Adjusting SAS surface");
    }
    grid.fill(tag::SOLVENT);

    pool.install(|| {
        rasterize(grid, atoms, frame, options.probe_radius);

        if options.mode == SurfaceMode::Ses {
            if options.verbose {
                println!("> Adjusting SES surface");
            }
            shrink_to_excluded(grid, frame.step, options.probe_radius);
        }

        if options.verbose {
            println!("> Defining surface points");
        }
        extract_surface(grid);

        if options.verbose {
            println!("> Filtering enclosed regions");
        }
        prune_enclosed_regions(grid, options.selection);
        strip_noise(grid);
    });
    Ok(())
}

/// Integer voxel window covering a sphere of radius `reach` around a
/// fractional grid-space center.
pub(crate) fn sphere_window(
    center: &Vector3<f64>,
    reach: f64,
) -> impl Iterator<Item = (isize, isize, isize)> + use<> {
    let lo = |c: f64| (c - reach).floor() as isize;
    let hi = |c: f64| (c + reach).ceil() as isize;
    iproduct!(
        lo(center.x)..=hi(center.x),
        lo(center.y)..=hi(center.y),
        lo(center.z)..=hi(center.z)
    )
}

/// Carve every voxel within `radius + probe` of an atom center to
/// [`tag::PROTEIN`]. Parallel over atoms; the stores are idempotent, so
/// overlapping spheres need no synchronization.
pub(crate) fn rasterize(grid: &VoxelGrid, atoms: &[Atom], frame: &GridFrame, probe_radius: f64) {
    atoms.par_iter().for_each(|atom| {
        let center = frame.to_grid(&atom.position);
        let reach = (atom.radius + probe_radius) / frame.step;
        for (i, j, k) in sphere_window(&center, reach) {
            let offset = Vector3::new(i as f64, j as f64, k as f64) - center;
            if offset.norm() < reach {
                grid.set_tag_at(i, j, k, tag::PROTEIN);
            }
        }
    });
}

/// Shrink the accessible shell down to the excluded surface: interior voxels
/// within the probe distance of an interface solvent voxel are handed back
/// to the solvent.
///
/// The mark pass dilates from solvent voxels that touch the interior; marks
/// land in the same grid so freshly reclaimed voxels extend the interface
/// within the sweep. The promote pass then turns every mark into solvent.
pub(crate) fn shrink_to_excluded(grid: &VoxelGrid, step: f64, probe_radius: f64) {
    let reach = probe_radius / step;
    let span = reach.ceil() as isize;
    let (nx, ny, nz) = grid.shape();

    (0..nx).into_par_iter().for_each(|i| {
        for (j, k) in iproduct!(0..ny, 0..nz) {
            if grid.tag(i, j, k) != tag::SOLVENT
                || !grid.neighborhood_any(i, j, k, |t| {
                    t == tag::PROTEIN || t == tag::SES_SCRATCH
                })
            {
                continue;
            }
            let (ci, cj, ck) = (i as isize, j as isize, k as isize);
            for (x, y, z) in iproduct!(
                ci - span..=ci + span,
                cj - span..=cj + span,
                ck - span..=ck + span
            ) {
                // The dilation window leaves the index-0 faces untouched.
                if x <= 0
                    || y <= 0
                    || z <= 0
                    || x >= nx as isize
                    || y >= ny as isize
                    || z >= nz as isize
                {
                    continue;
                }
                let offset = Vector3::new((ci - x) as f64, (cj - y) as f64, (ck - z) as f64);
                if offset.norm() < reach
                    && grid.tag(x as usize, y as usize, z as usize) == tag::PROTEIN
                {
                    grid.set_tag(x as usize, y as usize, z as usize, tag::SES_SCRATCH);
                }
            }
        }
    });

    (0..nx).into_par_iter().for_each(|i| {
        for (j, k) in iproduct!(0..ny, 0..nz) {
            if grid.tag(i, j, k) == tag::SES_SCRATCH {
                grid.set_tag(i, j, k, tag::SOLVENT);
            }
        }
    });
}

/// Split the solvent into surface candidates and bulk: a solvent voxel with
/// an interior 26-neighbor stays [`tag::SOLVENT`], the rest become
/// [`tag::BULK_SOLVENT`]. In-place update is race-free because the predicate
/// only inspects [`tag::PROTEIN`], which this stage never writes.
pub(crate) fn extract_surface(grid: &VoxelGrid) {
    let (nx, ny, nz) = grid.shape();
    (0..nx).into_par_iter().for_each(|i| {
        for (j, k) in iproduct!(0..ny, 0..nz) {
            if grid.tag(i, j, k) == tag::SOLVENT {
                let keep = grid.neighborhood_any(i, j, k, |t| t == tag::PROTEIN);
                grid.set_tag(
                    i,
                    j,
                    k,
                    if keep { tag::SOLVENT } else { tag::BULK_SOLVENT },
                );
            }
        }
    });
}

/// Drop kept-surface voxels with no bulk-solvent 26-neighbor; pruning can
/// leave such stragglers on component rims. Race-free in place for the same
/// reason as [`extract_surface`].
pub(crate) fn strip_noise(grid: &VoxelGrid) {
    let (nx, ny, nz) = grid.shape();
    (0..nx).into_par_iter().for_each(|i| {
        for (j, k) in iproduct!(0..ny, 0..nz) {
            if grid.tag(i, j, k) == tag::SOLVENT {
                let keep = grid.neighborhood_any(i, j, k, |t| t == tag::BULK_SOLVENT);
                grid.set_tag(i, j, k, if keep { tag::SOLVENT } else { tag::PROTEIN });
            }
        }
    });
}
