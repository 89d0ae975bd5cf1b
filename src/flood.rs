//! Clustering of candidate surface voxels and removal of enclosed pockets.
//!
//! After surface extraction the grid can carry several disconnected surface
//! shells: the exterior one plus one shell per enclosed solvent pocket. The
//! pruner clusters the candidates under 26-connectivity and keeps a single
//! shell, turning the rest back into interior.

use crate::grid::{VoxelGrid, tag};
use itertools::iproduct;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Voxels a single flood burst may claim before falling back to rescans.
const BURST_BUDGET: usize = 10_000;

/// Policy for choosing which surface cluster survives pruning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterSelection {
    /// Keep the cluster discovered first in lexicographic scan order. On
    /// biomolecular inputs the scan reaches the exterior shell before any
    /// enclosed pocket, so this keeps the exterior surface.
    #[default]
    FirstFound,
    /// Keep the cluster with the most voxels, preferring the earlier
    /// cluster on ties.
    Largest,
}

/// A connected set of surface voxels found during pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cluster {
    tag: i32,
    voxels: usize,
}

/// Cluster candidate surface voxels and keep a single shell: the kept
/// cluster returns to [`tag::SOLVENT`], every other cluster becomes
/// [`tag::PROTEIN`]. Voxels on the outer boundary faces are never clustered
/// and keep their tags.
pub(crate) fn prune_enclosed_regions(grid: &VoxelGrid, selection: ClusterSelection) {
    let clusters = ClusterScan::new(grid).run();
    tracing::debug!(
        clusters = clusters.len(),
        "clustered candidate surface voxels"
    );
    if clusters.is_empty() {
        return;
    }

    let keep = match selection {
        ClusterSelection::FirstFound => tag::FIRST_CLUSTER,
        ClusterSelection::Largest => {
            match clusters.iter().max_by_key(|c| (c.voxels, Reverse(c.tag))) {
                Some(cluster) => cluster.tag,
                None => return,
            }
        }
    };

    let (nx, ny, nz) = grid.shape();
    (0..nx).into_par_iter().for_each(|i| {
        for (j, k) in iproduct!(0..ny, 0..nz) {
            let t = grid.tag(i, j, k);
            if t == keep {
                grid.set_tag(i, j, k, tag::SOLVENT);
            } else if t > tag::SOLVENT {
                grid.set_tag(i, j, k, tag::PROTEIN);
            }
        }
    });
}

/// Sequential flood fill over candidate surface voxels.
///
/// Traversal runs on an explicit stack, so pocket size never threatens the
/// call stack. Each burst claims at most [`BURST_BUDGET`] voxels; a cluster
/// that outgrows its burst is completed by whole-grid rescans that resume
/// flooding from any unclustered voxel touching the cluster, until a rescan
/// trips no budget. All control state is local to the scan.
struct ClusterScan<'grid> {
    grid: &'grid VoxelGrid,
    budget_hit: bool,
    stack: Vec<[usize; 3]>,
}

impl<'grid> ClusterScan<'grid> {
    fn new(grid: &'grid VoxelGrid) -> Self {
        Self {
            grid,
            budget_hit: false,
            stack: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Cluster> {
        let (nx, ny, nz) = self.grid.shape();
        let mut clusters = Vec::new();
        let mut next = tag::SOLVENT;

        for (i, j, k) in iproduct!(0..nx, 0..ny, 0..nz) {
            if self.grid.tag(i, j, k) != tag::SOLVENT {
                continue;
            }
            next += 1;
            self.budget_hit = false;
            let mut voxels = self.flood(i, j, k, next);

            while self.budget_hit {
                self.budget_hit = false;
                for (i2, j2, k2) in iproduct!(0..nx, 0..ny, 0..nz) {
                    if self.grid.tag(i2, j2, k2) == tag::SOLVENT
                        && self.grid.neighborhood_any(i2, j2, k2, |t| t == next)
                    {
                        voxels += self.flood(i2, j2, k2, next);
                    }
                }
            }
            clusters.push(Cluster { tag: next, voxels });
        }
        clusters
    }

    /// One bounded traversal burst from a seed voxel. Returns the number of
    /// voxels claimed; sets `budget_hit` when the burst was cut short.
    fn flood(&mut self, i: usize, j: usize, k: usize, cluster: i32) -> usize {
        let mut claimed = 0;
        self.stack.push([i, j, k]);
        while let Some([i, j, k]) = self.stack.pop() {
            if self.grid.on_face(i, j, k) || self.grid.tag(i, j, k) != tag::SOLVENT {
                continue;
            }
            self.grid.set_tag(i, j, k, cluster);
            claimed += 1;
            if claimed == BURST_BUDGET {
                self.budget_hit = true;
                self.stack.clear();
                break;
            }
            for (x, y, z) in iproduct!(i - 1..=i + 1, j - 1..=j + 1, k - 1..=k + 1) {
                self.stack.push([x, y, z]);
            }
        }
        claimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Carve a solid rectangular blob of candidate surface voxels.
    fn blob(grid: &VoxelGrid, lo: [usize; 3], hi: [usize; 3]) {
        for (i, j, k) in iproduct!(lo[0]..=hi[0], lo[1]..=hi[1], lo[2]..=hi[2]) {
            grid.set_tag(i, j, k, tag::SOLVENT);
        }
    }

    fn two_blob_grid() -> VoxelGrid {
        let mut grid = VoxelGrid::new(16, 16, 16).unwrap();
        grid.fill(tag::PROTEIN);
        // First blob in scan order is the smaller one
        blob(&grid, [2, 2, 2], [3, 3, 3]);
        blob(&grid, [8, 8, 8], [12, 12, 12]);
        grid
    }

    #[test]
    fn test_first_found_keeps_scan_order_winner() {
        let grid = two_blob_grid();
        prune_enclosed_regions(&grid, ClusterSelection::FirstFound);
        assert_eq!(grid.tag(2, 2, 2), tag::SOLVENT);
        assert_eq!(grid.tag(10, 10, 10), tag::PROTEIN);
        assert_eq!(grid.count(tag::SOLVENT), 8);
    }

    #[test]
    fn test_largest_keeps_biggest_cluster() {
        let grid = two_blob_grid();
        prune_enclosed_regions(&grid, ClusterSelection::Largest);
        assert_eq!(grid.tag(2, 2, 2), tag::PROTEIN);
        assert_eq!(grid.tag(10, 10, 10), tag::SOLVENT);
        assert_eq!(grid.count(tag::SOLVENT), 125);
    }

    #[test]
    fn test_no_candidates_is_noop() {
        let mut grid = VoxelGrid::new(8, 8, 8).unwrap();
        grid.fill(tag::BULK_SOLVENT);
        grid.set_tag(3, 3, 3, tag::PROTEIN);
        prune_enclosed_regions(&grid, ClusterSelection::FirstFound);
        assert_eq!(grid.count(tag::BULK_SOLVENT), grid.len() - 1);
        assert_eq!(grid.tag(3, 3, 3), tag::PROTEIN);
    }

    #[test]
    fn test_face_voxels_stay_unclustered() {
        let mut grid = VoxelGrid::new(8, 8, 8).unwrap();
        grid.fill(tag::PROTEIN);
        grid.set_tag(0, 4, 4, tag::SOLVENT);
        blob(&grid, [2, 2, 2], [3, 3, 3]);
        prune_enclosed_regions(&grid, ClusterSelection::FirstFound);
        // The face voxel forms an empty cluster, so the interior blob is the
        // first real one and survives
        assert_eq!(grid.tag(0, 4, 4), tag::SOLVENT);
        assert_eq!(grid.tag(2, 2, 2), tag::PROTEIN);
    }

    #[test]
    fn test_budget_overflow_completes_cluster() {
        // The whole interior is one cluster far above the burst budget
        let mut grid = VoxelGrid::new(34, 34, 34).unwrap();
        grid.fill(tag::BULK_SOLVENT);
        blob(&grid, [1, 1, 1], [32, 32, 32]);
        prune_enclosed_regions(&grid, ClusterSelection::FirstFound);
        assert_eq!(grid.count(tag::SOLVENT), 32 * 32 * 32);
        assert_eq!(grid.count(tag::BULK_SOLVENT), grid.len() - 32 * 32 * 32);
    }

    #[test]
    fn test_budget_overflow_sizes_are_exact() {
        let mut grid = VoxelGrid::new(34, 34, 34).unwrap();
        grid.fill(tag::BULK_SOLVENT);
        blob(&grid, [1, 1, 1], [32, 32, 32]);
        let clusters = ClusterScan::new(&grid).run();
        // 32^3 voxels in one cluster, claimed across several rescans
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].tag, tag::FIRST_CLUSTER);
        assert_eq!(clusters[0].voxels, 32 * 32 * 32);
    }
}
