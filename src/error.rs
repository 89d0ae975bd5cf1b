//! Error types for the solvox crate.

use thiserror::Error;

/// Main error type for solvox operations.
#[derive(Debug, Error)]
#[allow(missing_docs)] // Variant fields are described by their #[error] messages
pub enum SolvoxError {
    /// Grid shape with a zero axis or an overflowing voxel count.
    #[error("Invalid grid shape {nx}x{ny}x{nz}: {reason}")]
    InvalidGrid {
        nx: usize,
        ny: usize,
        nz: usize,
        reason: String,
    },

    /// A scalar parameter outside its allowed range.
    #[error("Invalid {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Voxel storage could not be allocated.
    #[error("Failed to allocate storage for {voxels} voxels")]
    Allocation { voxels: usize },

    /// Flat atom array whose length is not a multiple of four.
    #[error("Flat atom array of length {len} does not split into (x, y, z, r) records")]
    MalformedAtomData { len: usize },

    /// Residue label table and atom array disagree in length.
    #[error("Residue label table has {labels} entries for {atoms} atoms")]
    LabelMismatch { labels: usize, atoms: usize },

    /// Worker thread pool construction failed.
    #[error("Thread pool error: {reason}")]
    ThreadPool { reason: String },
}

/// Result type alias for solvox operations.
pub type Result<T> = std::result::Result<T, SolvoxError>;

// === Validation Helpers ===

/// Check that a value is positive.
#[inline]
pub fn check_positive(value: f64, name: &str) -> Result<()> {
    if value <= 0.0 {
        return Err(SolvoxError::InvalidParameter {
            name: name.to_string(),
            reason: format!("must be positive, got {value}"),
        });
    }
    Ok(())
}

/// Check that a value is non-negative.
#[inline]
pub fn check_non_negative(value: f64, name: &str) -> Result<()> {
    if value < 0.0 {
        return Err(SolvoxError::InvalidParameter {
            name: name.to_string(),
            reason: format!("must be non-negative, got {value}"),
        });
    }
    Ok(())
}

/// Check that a worker thread count is usable.
#[inline]
pub fn check_thread_count(n_threads: usize) -> Result<()> {
    if n_threads == 0 {
        return Err(SolvoxError::InvalidParameter {
            name: "n_threads".to_string(),
            reason: "must be positive, got 0".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_variants_display() {
        let test_cases: Vec<(SolvoxError, &[&str])> = vec![
            (
                SolvoxError::InvalidGrid {
                    nx: 0,
                    ny: 4,
                    nz: 4,
                    reason: "every axis must be positive".to_string(),
                },
                &["0x4x4", "positive"],
            ),
            (
                SolvoxError::InvalidParameter {
                    name: "step".to_string(),
                    reason: "must be positive, got -1".to_string(),
                },
                &["step", "positive", "-1"],
            ),
            (
                SolvoxError::Allocation { voxels: 1_000_000 },
                &["allocate", "1000000"],
            ),
            (
                SolvoxError::MalformedAtomData { len: 7 },
                &["length 7", "(x, y, z, r)"],
            ),
            (
                SolvoxError::LabelMismatch {
                    labels: 3,
                    atoms: 5,
                },
                &["3 entries", "5 atoms"],
            ),
            (
                SolvoxError::ThreadPool {
                    reason: "too many threads".to_string(),
                },
                &["pool", "too many threads"],
            ),
        ];

        for (err, expected_substrings) in test_cases {
            let msg = err.to_string();
            for substring in expected_substrings {
                assert!(
                    msg.to_lowercase().contains(&substring.to_lowercase()),
                    "Error message '{}' should contain '{}'",
                    msg,
                    substring
                );
            }
        }
    }

    #[test]
    fn test_check_helpers() {
        assert!(check_positive(0.5, "step").is_ok());
        assert!(check_positive(0.0, "step").is_err());
        assert!(check_non_negative(0.0, "probe").is_ok());
        assert!(check_non_negative(-0.1, "probe").is_err());
        assert!(check_thread_count(1).is_ok());
        assert!(check_thread_count(0).is_err());
    }
}
