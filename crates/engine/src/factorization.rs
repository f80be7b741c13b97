//! Low-rank factorization of the mean-centered rating matrix.
//!
//! The normalized matrix is approximated by a truncated SVD, `U S Vt`.
//! Singular value mass is split evenly between the two sides,
//! `user_factors = U sqrt(S)` and `course_factors = (sqrt(S) Vt)^T`, so the
//! interaction term of a prediction is a plain dot product.
//!
//! Degenerate input and numerical failure both produce all-zero factors:
//! the model then predicts from bias terms alone.

use crate::config::EngineConfig;
use nalgebra::{DMatrix, SVD};
use std::cmp::Ordering;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Why a decomposition could not be used. Recovered locally, never surfaced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericalFailure {
    #[error("SVD did not converge within {max_iterations} iterations")]
    NonConvergence { max_iterations: usize },

    #[error("rank {rank} must be in 1..{min_dim}")]
    InvalidRank { rank: usize, min_dim: usize },

    #[error("SVD did not return singular vectors")]
    MissingVectors,

    #[error("decomposition produced non-finite values")]
    NonFinite,
}

/// User and course latent factors, one row per matrix position
#[derive(Debug, Clone, PartialEq)]
pub struct LatentFactors {
    pub user_factors: DMatrix<f64>,
    pub course_factors: DMatrix<f64>,
}

impl LatentFactors {
    /// All-zero factors of the given shape
    pub fn zeros(n_users: usize, n_courses: usize, rank: usize) -> Self {
        Self {
            user_factors: DMatrix::zeros(n_users, rank),
            course_factors: DMatrix::zeros(n_courses, rank),
        }
    }

    /// Number of latent dimensions
    pub fn rank(&self) -> usize {
        self.user_factors.ncols()
    }

    /// True when the factors carry no interaction signal
    pub fn is_zero(&self) -> bool {
        self.user_factors.iter().all(|&v| v == 0.0) || self.course_factors.iter().all(|&v| v == 0.0)
    }

    /// Dot product of a user's and a course's factor rows
    pub fn interaction(&self, user_pos: usize, course_pos: usize) -> f64 {
        (0..self.rank())
            .map(|f| self.user_factors[(user_pos, f)] * self.course_factors[(course_pos, f)])
            .sum()
    }
}

/// `min(max_factors, min(n_users, n_courses) - 1)`, never below 1
pub fn factor_count(n_users: usize, n_courses: usize, max_factors: usize) -> usize {
    let min_dim = n_users.min(n_courses);
    max_factors.min(min_dim.saturating_sub(1)).max(1)
}

/// Produces latent factors from a normalized rating matrix
#[derive(Debug, Clone)]
pub struct FactorizationEngine {
    max_factors: usize,
    min_signal_entries: usize,
    max_iterations: usize,
}

impl FactorizationEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_factors: config.max_factors,
            min_signal_entries: config.min_signal_entries,
            max_iterations: config.svd_max_iterations,
        }
    }

    /// Factorize, falling back to zero factors when the data is degenerate
    /// (a single user, or too few nonzero centered cells) or the
    /// decomposition fails.
    #[instrument(skip_all, fields(users = normalized.nrows(), courses = normalized.ncols()))]
    pub fn factorize(&self, normalized: &DMatrix<f64>) -> LatentFactors {
        let (n_users, n_courses) = normalized.shape();
        let k = factor_count(n_users, n_courses, self.max_factors);

        let signal = normalized.iter().filter(|&&v| v != 0.0).count();
        if n_users == 1 || signal < self.min_signal_entries {
            debug!(
                "Degenerate data (users={}, signal={}), using bias-only factors",
                n_users, signal
            );
            return LatentFactors::zeros(n_users, n_courses, k);
        }

        match truncated_svd(normalized, k, self.max_iterations) {
            Ok(factors) => {
                debug!("Factorized with rank {}", factors.rank());
                factors
            }
            Err(failure) => {
                warn!("Factorization failed ({}), using bias-only factors", failure);
                LatentFactors::zeros(n_users, n_courses, k)
            }
        }
    }
}

/// Rank-`rank` SVD of `matrix`, keeping the largest singular values.
///
/// `rank` must satisfy `0 < rank < min(nrows, ncols)`.
pub fn truncated_svd(
    matrix: &DMatrix<f64>,
    rank: usize,
    max_iterations: usize,
) -> Result<LatentFactors, NumericalFailure> {
    let (n_rows, n_cols) = matrix.shape();
    let min_dim = n_rows.min(n_cols);
    if rank == 0 || rank >= min_dim {
        return Err(NumericalFailure::InvalidRank { rank, min_dim });
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(NumericalFailure::NonFinite);
    }

    let svd = SVD::try_new(matrix.clone(), true, true, f64::EPSILON, max_iterations)
        .ok_or(NumericalFailure::NonConvergence { max_iterations })?;
    let u = svd.u.ok_or(NumericalFailure::MissingVectors)?;
    let v_t = svd.v_t.ok_or(NumericalFailure::MissingVectors)?;
    let sigma = svd.singular_values;

    // Solver ordering is not relied on; select the largest values explicitly
    let mut order: Vec<usize> = (0..sigma.len()).collect();
    order.sort_by(|&a, &b| sigma[b].partial_cmp(&sigma[a]).unwrap_or(Ordering::Equal));
    order.truncate(rank);

    let roots: Vec<f64> = order.iter().map(|&i| sigma[i].max(0.0).sqrt()).collect();
    let user_factors = DMatrix::from_fn(n_rows, rank, |r, f| u[(r, order[f])] * roots[f]);
    let course_factors = DMatrix::from_fn(n_cols, rank, |c, f| v_t[(order[f], c)] * roots[f]);

    if user_factors.iter().chain(course_factors.iter()).any(|v| !v.is_finite()) {
        return Err(NumericalFailure::NonFinite);
    }

    Ok(LatentFactors {
        user_factors,
        course_factors,
    })
}
