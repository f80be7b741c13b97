//! Error taxonomy for the recommendation engine.
//!
//! Numerical failures inside the factorization never reach this type; they
//! are recovered where they happen (see `factorization::NumericalFailure`).

use data_loader::{CourseId, UserId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A malformed id was passed to the model
    #[error("Invalid input: {reason} (user {user_id}, course {course_id})")]
    InvalidInput {
        user_id: UserId,
        course_id: CourseId,
        reason: String,
    },

    /// Not enough ratings to train or evaluate
    #[error("Not enough data: need at least {required} ratings, found {available}")]
    InsufficientData { required: usize, available: usize },

    /// Evaluation produced no usable prediction for any held-out rating
    #[error("No predictions generated for {attempted} held-out ratings")]
    NoPredictions { attempted: usize },
}

pub type Result<T> = std::result::Result<T, EngineError>;
