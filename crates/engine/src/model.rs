//! The trained model snapshot and the training pipeline that builds it.
//!
//! ratings -> RatingMatrix -> BiasTerms -> normalize -> FactorizationEngine
//! -> TrainedModel
//!
//! A `TrainedModel` is immutable. When the rating set changes a new one is
//! trained from scratch and replaces the old snapshot.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::factorization::{FactorizationEngine, LatentFactors};
use crate::matrix::{normalize, BiasTerms, IdIndex, RatingMatrix};
use data_loader::{CourseId, Rating, UserId, MAX_RATING, MIN_RATING};
use tracing::{info, instrument};

/// Immutable bias + latent factor model
#[derive(Debug, Clone)]
pub struct TrainedModel {
    users: IdIndex,
    courses: IdIndex,
    bias: BiasTerms,
    factors: LatentFactors,
}

impl TrainedModel {
    /// Run the pipeline on a rating set without the minimum-size check.
    ///
    /// Returns `None` only for an empty rating set. Most callers want
    /// [`train`], which applies the configured minimum.
    pub fn fit(ratings: &[Rating], config: &EngineConfig) -> Option<Self> {
        if ratings.is_empty() {
            return None;
        }

        let matrix = RatingMatrix::build(ratings);
        let bias = BiasTerms::compute(ratings, &matrix);
        let normalized = normalize(&matrix, &bias);
        let factors = FactorizationEngine::new(config).factorize(&normalized);

        Some(Self {
            users: matrix.users,
            courses: matrix.courses,
            bias,
            factors,
        })
    }

    pub fn global_mean(&self) -> f64 {
        self.bias.global_mean
    }

    pub fn users(&self) -> &IdIndex {
        &self.users
    }

    pub fn courses(&self) -> &IdIndex {
        &self.courses
    }

    pub fn bias(&self) -> &BiasTerms {
        &self.bias
    }

    pub fn factors(&self) -> &LatentFactors {
        &self.factors
    }

    /// Number of latent dimensions
    pub fn rank(&self) -> usize {
        self.factors.rank()
    }

    /// Predict the rating `user_id` would give `course_id`.
    ///
    /// Unknown users or courses get the global mean. Known pairs get
    /// `global + user_bias + course_bias + <user_factors, course_factors>`
    /// clamped to the rating scale. Id 0 is malformed and rejected.
    pub fn predict(&self, user_id: UserId, course_id: CourseId) -> Result<f64> {
        if user_id == 0 || course_id == 0 {
            return Err(EngineError::InvalidInput {
                user_id,
                course_id,
                reason: "id 0 is reserved".to_string(),
            });
        }

        let (u, c) = match (self.users.position(user_id), self.courses.position(course_id)) {
            (Some(u), Some(c)) => (u, c),
            _ => return Ok(self.bias.global_mean),
        };

        let prediction = self.bias.global_mean
            + self.bias.user_bias(u)
            + self.bias.course_bias(c)
            + self.factors.interaction(u, c);
        Ok(prediction.clamp(MIN_RATING, MAX_RATING))
    }
}

/// Train with the default configuration
pub fn train(ratings: &[Rating]) -> Option<TrainedModel> {
    train_with_config(ratings, &EngineConfig::default())
}

/// Train a model, or return `None` when there are too few ratings
#[instrument(skip_all, fields(ratings = ratings.len()))]
pub fn train_with_config(ratings: &[Rating], config: &EngineConfig) -> Option<TrainedModel> {
    if ratings.len() < config.min_training_ratings {
        info!(
            "Not training: {} ratings, need at least {}",
            ratings.len(),
            config.min_training_ratings
        );
        return None;
    }

    let model = TrainedModel::fit(ratings, config)?;
    info!(
        "Trained model: {} users, {} courses, rank {}{}",
        model.users.len(),
        model.courses.len(),
        model.rank(),
        if model.factors.is_zero() { " (bias only)" } else { "" }
    );
    Some(model)
}
