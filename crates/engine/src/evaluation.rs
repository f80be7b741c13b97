//! Offline evaluation on a reproducible holdout split.
//!
//! A fresh model is trained on the training split only. RMSE covers every
//! held-out rating that produced a prediction; precision@K is averaged over
//! users that have held-out ratings.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::model::{train_with_config, TrainedModel};
use data_loader::{Rating, UserId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub rmse: f64,
    pub precision_at_k: f64,
    pub k: usize,
    pub train_size: usize,
    pub test_size: usize,
    /// Held-out ratings that produced a prediction
    pub predicted: usize,
}

#[derive(Debug, Clone)]
pub struct EvaluationHarness {
    config: EngineConfig,
}

impl EvaluationHarness {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Split `ratings` into train/test with the configured seed.
    ///
    /// The test split holds `ceil(len * test_ratio)` ratings. The same input
    /// and seed always give the same split.
    pub fn split(&self, ratings: &[Rating]) -> (Vec<Rating>, Vec<Rating>) {
        let mut order: Vec<usize> = (0..ratings.len()).collect();
        let mut rng = StdRng::seed_from_u64(self.config.split_seed);
        order.shuffle(&mut rng);

        let test_count = ((ratings.len() as f64) * self.config.test_ratio).ceil() as usize;
        let test_count = test_count.min(ratings.len());
        let (test, train) = order.split_at(test_count);
        (
            train.iter().map(|&i| ratings[i]).collect(),
            test.iter().map(|&i| ratings[i]).collect(),
        )
    }

    #[instrument(skip_all, fields(ratings = ratings.len()))]
    pub fn evaluate(&self, ratings: &[Rating]) -> Result<EvaluationReport> {
        let required = self.config.min_evaluation_ratings;
        if ratings.len() < required {
            return Err(EngineError::InsufficientData {
                required,
                available: ratings.len(),
            });
        }

        let (train, test) = self.split(ratings);
        let model = train_with_config(&train, &self.config).ok_or(EngineError::InsufficientData {
            required: self.config.min_training_ratings,
            available: train.len(),
        })?;

        let predictions = predict_held_out(&model, &test);
        if predictions.is_empty() {
            return Err(EngineError::NoPredictions {
                attempted: test.len(),
            });
        }

        let squared: f64 = predictions
            .iter()
            .map(|p| (p.predicted - p.actual).powi(2))
            .sum();
        let rmse = (squared / predictions.len() as f64).sqrt();
        let precision_at_k = self.precision_at_k(&predictions);

        info!(
            "Evaluated {} held-out ratings: rmse={:.4}, precision@{}={:.4}",
            predictions.len(),
            rmse,
            self.config.precision_k,
            precision_at_k
        );

        Ok(EvaluationReport {
            rmse,
            precision_at_k,
            k: self.config.precision_k,
            train_size: train.len(),
            test_size: test.len(),
            predicted: predictions.len(),
        })
    }

    /// Per-user precision of the top min(K, n) held-out predictions,
    /// averaged over users with at least one prediction
    fn precision_at_k(&self, predictions: &[HeldOut]) -> f64 {
        let mut by_user: BTreeMap<UserId, Vec<&HeldOut>> = BTreeMap::new();
        for p in predictions {
            by_user.entry(p.user_id).or_default().push(p);
        }

        let k = self.config.precision_k;
        let precisions: Vec<f64> = by_user
            .into_values()
            .filter_map(|mut held| {
                held.sort_by(|a, b| {
                    b.predicted
                        .partial_cmp(&a.predicted)
                        .unwrap_or(Ordering::Equal)
                });
                held.truncate(k);
                if held.is_empty() {
                    return None;
                }
                let relevant = held
                    .iter()
                    .filter(|p| p.actual >= self.config.positive_threshold)
                    .count();
                Some(relevant as f64 / held.len() as f64)
            })
            .collect();

        if precisions.is_empty() {
            0.0
        } else {
            precisions.iter().sum::<f64>() / precisions.len() as f64
        }
    }
}

/// Evaluate with the default configuration
pub fn evaluate(ratings: &[Rating]) -> Result<EvaluationReport> {
    EvaluationHarness::new(&EngineConfig::default()).evaluate(ratings)
}

#[derive(Debug, Clone, Copy)]
struct HeldOut {
    user_id: UserId,
    predicted: f64,
    actual: f64,
}

/// Predict every held-out rating, skipping the ones that fail
fn predict_held_out(model: &TrainedModel, test: &[Rating]) -> Vec<HeldOut> {
    test.iter()
        .filter_map(|r| match model.predict(r.user_id, r.course_id) {
            Ok(predicted) => Some(HeldOut {
                user_id: r.user_id,
                predicted,
                actual: r.rating,
            }),
            Err(e) => {
                warn!("Skipping held-out rating ({}, {}): {}", r.user_id, r.course_id, e);
                None
            }
        })
        .collect()
}
