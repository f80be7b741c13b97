//! # Recommendation Service
//!
//! Owns the course store and the current model snapshot, and exposes the
//! application operations on top of them.
//!
//! ## Consistency
//!
//! The store sits behind an `RwLock`; the snapshot is an
//! `RwLock<Option<Arc<TrainedModel>>>`. Every mutation holds the store write
//! lock while it changes the data, retrains from the full rating set and
//! swaps the snapshot. Readers therefore see either the old or the new model,
//! never one built from a half-applied change. Locks are always taken store
//! first, then model.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use data_loader::{
    is_valid_rating, Course, CourseId, DataIndex, DataLoadError, Rating, User, UserId,
};
use engine::{
    train_with_config, EngineConfig, EvaluationHarness, EvaluationReport, Explanation,
    ExplanationGenerator, Recommendation, RecommendationRanker, RecommendationStatus,
    ScoringStrategy, TrainedModel,
};

pub const ALL_RATED_MESSAGE: &str = "You have rated all available courses!";

/// Lookup and validation failures reported to callers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error("Course {0} not found")]
    CourseNotFound(CourseId),

    #[error("Rating by user {user_id} for course {course_id} not found")]
    RatingNotFound { user_id: UserId, course_id: CourseId },

    #[error("Invalid value for {field}: {value}")]
    InvalidField { field: String, value: String },

    #[error("Rating {0} is outside [1.0, 5.0]")]
    InvalidRating(f64),

    #[error("No trained model: not enough ratings")]
    NoModel,
}

/// Recommendations for one user with an explanation per item
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
    pub explanations: BTreeMap<CourseId, Explanation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip)]
    pub status: RecommendationStatus,
    #[serde(skip)]
    pub strategy: ScoringStrategy,
}

/// Evaluation metrics rounded to four decimals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsResponse {
    pub rmse: f64,
    pub top_k_precision: f64,
}

impl From<&EvaluationReport> for MetricsResponse {
    fn from(report: &EvaluationReport) -> Self {
        Self {
            rmse: round4(report.rmse),
            top_k_precision: round4(report.precision_at_k),
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

pub struct RecommendationService {
    store: RwLock<DataIndex>,
    model: RwLock<Option<Arc<TrainedModel>>>,
    config: EngineConfig,
    ranker: RecommendationRanker,
    explainer: ExplanationGenerator,
}

impl RecommendationService {
    /// Create a service over an existing store.
    ///
    /// No model is trained yet; the first recommendation trains one.
    pub fn new(store: DataIndex, config: EngineConfig) -> Self {
        Self {
            ranker: RecommendationRanker::new(&config),
            explainer: ExplanationGenerator::new(&config),
            store: RwLock::new(store),
            model: RwLock::new(None),
            config,
        }
    }

    /// Load the store from `data_dir`
    pub fn open(data_dir: &Path, config: EngineConfig) -> Result<Self> {
        let store = DataIndex::load_from_files(data_dir)
            .with_context(|| format!("Failed to load data from {}", data_dir.display()))?;
        Ok(Self::new(store, config))
    }

    /// Top up a small catalog with the sample courses; returns how many were added
    pub fn seed_sample_courses(&self) -> usize {
        let seeded = self.store.write().seed_sample_courses();
        if seeded > 0 {
            info!("Seeded {} sample courses", seeded);
        }
        seeded
    }

    /// Write the store to `data_dir`
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let store = self.store.read();
        store
            .save_to_files(data_dir)
            .with_context(|| format!("Failed to save data to {}", data_dir.display()))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// (users, courses, ratings)
    pub fn counts(&self) -> (usize, usize, usize) {
        self.store.read().counts()
    }

    /// The current model snapshot, if one has been trained
    pub fn model(&self) -> Option<Arc<TrainedModel>> {
        self.model.read().clone()
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Register a user; the store is unchanged if a field could not be saved
    pub fn create_user(
        &self,
        name: &str,
        interests: Vec<String>,
        skills: Vec<String>,
        time_per_week: u32,
    ) -> Result<UserId> {
        let id = self
            .store
            .write()
            .create_user(name, interests, skills, time_per_week)
            .map_err(|e| match e {
                DataLoadError::InvalidValue { field, value } => {
                    anyhow::Error::from(ServiceError::InvalidField { field, value })
                }
                other => anyhow::Error::from(other),
            })?;
        info!("Created user {} ({})", id, name);
        Ok(id)
    }

    /// All user ids in ascending order
    pub fn user_ids(&self) -> Vec<UserId> {
        self.store.read().users().iter().map(|u| u.id).collect()
    }

    pub fn user(&self, user_id: UserId) -> Result<User> {
        let store = self.store.read();
        let user = store
            .get_user(user_id)
            .ok_or(ServiceError::UserNotFound(user_id))?;
        Ok(user.clone())
    }

    /// Delete a user and all their ratings, then retrain
    pub fn delete_user(&self, user_id: UserId) -> Result<usize> {
        let mut store = self.store.write();
        let (user, removed) = store
            .remove_user(user_id)
            .ok_or(ServiceError::UserNotFound(user_id))?;
        info!("Deleted user {} ({}) and {} ratings", user_id, user.name, removed);
        self.retrain(&store);
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Catalog and ratings
    // ------------------------------------------------------------------

    /// The catalog in id order
    pub fn courses(&self) -> Vec<Course> {
        self.store.read().courses().cloned().collect()
    }

    pub fn ratings_for_user(&self, user_id: UserId) -> Vec<Rating> {
        self.store.read().get_user_ratings(user_id).to_vec()
    }

    /// Create or update a rating, then retrain.
    ///
    /// Returns the previous value when an existing rating was updated.
    pub fn rate(&self, user_id: UserId, course_id: CourseId, rating: f64) -> Result<Option<f64>> {
        if !is_valid_rating(rating) {
            return Err(ServiceError::InvalidRating(rating).into());
        }

        let mut store = self.store.write();
        if store.get_user(user_id).is_none() {
            return Err(ServiceError::UserNotFound(user_id).into());
        }
        if store.get_course(course_id).is_none() {
            return Err(ServiceError::CourseNotFound(course_id).into());
        }

        let previous = store.upsert_rating(Rating::new(user_id, course_id, rating));
        debug!(
            "User {} rated course {}: {} (previous {:?})",
            user_id, course_id, rating, previous
        );
        self.retrain(&store);
        Ok(previous)
    }

    /// Remove a rating, then retrain
    pub fn unrate(&self, user_id: UserId, course_id: CourseId) -> Result<Rating> {
        let mut store = self.store.write();
        let removed = store
            .remove_rating(user_id, course_id)
            .ok_or(ServiceError::RatingNotFound { user_id, course_id })?;
        self.retrain(&store);
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Model
    // ------------------------------------------------------------------

    /// Retrain from the full rating set and swap the snapshot.
    ///
    /// Callers hold the store write lock, which serializes retraining.
    fn retrain(&self, store: &DataIndex) {
        let start = Instant::now();
        let model = train_with_config(&store.get_all_ratings(), &self.config).map(Arc::new);
        let trained = model.is_some();
        *self.model.write() = model;
        debug!("Retrained (model: {}) in {:.2?}", trained, start.elapsed());
    }

    /// The current snapshot, training one first if none exists
    fn ensure_model(&self, store: &DataIndex) -> Option<Arc<TrainedModel>> {
        if let Some(model) = self.model.read().clone() {
            return Some(model);
        }

        let mut slot = self.model.write();
        if slot.is_none() {
            debug!("No model snapshot, training lazily");
            *slot = train_with_config(&store.get_all_ratings(), &self.config).map(Arc::new);
        }
        slot.clone()
    }

    /// Predict a single (user, course) rating with the current snapshot
    pub fn predict(&self, user_id: UserId, course_id: CourseId) -> Result<f64> {
        let store = self.store.read();
        let model = self.ensure_model(&store).ok_or(ServiceError::NoModel)?;
        Ok(model.predict(user_id, course_id)?)
    }

    // ------------------------------------------------------------------
    // Recommendations and metrics
    // ------------------------------------------------------------------

    /// Top-N recommendations for a user, each with an explanation
    #[instrument(skip(self))]
    pub fn recommend(&self, user_id: UserId) -> RecommendationResponse {
        let start = Instant::now();
        let store = self.store.read();
        let model = self.ensure_model(&store);

        let catalog: Vec<&Course> = store.courses().collect();
        let ranked = self.ranker.recommend(
            model.as_deref(),
            user_id,
            &catalog,
            store.get_user_ratings(user_id),
        );

        let explanations = ranked
            .items
            .iter()
            .map(|rec| {
                (
                    rec.course_id,
                    self.explainer.explain(&*store, user_id, rec.course_id),
                )
            })
            .collect();

        let message = match ranked.status {
            RecommendationStatus::AllRated => Some(ALL_RATED_MESSAGE.to_string()),
            RecommendationStatus::Normal => None,
        };

        info!(
            "Recommended {} courses to user {} in {:.2?}",
            ranked.items.len(),
            user_id,
            start.elapsed()
        );

        RecommendationResponse {
            recommendations: ranked.items,
            explanations,
            message,
            status: ranked.status,
            strategy: ranked.strategy,
        }
    }

    /// Holdout evaluation over every stored rating
    pub fn metrics(&self) -> Result<EvaluationReport> {
        let ratings = self.store.read().get_all_ratings();
        let report = EvaluationHarness::new(&self.config)
            .evaluate(&ratings)
            .context("Failed to compute metrics")?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> RecommendationService {
        let mut store = DataIndex::new();
        let catalog = [
            ("Docker and Containerization", "DevOps"),
            ("Kubernetes Mastery", "DevOps"),
            ("Python for Data Analysis", "Data Science"),
            ("Figma Design Mastery", "UI/UX Design"),
        ];
        for (i, (title, category)) in catalog.iter().enumerate() {
            store.insert_course(Course {
                id: i as CourseId + 1,
                title: title.to_string(),
                description: String::new(),
                category: category.to_string(),
            });
        }
        RecommendationService::new(store, EngineConfig::default())
    }

    fn service_error(err: &anyhow::Error) -> Option<&ServiceError> {
        err.downcast_ref::<ServiceError>()
    }

    #[test]
    fn test_cold_start_without_ratings() {
        let service = create_test_service();
        let user = service.create_user("Ada", vec![], vec![], 5).unwrap();

        let response = service.recommend(user);
        assert_eq!(response.strategy, ScoringStrategy::ColdStart);
        assert_eq!(response.recommendations.len(), 4);
        assert_eq!(response.explanations.len(), 4);
        assert!(response.message.is_none());
        assert!(service.model().is_none());
    }

    #[test]
    fn test_rating_retrains() {
        let service = create_test_service();
        let a = service.create_user("A", vec![], vec![], 1).unwrap();
        let b = service.create_user("B", vec![], vec![], 1).unwrap();

        service.rate(a, 1, 5.0).unwrap();
        service.rate(a, 2, 4.0).unwrap();
        assert!(service.model().is_none());

        service.rate(b, 1, 3.0).unwrap();
        let model = service.model().unwrap();
        assert_eq!(model.users().len(), 2);

        let response = service.recommend(a);
        assert_eq!(response.strategy, ScoringStrategy::Model);
        let ids: Vec<CourseId> = response.recommendations.iter().map(|r| r.course_id).collect();
        assert!(!ids.contains(&1) && !ids.contains(&2));
    }

    #[test]
    fn test_upsert_returns_previous() {
        let service = create_test_service();
        let user = service.create_user("A", vec![], vec![], 1).unwrap();

        assert_eq!(service.rate(user, 1, 2.0).unwrap(), None);
        assert_eq!(service.rate(user, 1, 4.5).unwrap(), Some(2.0));
        assert_eq!(service.ratings_for_user(user).len(), 1);
    }

    #[test]
    fn test_rate_validation() {
        let service = create_test_service();
        let user = service.create_user("A", vec![], vec![], 1).unwrap();

        let err = service.rate(user, 1, 0.0).unwrap_err();
        assert_eq!(service_error(&err), Some(&ServiceError::InvalidRating(0.0)));

        let err = service.rate(99, 1, 3.0).unwrap_err();
        assert_eq!(service_error(&err), Some(&ServiceError::UserNotFound(99)));

        let err = service.rate(user, 99, 3.0).unwrap_err();
        assert_eq!(service_error(&err), Some(&ServiceError::CourseNotFound(99)));
    }

    #[test]
    fn test_unrate_missing() {
        let service = create_test_service();
        let err = service.unrate(1, 1).unwrap_err();
        assert_eq!(
            service_error(&err),
            Some(&ServiceError::RatingNotFound { user_id: 1, course_id: 1 })
        );
    }

    #[test]
    fn test_all_rated_message() {
        let service = create_test_service();
        let user = service.create_user("A", vec![], vec![], 1).unwrap();
        for course in 1..=4 {
            service.rate(user, course, 4.0).unwrap();
        }

        let response = service.recommend(user);
        assert!(response.recommendations.is_empty());
        assert!(response.explanations.is_empty());
        assert_eq!(response.status, RecommendationStatus::AllRated);
        assert_eq!(response.message.as_deref(), Some(ALL_RATED_MESSAGE));
    }

    #[test]
    fn test_delete_user_drops_from_model() {
        let service = create_test_service();
        let a = service.create_user("A", vec![], vec![], 1).unwrap();
        let b = service.create_user("B", vec![], vec![], 1).unwrap();
        let c = service.create_user("C", vec![], vec![], 1).unwrap();
        service.rate(a, 1, 5.0).unwrap();
        service.rate(b, 1, 3.0).unwrap();
        service.rate(b, 2, 4.0).unwrap();
        service.rate(c, 3, 2.0).unwrap();
        service.rate(c, 1, 1.0).unwrap();

        assert_eq!(service.delete_user(c).unwrap(), 2);
        let model = service.model().unwrap();
        assert!(!model.users().contains(c));
        assert_eq!(service.predict(c, 1).unwrap(), model.global_mean());

        let err = service.user(c).unwrap_err();
        assert_eq!(service_error(&err), Some(&ServiceError::UserNotFound(c)));
    }

    #[test]
    fn test_create_user_rejects_unsavable_name() {
        let service = create_test_service();
        let err = service
            .create_user("Bad::Name", vec![], vec![], 1)
            .unwrap_err();
        assert_eq!(
            service_error(&err),
            Some(&ServiceError::InvalidField {
                field: "name".to_string(),
                value: "Bad::Name".to_string(),
            })
        );
        assert_eq!(service.counts().0, 0);

        let err = service
            .create_user("Ada", vec!["ml,rust".to_string()], vec![], 1)
            .unwrap_err();
        assert!(matches!(
            service_error(&err),
            Some(ServiceError::InvalidField { field, .. }) if field == "interests"
        ));
    }

    #[test]
    fn test_create_user_after_max_id() {
        let mut store = DataIndex::new();
        store.insert_user(User {
            id: UserId::MAX,
            name: "Last".to_string(),
            interests: vec![],
            skills: vec![],
            time_per_week: 0,
        });
        let service = RecommendationService::new(store, EngineConfig::default());

        let err = service.create_user("Cy", vec![], vec![], 1).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataLoadError>(),
            Some(DataLoadError::IdSpaceExhausted { .. })
        ));
        assert_eq!(service.user_ids(), vec![UserId::MAX]);
    }

    #[test]
    fn test_metrics_need_ten_ratings() {
        let service = create_test_service();
        let user = service.create_user("A", vec![], vec![], 1).unwrap();
        service.rate(user, 1, 4.0).unwrap();

        let err = service.metrics().unwrap_err();
        let engine_err = err.downcast_ref::<engine::EngineError>().unwrap();
        assert!(matches!(engine_err, engine::EngineError::InsufficientData { .. }));
    }

    #[test]
    fn test_metrics_rounding() {
        let report = EvaluationReport {
            rmse: 0.123456,
            precision_at_k: 2.0 / 3.0,
            k: 5,
            train_size: 8,
            test_size: 2,
            predicted: 2,
        };
        let metrics = MetricsResponse::from(&report);
        assert_eq!(metrics.rmse, 0.1235);
        assert_eq!(metrics.top_k_precision, 0.6667);
    }

    #[test]
    fn test_response_json_shape() {
        let service = create_test_service();
        let user = service.create_user("A", vec![], vec![], 1).unwrap();

        let json = serde_json::to_value(service.recommend(user)).unwrap();
        assert!(json["recommendations"].is_array());
        assert_eq!(json["explanations"]["1"]["type"], "similar_items");
        assert!(json.get("message").is_none());
        assert!(json.get("status").is_none());
    }
}
