//! Ranking unrated courses for a user.
//!
//! Every course the user has not rated is scored, either by the trained
//! model or, when there is none, by `ColdStartFallback`. Scores are sorted
//! descending with a stable sort, so ties keep catalog order, and the top N
//! are returned.

use crate::cold_start::ColdStartFallback;
use crate::config::EngineConfig;
use crate::model::TrainedModel;
use data_loader::{Course, CourseId, Rating, UserId};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

/// A ranked course with its predicted rating and catalog metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub course_id: CourseId,
    pub predicted_rating: f64,
    pub title: String,
    pub description: String,
    pub category: String,
}

impl Recommendation {
    fn new(course: &Course, predicted_rating: f64) -> Self {
        Self {
            course_id: course.id,
            predicted_rating,
            title: course.title.clone(),
            description: course.description.clone(),
            category: course.category.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    Normal,
    /// The user has rated every course; terminal, not an error
    AllRated,
}

/// Which scorer produced the ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    Model,
    ColdStart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRecommendations {
    pub items: Vec<Recommendation>,
    pub status: RecommendationStatus,
    pub strategy: ScoringStrategy,
    /// Courses whose model prediction failed and were scored with the global mean
    pub fallbacks: usize,
}

/// Scores and ranks the unrated part of the catalog
#[derive(Debug, Clone)]
pub struct RecommendationRanker {
    top_n: usize,
    neutral_score: f64,
}

impl RecommendationRanker {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            top_n: config.top_n,
            neutral_score: config.neutral_score,
        }
    }

    /// Rank every catalog course `user_id` has not rated.
    ///
    /// `user_ratings` are the user's own ratings; they define the rated set
    /// and feed the cold-start averages when `model` is `None`.
    #[instrument(skip(self, model, catalog, user_ratings), fields(catalog_size = catalog.len()))]
    pub fn recommend(
        &self,
        model: Option<&TrainedModel>,
        user_id: UserId,
        catalog: &[&Course],
        user_ratings: &[Rating],
    ) -> RankedRecommendations {
        let strategy = match model {
            Some(_) => ScoringStrategy::Model,
            None => ScoringStrategy::ColdStart,
        };

        let rated: HashSet<CourseId> = user_ratings.iter().map(|r| r.course_id).collect();
        if catalog.iter().all(|c| rated.contains(&c.id)) {
            debug!("User {} has rated all {} courses", user_id, catalog.len());
            return RankedRecommendations {
                items: Vec::new(),
                status: RecommendationStatus::AllRated,
                strategy,
                fallbacks: 0,
            };
        }

        let unrated = catalog.iter().filter(|c| !rated.contains(&c.id));
        let mut fallbacks = 0;
        let mut scored: Vec<Recommendation> = match model {
            Some(model) => unrated
                .map(|course| {
                    let score = match model.predict(user_id, course.id) {
                        Ok(score) => score,
                        Err(e) => {
                            warn!("Prediction failed for course {}: {}", course.id, e);
                            fallbacks += 1;
                            model.global_mean()
                        }
                    };
                    Recommendation::new(course, score)
                })
                .collect(),
            None => {
                let fallback = ColdStartFallback::new(user_ratings, catalog, self.neutral_score);
                unrated
                    .map(|course| Recommendation::new(course, fallback.score(course)))
                    .collect()
            }
        };

        // Stable: equal scores keep catalog order
        scored.sort_by(|a, b| {
            b.predicted_rating
                .partial_cmp(&a.predicted_rating)
                .unwrap_or(Ordering::Equal)
        });
        scored.truncate(self.top_n);

        debug!(
            "Ranked {} courses for user {} ({:?}, {} fallbacks)",
            scored.len(),
            user_id,
            strategy,
            fallbacks
        );

        RankedRecommendations {
            items: scored,
            status: RecommendationStatus::Normal,
            strategy,
            fallbacks,
        }
    }
}
