//! Heuristic explanations for recommended courses.
//!
//! Three tiers, first match wins:
//! 1. `similar_users`: other users rated the course highly and share rated
//!    courses with the requesting user
//! 2. `similar_items`: the catalog has other courses in the same category
//! 3. `general`: a profile-based message with no count

use crate::config::EngineConfig;
use data_loader::{CourseId, CourseRepository, RatingRepository, UserId};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationKind {
    SimilarUsers,
    SimilarItems,
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    #[serde(rename = "type")]
    pub kind: ExplanationKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl Explanation {
    fn similar_users(count: usize) -> Self {
        Self {
            kind: ExplanationKind::SimilarUsers,
            message: "Users with similar preferences rated this course highly".to_string(),
            count: Some(count),
        }
    }

    fn similar_items(category: &str, count: usize) -> Self {
        Self {
            kind: ExplanationKind::SimilarItems,
            message: format!("Similar courses in {} category", category),
            count: Some(count),
        }
    }

    fn general() -> Self {
        Self {
            kind: ExplanationKind::General,
            message: "Recommended based on your profile".to_string(),
            count: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExplanationGenerator {
    positive_threshold: f64,
    collaborator_limit: usize,
    collaborator_sample: usize,
    similar_item_limit: usize,
}

impl ExplanationGenerator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            positive_threshold: config.positive_threshold,
            collaborator_limit: config.collaborator_limit,
            collaborator_sample: config.collaborator_sample,
            similar_item_limit: config.similar_item_limit,
        }
    }

    /// Explain why `course_id` was recommended to `user_id`
    #[instrument(skip(self, repo))]
    pub fn explain<R>(&self, repo: &R, user_id: UserId, course_id: CourseId) -> Explanation
    where
        R: RatingRepository + CourseRepository + ?Sized,
    {
        if let Some(count) = self.overlapping_collaborators(repo, user_id, course_id) {
            debug!("{} collaborators overlap with user {}", count, user_id);
            return Explanation::similar_users(count);
        }

        if let Some(course) = repo.course_by_id(course_id) {
            let peers = repo
                .courses_by_category(&course.category)
                .into_iter()
                .filter(|c| c.id != course_id)
                .take(self.similar_item_limit)
                .count();
            if peers > 0 {
                return Explanation::similar_items(&course.category, peers);
            }
        }

        Explanation::general()
    }

    /// Count sampled positive raters of the course who share at least one
    /// rated course with the user. `None` when there are none.
    fn overlapping_collaborators<R>(
        &self,
        repo: &R,
        user_id: UserId,
        course_id: CourseId,
    ) -> Option<usize>
    where
        R: RatingRepository + ?Sized,
    {
        let collaborators: Vec<UserId> = repo
            .ratings_by_course(course_id)
            .iter()
            .filter(|r| r.rating >= self.positive_threshold && r.user_id != user_id)
            .take(self.collaborator_limit)
            .map(|r| r.user_id)
            .collect();
        if collaborators.is_empty() {
            return None;
        }

        let rated: HashSet<CourseId> = repo
            .ratings_by_user(user_id)
            .iter()
            .map(|r| r.course_id)
            .collect();

        let overlapping = collaborators
            .iter()
            .take(self.collaborator_sample)
            .filter(|&&other| {
                repo.ratings_by_user(other)
                    .iter()
                    .any(|r| rated.contains(&r.course_id))
            })
            .count();

        (overlapping > 0).then_some(overlapping)
    }
}
