//! Category-average scoring used when no trained model exists.

use data_loader::{Course, CourseId, Rating};
use std::collections::HashMap;

/// Scores courses by the requesting user's own average rating per category.
///
/// A category the user has never rated scores the neutral value.
#[derive(Debug, Clone)]
pub struct ColdStartFallback {
    averages: HashMap<String, f64>,
    neutral_score: f64,
}

impl ColdStartFallback {
    /// Group the user's ratings by the category of each rated course.
    ///
    /// Ratings for courses missing from the catalog are ignored.
    pub fn new(user_ratings: &[Rating], catalog: &[&Course], neutral_score: f64) -> Self {
        let categories: HashMap<CourseId, &str> = catalog
            .iter()
            .map(|c| (c.id, c.category.as_str()))
            .collect();

        let mut sums: HashMap<String, (f64, u32)> = HashMap::new();
        for rating in user_ratings {
            if let Some(&category) = categories.get(&rating.course_id) {
                let entry = sums.entry(category.to_string()).or_insert((0.0, 0));
                entry.0 += rating.rating;
                entry.1 += 1;
            }
        }

        let averages = sums
            .into_iter()
            .map(|(category, (sum, count))| (category, sum / count as f64))
            .collect();

        Self {
            averages,
            neutral_score,
        }
    }

    /// The user's average rating in a category, if they rated any course in it
    pub fn category_average(&self, category: &str) -> Option<f64> {
        self.averages.get(category).copied()
    }

    pub fn score(&self, course: &Course) -> f64 {
        self.category_average(&course.category)
            .unwrap_or(self.neutral_score)
    }
}
