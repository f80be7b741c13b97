//! Read-only query interfaces the recommendation engine consumes.
//!
//! The engine never reaches into storage on its own; callers hand it
//! something implementing these traits. `DataIndex` is the in-memory
//! implementation.

use crate::types::{Course, CourseId, DataIndex, Rating, UserId};

/// Queries over stored ratings
pub trait RatingRepository {
    /// Every rating in the store
    fn all_ratings(&self) -> Vec<Rating>;

    /// Ratings made by one user
    fn ratings_by_user(&self, user_id: UserId) -> &[Rating];

    /// Ratings received by one course, in the order they were recorded
    fn ratings_by_course(&self, course_id: CourseId) -> &[Rating];
}

/// Queries over the course catalog
pub trait CourseRepository {
    /// The full catalog in iteration order
    fn all_courses(&self) -> Vec<&Course>;

    fn course_by_id(&self, course_id: CourseId) -> Option<&Course>;

    /// Courses sharing a category, in catalog order
    fn courses_by_category(&self, category: &str) -> Vec<&Course>;
}

impl RatingRepository for DataIndex {
    fn all_ratings(&self) -> Vec<Rating> {
        self.get_all_ratings()
    }

    fn ratings_by_user(&self, user_id: UserId) -> &[Rating] {
        self.get_user_ratings(user_id)
    }

    fn ratings_by_course(&self, course_id: CourseId) -> &[Rating] {
        self.get_course_ratings(course_id)
    }
}

impl CourseRepository for DataIndex {
    fn all_courses(&self) -> Vec<&Course> {
        self.courses().collect()
    }

    fn course_by_id(&self, course_id: CourseId) -> Option<&Course> {
        self.get_course(course_id)
    }

    fn courses_by_category(&self, category: &str) -> Vec<&Course> {
        self.get_courses_by_category(category)
            .iter()
            .filter_map(|&id| self.get_course(id))
            .collect()
    }
}
