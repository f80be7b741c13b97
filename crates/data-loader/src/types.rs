//! Core domain types for the course catalog.
//!
//! This module defines the records the store holds (users, courses and the
//! explicit ratings linking them) and `DataIndex`, the in-memory store with
//! its lookup indices.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user. Issued from 1 upward; 0 is never valid.
pub type UserId = u32;

/// Unique identifier for a course. Issued from 1 upward; 0 is never valid.
pub type CourseId = u32;

/// Lowest rating a user can give
pub const MIN_RATING: f64 = 1.0;

/// Highest rating a user can give
pub const MAX_RATING: f64 = 5.0;

/// Returns true if `value` is a finite rating within [MIN_RATING, MAX_RATING]
pub fn is_valid_rating(value: f64) -> bool {
    value.is_finite() && (MIN_RATING..=MAX_RATING).contains(&value)
}

// =============================================================================
// Records
// =============================================================================

/// A learner profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub interests: Vec<String>,
    pub skills: Vec<String>,
    /// Hours per week the learner can spend on courses
    pub time_per_week: u32,
}

/// A catalog item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub category: String,
}

/// A single explicit rating of a course by a user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub course_id: CourseId,
    /// Rating value from 1.0 to 5.0
    pub rating: f64,
}

impl Rating {
    pub fn new(user_id: UserId, course_id: CourseId, rating: f64) -> Self {
        Self {
            user_id,
            course_id,
            rating,
        }
    }
}

// =============================================================================
// DataIndex - The In-Memory Store
// =============================================================================

/// Holds all users, courses and ratings plus the indices used to query them.
///
/// Courses live in a `BTreeMap` so iterating the catalog always walks it in
/// ascending id order. Rating lists keep insertion order.
#[derive(Debug, Clone)]
pub struct DataIndex {
    pub(crate) users: HashMap<UserId, User>,
    pub(crate) courses: BTreeMap<CourseId, Course>,

    /// All ratings made by each user
    pub(crate) user_ratings: HashMap<UserId, Vec<Rating>>,
    /// All ratings received by each course
    pub(crate) course_ratings: HashMap<CourseId, Vec<Rating>>,

    /// Course ids grouped by category, ascending
    pub(crate) category_index: HashMap<String, Vec<CourseId>>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
            courses: BTreeMap::new(),
            user_ratings: HashMap::new(),
            course_ratings: HashMap::new(),
            category_index: HashMap::new(),
        }
    }

    /// Get a user by ID
    pub fn get_user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    /// Get a course by ID
    pub fn get_course(&self, id: CourseId) -> Option<&Course> {
        self.courses.get(&id)
    }

    /// Iterate the catalog in ascending id order
    pub fn courses(&self) -> impl Iterator<Item = &Course> {
        self.courses.values()
    }

    /// All users, ordered by id
    pub fn users(&self) -> Vec<&User> {
        let mut users: Vec<&User> = self.users.values().collect();
        users.sort_by_key(|u| u.id);
        users
    }

    /// Get all ratings made by a user
    ///
    /// Returns an empty slice if the user has no ratings
    pub fn get_user_ratings(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all ratings for a course, in the order they were recorded
    pub fn get_course_ratings(&self, course_id: CourseId) -> &[Rating] {
        self.course_ratings
            .get(&course_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get the ids of all courses in a category
    pub fn get_courses_by_category(&self, category: &str) -> &[CourseId] {
        self.category_index
            .get(category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Every rating in the store, grouped by ascending user id
    pub fn get_all_ratings(&self) -> Vec<Rating> {
        let mut user_ids: Vec<UserId> = self.user_ratings.keys().copied().collect();
        user_ids.sort_unstable();
        user_ids
            .into_iter()
            .flat_map(|id| self.get_user_ratings(id).iter().copied())
            .collect()
    }

    /// Smallest id greater than every existing user id, or `None` once
    /// `UserId::MAX` is taken
    pub fn next_user_id(&self) -> Option<UserId> {
        self.users.keys().max().map_or(Some(1), |id| id.checked_add(1))
    }

    /// Smallest id greater than every existing course id, or `None` once
    /// `CourseId::MAX` is taken
    pub fn next_course_id(&self) -> Option<CourseId> {
        self.courses
            .keys()
            .next_back()
            .map_or(Some(1), |id| id.checked_add(1))
    }

    /// Insert a user into the index, replacing any user with the same id
    pub fn insert_user(&mut self, user: User) {
        self.users.insert(user.id, user);
    }

    /// Insert a course and index it by category
    pub fn insert_course(&mut self, course: Course) {
        if let Some(previous) = self.courses.remove(&course.id) {
            if let Some(ids) = self.category_index.get_mut(&previous.category) {
                ids.retain(|&id| id != previous.id);
            }
        }

        let ids = self
            .category_index
            .entry(course.category.clone())
            .or_default();
        if let Err(pos) = ids.binary_search(&course.id) {
            ids.insert(pos, course.id);
        }
        self.courses.insert(course.id, course);
    }

    /// Append a rating to both rating indices without checking for an
    /// existing (user, course) pair. Used while bulk loading.
    pub fn insert_rating(&mut self, rating: Rating) {
        self.user_ratings
            .entry(rating.user_id)
            .or_default()
            .push(rating);

        self.course_ratings
            .entry(rating.course_id)
            .or_default()
            .push(rating);
    }

    /// Insert or update the rating for a (user, course) pair.
    ///
    /// Returns the previous value when an existing rating was overwritten.
    pub fn upsert_rating(&mut self, rating: Rating) -> Option<f64> {
        let existing = self
            .user_ratings
            .get_mut(&rating.user_id)
            .and_then(|list| list.iter_mut().find(|r| r.course_id == rating.course_id));

        match existing {
            Some(slot) => {
                let previous = slot.rating;
                slot.rating = rating.rating;
                if let Some(slot) = self
                    .course_ratings
                    .get_mut(&rating.course_id)
                    .and_then(|list| list.iter_mut().find(|r| r.user_id == rating.user_id))
                {
                    slot.rating = rating.rating;
                }
                Some(previous)
            }
            None => {
                self.insert_rating(rating);
                None
            }
        }
    }

    /// Remove the rating for a (user, course) pair, if there is one
    pub fn remove_rating(&mut self, user_id: UserId, course_id: CourseId) -> Option<Rating> {
        let list = self.user_ratings.get_mut(&user_id)?;
        let pos = list.iter().position(|r| r.course_id == course_id)?;
        let removed = list.remove(pos);
        if list.is_empty() {
            self.user_ratings.remove(&user_id);
        }

        if let Some(list) = self.course_ratings.get_mut(&course_id) {
            list.retain(|r| r.user_id != user_id);
            if list.is_empty() {
                self.course_ratings.remove(&course_id);
            }
        }
        Some(removed)
    }

    /// Remove a user together with every rating they made.
    ///
    /// Returns the removed user and the number of ratings deleted with them.
    pub fn remove_user(&mut self, user_id: UserId) -> Option<(User, usize)> {
        let user = self.users.remove(&user_id)?;
        let ratings = self.user_ratings.remove(&user_id).unwrap_or_default();

        for rating in &ratings {
            if let Some(list) = self.course_ratings.get_mut(&rating.course_id) {
                list.retain(|r| r.user_id != user_id);
                if list.is_empty() {
                    self.course_ratings.remove(&rating.course_id);
                }
            }
        }
        Some((user, ratings.len()))
    }

    /// Get counts (users, courses, ratings) for debugging/validation
    pub fn counts(&self) -> (usize, usize, usize) {
        let total_ratings = self.user_ratings.values().map(|v| v.len()).sum();
        (self.users.len(), self.courses.len(), total_ratings)
    }
}

impl Default for DataIndex {
    fn default() -> Self {
        Self::new()
    }
}
