//! Building, validating and persisting the DataIndex.
//!
//! The data directory holds three files (`users.dat`, `courses.dat`,
//! `ratings.dat`). A missing file loads as an empty table so a fresh
//! directory starts with an empty store.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub const USERS_FILE: &str = "users.dat";
pub const COURSES_FILE: &str = "courses.dat";
pub const RATINGS_FILE: &str = "ratings.dat";

/// Parse one file, treating a missing file as empty
fn parse_optional<T>(path: &Path, parse: fn(&Path) -> Result<Vec<T>>) -> Result<Vec<T>> {
    if path.exists() {
        parse(path)
    } else {
        debug!("{} not found, starting empty", path.display());
        Ok(Vec::new())
    }
}

impl DataIndex {
    /// Load the store from a data directory
    ///
    /// Steps:
    /// 1. Parse all three files in parallel
    /// 2. Insert users, courses, then ratings (duplicate (user, course)
    ///    pairs keep the last value)
    /// 3. Validate references and rating ranges
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading course data from {}", data_dir.display());

        let users_path = data_dir.join(USERS_FILE);
        let courses_path = data_dir.join(COURSES_FILE);
        let ratings_path = data_dir.join(RATINGS_FILE);

        // Nested joins give three-way parallelism
        let ((users, courses), ratings) = rayon::join(
            || {
                rayon::join(
                    || parse_optional(&users_path, parser::parse_users),
                    || parse_optional(&courses_path, parser::parse_courses),
                )
            },
            || parse_optional(&ratings_path, parser::parse_ratings),
        );

        let users = users?;
        let courses = courses?;
        let ratings = ratings?;

        info!(
            "Loaded {} users, {} courses, {} ratings",
            users.len(),
            courses.len(),
            ratings.len()
        );

        let mut index = DataIndex::new();
        for user in users {
            index.insert_user(user);
        }
        for course in courses {
            index.insert_course(course);
        }
        for rating in ratings {
            index.upsert_rating(rating);
        }

        index.validate()?;
        Ok(index)
    }

    /// Write the whole store back to a data directory, creating it if needed.
    ///
    /// All text fields are checked before any file is opened; a store that
    /// cannot be written leaves the directory as it was.
    pub fn save_to_files(&self, data_dir: &Path) -> Result<()> {
        let users = self.users();
        let courses: Vec<&Course> = self.courses().collect();
        for user in &users {
            parser::check_user(user)?;
        }
        for course in &courses {
            parser::check_course(course)?;
        }

        fs::create_dir_all(data_dir)?;
        parser::write_users(&data_dir.join(USERS_FILE), &users)?;
        parser::write_courses(&data_dir.join(COURSES_FILE), &courses)?;
        parser::write_ratings(&data_dir.join(RATINGS_FILE), &self.get_all_ratings())?;

        let (users, courses, ratings) = self.counts();
        info!(
            "Saved {} users, {} courses, {} ratings to {}",
            users,
            courses,
            ratings,
            data_dir.display()
        );
        Ok(())
    }

    /// Register a new user under the next free id and return that id.
    ///
    /// Fails without touching the store when a text field could not be saved
    /// or when no id is left.
    pub fn create_user(
        &mut self,
        name: impl Into<String>,
        interests: Vec<String>,
        skills: Vec<String>,
        time_per_week: u32,
    ) -> Result<UserId> {
        let id = self
            .next_user_id()
            .ok_or_else(|| DataLoadError::IdSpaceExhausted {
                entity: "user".to_string(),
            })?;
        let user = User {
            id,
            name: name.into(),
            interests,
            skills,
            time_per_week,
        };
        parser::check_user(&user)?;
        self.insert_user(user);
        Ok(id)
    }

    /// Validate data integrity
    ///
    /// Check that:
    /// - No user or course uses the reserved id 0
    /// - Every rating references an existing user and course
    /// - Every rating value is within [1.0, 5.0]
    pub fn validate(&self) -> Result<()> {
        if self.users.contains_key(&0) || self.courses.contains_key(&0) {
            return Err(DataLoadError::ValidationError(
                "id 0 is reserved".to_string(),
            ));
        }

        for ratings in self.user_ratings.values() {
            for rating in ratings {
                if !self.users.contains_key(&rating.user_id) {
                    return Err(DataLoadError::MissingReference {
                        entity: "User".to_string(),
                        id: rating.user_id,
                    });
                }
                if !self.courses.contains_key(&rating.course_id) {
                    return Err(DataLoadError::MissingReference {
                        entity: "Course".to_string(),
                        id: rating.course_id,
                    });
                }
                if !is_valid_rating(rating.rating) {
                    return Err(DataLoadError::InvalidValue {
                        field: "rating".to_string(),
                        value: rating.rating.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
