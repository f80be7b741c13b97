//! # Data Loader Crate
//!
//! This crate owns the course store the recommender reads from: users,
//! courses, and the explicit ratings linking them.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (User, Course, Rating, DataIndex)
//! - **parser**: Read and write the `::`-separated .dat files
//! - **index**: Load, validate and save a DataIndex
//! - **repository**: Query traits the engine consumes
//! - **sample**: Built-in sample catalog for seeding
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DataIndex;
//! use std::path::Path;
//!
//! let mut index = DataIndex::load_from_files(Path::new("data"))?;
//! index.seed_sample_courses();
//!
//! let ratings = index.get_user_ratings(1);
//! println!("User 1 rated {} courses", ratings.len());
//! ```

pub mod error;
pub mod types;
pub mod parser;
pub mod index;
pub mod repository;
pub mod sample;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use repository::{CourseRepository, RatingRepository};
pub use types::{
    is_valid_rating, Course, CourseId, DataIndex, Rating, User, UserId, MAX_RATING, MIN_RATING,
};
