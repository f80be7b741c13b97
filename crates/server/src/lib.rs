//! Server crate for the course recommender.
//!
//! This crate contains the service that owns the course store and the
//! current model snapshot, and exposes the application operations.

pub mod service;

pub use service::{
    MetricsResponse, RecommendationResponse, RecommendationService, ServiceError,
    ALL_RATED_MESSAGE,
};
