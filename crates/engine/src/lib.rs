//! # Engine Crate
//!
//! Collaborative-filtering core for course recommendations: a bias model
//! refined by a truncated SVD of the mean-centered rating matrix.
//!
//! ## Pipeline
//!
//! ```text
//! ratings -> RatingMatrix -> BiasTerms -> normalize -> FactorizationEngine
//!         -> TrainedModel -> RecommendationRanker -> ExplanationGenerator
//! ```
//!
//! ## Main Components
//!
//! - **matrix**: Dense rating matrix, id indices and bias normalization
//! - **factorization**: Truncated SVD with zero-factor fallback
//! - **model**: Immutable trained snapshot and `predict`
//! - **ranker**: Top-N ranking of unrated courses
//! - **cold_start**: Category-average scoring when no model exists
//! - **explain**: Three-tier recommendation explanations
//! - **evaluation**: Holdout RMSE and precision@K
//! - **config**: Tunable parameters
//!
//! ## Example Usage
//!
//! ```ignore
//! use engine::{train, EngineConfig, RecommendationRanker};
//!
//! let ratings = index.get_all_ratings();
//! let model = train(&ratings);
//!
//! let ranker = RecommendationRanker::new(&EngineConfig::default());
//! let catalog: Vec<_> = index.courses().collect();
//! let result = ranker.recommend(model.as_ref(), 1, &catalog, index.get_user_ratings(1));
//! ```

pub mod cold_start;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod explain;
pub mod factorization;
pub mod matrix;
pub mod model;
pub mod ranker;

pub use cold_start::ColdStartFallback;
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use evaluation::{evaluate, EvaluationHarness, EvaluationReport};
pub use explain::{Explanation, ExplanationGenerator, ExplanationKind};
pub use factorization::{FactorizationEngine, LatentFactors, NumericalFailure};
pub use matrix::{normalize, BiasTerms, IdIndex, RatingMatrix};
pub use model::{train, train_with_config, TrainedModel};
pub use ranker::{
    RankedRecommendations, Recommendation, RecommendationRanker, RecommendationStatus,
    ScoringStrategy,
};
