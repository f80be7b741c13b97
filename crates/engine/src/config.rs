//! Tunable parameters for training, ranking, explanation and evaluation.

/// Engine parameters. `Default` holds the standard values; the
/// `with_*` methods override individual values.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Upper bound on the number of latent factors
    pub max_factors: usize,
    /// Fewer ratings than this and training yields no model
    pub min_training_ratings: usize,
    /// Fewer nonzero mean-centered cells than this and factors stay zero
    pub min_signal_entries: usize,
    /// Iteration cap handed to the SVD solver
    pub svd_max_iterations: usize,

    /// Number of recommendations returned
    pub top_n: usize,
    /// Ratings at or above this count as a positive signal
    pub positive_threshold: f64,
    /// Cold-start score for a category the user has never rated
    pub neutral_score: f64,

    /// How many positive raters of a course are considered for explanations
    pub collaborator_limit: usize,
    /// How many of those raters are checked for overlap with the user
    pub collaborator_sample: usize,
    /// How many same-category courses an explanation cites
    pub similar_item_limit: usize,

    /// Fewer ratings than this and evaluation refuses to run
    pub min_evaluation_ratings: usize,
    /// Fraction of ratings held out for testing
    pub test_ratio: f64,
    /// Seed for the train/test shuffle
    pub split_seed: u64,
    /// Cut-off for precision@K
    pub precision_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_factors: 50,
            min_training_ratings: 3,
            min_signal_entries: 5,
            svd_max_iterations: 10_000,
            top_n: 10,
            positive_threshold: 4.0,
            neutral_score: 3.0,
            collaborator_limit: 5,
            collaborator_sample: 3,
            similar_item_limit: 3,
            min_evaluation_ratings: 10,
            test_ratio: 0.2,
            split_seed: 42,
            precision_k: 5,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the latent factor cap (default: 50)
    pub fn with_max_factors(mut self, max_factors: usize) -> Self {
        self.max_factors = max_factors;
        self
    }

    /// Configure how many recommendations are returned (default: 10)
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Configure the positive-signal threshold (default: 4.0)
    pub fn with_positive_threshold(mut self, threshold: f64) -> Self {
        self.positive_threshold = threshold;
        self
    }

    /// Configure the cold-start neutral score (default: 3.0)
    pub fn with_neutral_score(mut self, score: f64) -> Self {
        self.neutral_score = score;
        self
    }

    /// Configure the held-out fraction (default: 0.2)
    pub fn with_test_ratio(mut self, ratio: f64) -> Self {
        self.test_ratio = ratio;
        self
    }

    /// Configure the train/test shuffle seed (default: 42)
    pub fn with_split_seed(mut self, seed: u64) -> Self {
        self.split_seed = seed;
        self
    }

    /// Configure K for precision@K (default: 5)
    pub fn with_precision_k(mut self, k: usize) -> Self {
        self.precision_k = k;
        self
    }
}
