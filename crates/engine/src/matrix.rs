//! Rating matrix construction and bias normalization.
//!
//! Rating triples become a dense users x courses matrix addressed through
//! two `IdIndex` bijections. A zero cell means "not rated"; that is safe
//! because valid ratings are never below 1.0.

use data_loader::Rating;
use nalgebra::DMatrix;
use std::collections::{BTreeSet, HashMap};

/// Bijection between external ids and dense matrix positions.
///
/// Positions follow ascending id order, so the same set of ids always maps
/// to the same positions.
#[derive(Debug, Clone, PartialEq)]
pub struct IdIndex {
    ids: Vec<u32>,
    positions: HashMap<u32, usize>,
}

impl IdIndex {
    /// Build from any collection of ids; duplicates collapse
    pub fn from_ids(ids: impl IntoIterator<Item = u32>) -> Self {
        let ids: Vec<u32> = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        let positions = ids.iter().enumerate().map(|(pos, &id)| (id, pos)).collect();
        Self { ids, positions }
    }

    pub fn position(&self, id: u32) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn id_at(&self, position: usize) -> Option<u32> {
        self.ids.get(position).copied()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.positions.contains_key(&id)
    }

    /// Ids in position order
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Dense users x courses rating matrix
#[derive(Debug, Clone)]
pub struct RatingMatrix {
    pub users: IdIndex,
    pub courses: IdIndex,
    values: DMatrix<f64>,
}

impl RatingMatrix {
    /// Build the matrix from rating triples.
    ///
    /// Duplicate (user, course) pairs keep the last value seen.
    pub fn build(ratings: &[Rating]) -> Self {
        let users = IdIndex::from_ids(ratings.iter().map(|r| r.user_id));
        let courses = IdIndex::from_ids(ratings.iter().map(|r| r.course_id));

        let mut values = DMatrix::zeros(users.len(), courses.len());
        for r in ratings {
            if let (Some(u), Some(c)) = (users.position(r.user_id), courses.position(r.course_id)) {
                values[(u, c)] = r.rating;
            }
        }

        Self {
            users,
            courses,
            values,
        }
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn n_users(&self) -> usize {
        self.users.len()
    }

    pub fn n_courses(&self) -> usize {
        self.courses.len()
    }

    /// Number of observed (nonzero) cells
    pub fn observed_count(&self) -> usize {
        self.values.iter().filter(|&&v| v != 0.0).count()
    }
}

/// Global, per-user and per-course mean ratings
#[derive(Debug, Clone, PartialEq)]
pub struct BiasTerms {
    pub global_mean: f64,
    /// Mean of each user's observed ratings, by matrix row
    pub user_means: Vec<f64>,
    /// Mean of each course's observed ratings, by matrix column
    pub course_means: Vec<f64>,
}

impl BiasTerms {
    /// Compute means over the rating triples.
    ///
    /// Every user and course in `matrix` has at least one triple, so no
    /// entity mean is ever taken over an empty set.
    pub fn compute(ratings: &[Rating], matrix: &RatingMatrix) -> Self {
        let mut user_acc = vec![(0.0, 0usize); matrix.n_users()];
        let mut course_acc = vec![(0.0, 0usize); matrix.n_courses()];
        let mut total = 0.0;

        for r in ratings {
            total += r.rating;
            if let Some(u) = matrix.users.position(r.user_id) {
                user_acc[u].0 += r.rating;
                user_acc[u].1 += 1;
            }
            if let Some(c) = matrix.courses.position(r.course_id) {
                course_acc[c].0 += r.rating;
                course_acc[c].1 += 1;
            }
        }

        let mean = |(sum, count): (f64, usize)| if count > 0 { sum / count as f64 } else { 0.0 };
        Self {
            global_mean: mean((total, ratings.len())),
            user_means: user_acc.into_iter().map(mean).collect(),
            course_means: course_acc.into_iter().map(mean).collect(),
        }
    }

    /// Deviation of a user's mean from the global mean
    pub fn user_bias(&self, user_pos: usize) -> f64 {
        self.user_means[user_pos] - self.global_mean
    }

    /// Deviation of a course's mean from the global mean
    pub fn course_bias(&self, course_pos: usize) -> f64 {
        self.course_means[course_pos] - self.global_mean
    }
}

/// Subtract each user's mean from that user's observed cells only.
///
/// Unobserved cells stay at zero rather than becoming `-user_mean`, so the
/// factorization sees missing entries as neutral.
pub fn normalize(matrix: &RatingMatrix, bias: &BiasTerms) -> DMatrix<f64> {
    let values = matrix.values();
    DMatrix::from_fn(values.nrows(), values.ncols(), |u, c| {
        let v = values[(u, c)];
        if v > 0.0 { v - bias.user_means[u] } else { 0.0 }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ratings() -> Vec<Rating> {
        vec![
            Rating::new(1, 10, 5.0),
            Rating::new(1, 11, 3.0),
            Rating::new(2, 10, 4.0),
            Rating::new(2, 11, 5.0),
            Rating::new(3, 10, 2.0),
        ]
    }

    #[test]
    fn test_id_index_sorted_positions() {
        let index = IdIndex::from_ids([30, 10, 20, 10]);

        assert_eq!(index.ids(), &[10, 20, 30]);
        assert_eq!(index.position(20), Some(1));
        assert_eq!(index.id_at(2), Some(30));
        assert_eq!(index.position(99), None);
    }

    #[test]
    fn test_build_matrix() {
        let matrix = RatingMatrix::build(&sample_ratings());

        assert_eq!(matrix.n_users(), 3);
        assert_eq!(matrix.n_courses(), 2);
        assert_eq!(matrix.values()[(0, 0)], 5.0);
        assert_eq!(matrix.values()[(2, 1)], 0.0);
        assert_eq!(matrix.observed_count(), 5);
    }

    #[test]
    fn test_duplicate_last_write_wins() {
        let ratings = vec![Rating::new(1, 10, 2.0), Rating::new(1, 10, 4.0)];
        let matrix = RatingMatrix::build(&ratings);
        assert_eq!(matrix.values()[(0, 0)], 4.0);
    }

    #[test]
    fn test_bias_terms() {
        let ratings = sample_ratings();
        let matrix = RatingMatrix::build(&ratings);
        let bias = BiasTerms::compute(&ratings, &matrix);

        assert!((bias.global_mean - 3.8).abs() < 1e-12);
        assert_eq!(bias.user_means, vec![4.0, 4.5, 2.0]);
        assert!((bias.course_means[0] - 11.0 / 3.0).abs() < 1e-12);
        assert_eq!(bias.course_means[1], 4.0);
    }

    #[test]
    fn test_normalize_leaves_unobserved_cells_at_zero() {
        let ratings = sample_ratings();
        let matrix = RatingMatrix::build(&ratings);
        let bias = BiasTerms::compute(&ratings, &matrix);
        let normalized = normalize(&matrix, &bias);

        assert_eq!(normalized[(0, 0)], 1.0);
        assert_eq!(normalized[(0, 1)], -1.0);
        assert_eq!(normalized[(1, 0)], -0.5);
        assert_eq!(normalized[(2, 0)], 0.0); // observed, equals the user mean
        assert_eq!(normalized[(2, 1)], 0.0); // unobserved
    }
}
