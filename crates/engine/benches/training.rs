//! Benchmarks for model training and ranking
//!
//! Run with: cargo bench --package engine
//!
//! Uses a seeded synthetic rating set so runs are comparable.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{Course, Rating};
use engine::{evaluate, train, EngineConfig, RecommendationRanker};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const USERS: u32 = 200;
const COURSES: u32 = 53;

fn synthetic_ratings(density: f64) -> Vec<Rating> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut ratings = Vec::new();
    for user in 1..=USERS {
        for course in 1..=COURSES {
            if rng.random_bool(density) {
                let value = rng.random_range(1..=5) as f64;
                ratings.push(Rating::new(user, course, value));
            }
        }
    }
    ratings
}

fn synthetic_catalog() -> Vec<Course> {
    let categories = ["Programming", "Data Science", "DevOps", "Design"];
    (1..=COURSES)
        .map(|id| Course {
            id,
            title: format!("Course {}", id),
            description: String::new(),
            category: categories[id as usize % categories.len()].to_string(),
        })
        .collect()
}

fn bench_train(c: &mut Criterion) {
    let ratings = synthetic_ratings(0.2);

    c.bench_function("train_200x53", |b| {
        b.iter(|| {
            let model = train(black_box(&ratings));
            black_box(model)
        })
    });
}

fn bench_recommend(c: &mut Criterion) {
    let ratings = synthetic_ratings(0.2);
    let model = train(&ratings).expect("Failed to train benchmark model");
    let courses = synthetic_catalog();
    let catalog: Vec<&Course> = courses.iter().collect();
    let own: Vec<Rating> = ratings.iter().filter(|r| r.user_id == 1).copied().collect();
    let ranker = RecommendationRanker::new(&EngineConfig::default());

    c.bench_function("recommend_top_10", |b| {
        b.iter(|| {
            let result = ranker.recommend(Some(&model), black_box(1), &catalog, &own);
            black_box(result)
        })
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let ratings = synthetic_ratings(0.2);

    c.bench_function("evaluate_holdout", |b| {
        b.iter(|| {
            let report = evaluate(black_box(&ratings)).unwrap();
            black_box(report)
        })
    });
}

criterion_group!(benches, bench_train, bench_recommend, bench_evaluate);
criterion_main!(benches);
