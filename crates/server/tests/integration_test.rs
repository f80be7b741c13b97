//! Integration tests for the recommendation service.
//!
//! These exercise the service against a real data directory: seeding,
//! mutations, persistence and reload.

use engine::{EngineConfig, ScoringStrategy};
use server::{RecommendationService, ServiceError};
use std::sync::Arc;
use std::thread;

fn create_test_service(dir: &std::path::Path) -> RecommendationService {
    let service = RecommendationService::open(dir, EngineConfig::default()).unwrap();
    service.seed_sample_courses();
    service
}

#[test]
fn test_empty_directory_is_seeded() {
    let dir = tempfile::tempdir().unwrap();
    let service = create_test_service(dir.path());

    let (users, courses, ratings) = service.counts();
    assert_eq!((users, ratings), (0, 0));
    assert_eq!(courses, 53);
    // Seeding is idempotent once the catalog is large enough
    assert_eq!(service.seed_sample_courses(), 0);
}

#[test]
fn test_persist_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let service = create_test_service(dir.path());

    let ada = service
        .create_user(
            "Ada",
            vec!["machine learning".to_string()],
            vec!["python".to_string()],
            6,
        )
        .unwrap();
    let bob = service.create_user("Bob", vec![], vec![], 2).unwrap();
    service.rate(ada, 1, 5.0).unwrap();
    service.rate(ada, 2, 4.0).unwrap();
    service.rate(bob, 1, 2.0).unwrap();
    service.save(dir.path()).unwrap();

    let reloaded = RecommendationService::open(dir.path(), EngineConfig::default()).unwrap();
    assert_eq!(reloaded.counts(), (2, 53, 3));
    let user = reloaded.user(ada).unwrap();
    assert_eq!(user.interests, vec!["machine learning".to_string()]);
    assert_eq!(user.time_per_week, 6);
    assert_eq!(reloaded.ratings_for_user(ada).len(), 2);

    // No snapshot after reload until a recommendation trains one
    assert!(reloaded.model().is_none());
    let response = reloaded.recommend(ada);
    assert_eq!(response.strategy, ScoringStrategy::Model);
    assert_eq!(response.recommendations.len(), 10);
    assert!(reloaded.model().is_some());
}

#[test]
fn test_cold_start_prefers_rated_category() {
    let dir = tempfile::tempdir().unwrap();
    let service = create_test_service(dir.path());
    let user = service.create_user("Cy", vec![], vec![], 1).unwrap();

    let devops: Vec<u32> = service
        .courses()
        .iter()
        .filter(|c| c.category == "DevOps")
        .map(|c| c.id)
        .collect();
    service.rate(user, devops[0], 5.0).unwrap();

    let response = service.recommend(user);
    assert_eq!(response.strategy, ScoringStrategy::ColdStart);
    assert!(response.recommendations[..3]
        .iter()
        .all(|r| r.category == "DevOps" && r.predicted_rating == 5.0));
}

#[test]
fn test_unrate_and_delete() {
    let dir = tempfile::tempdir().unwrap();
    let service = create_test_service(dir.path());
    let a = service.create_user("A", vec![], vec![], 1).unwrap();
    let b = service.create_user("B", vec![], vec![], 1).unwrap();
    for course in 1..=3 {
        service.rate(a, course, 4.0).unwrap();
        service.rate(b, course, 2.0).unwrap();
    }

    let removed = service.unrate(a, 3).unwrap();
    assert_eq!(removed.rating, 4.0);
    assert!(service.unrate(a, 3).is_err());

    assert_eq!(service.delete_user(b).unwrap(), 3);
    let err = service.delete_user(b).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ServiceError>(),
        Some(&ServiceError::UserNotFound(b))
    );
    // Two ratings left: below the training minimum
    assert!(service.model().is_none());
}

#[test]
fn test_rejected_user_does_not_block_save() {
    let dir = tempfile::tempdir().unwrap();
    let service = create_test_service(dir.path());

    assert!(service.create_user("Bad::Name", vec![], vec![], 1).is_err());
    let cy = service.create_user("Cy", vec![], vec![], 1).unwrap();
    service.rate(cy, 1, 5.0).unwrap();
    service.save(dir.path()).unwrap();

    let reloaded = RecommendationService::open(dir.path(), EngineConfig::default()).unwrap();
    assert_eq!(reloaded.counts(), (1, 53, 1));
    assert_eq!(reloaded.user(cy).unwrap().name, "Cy");
}

#[test]
fn test_concurrent_reads_and_writes() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(create_test_service(dir.path()));
    let users: Vec<u32> = (0..4)
        .map(|i| {
            service
                .create_user(&format!("U{}", i), vec![], vec![], 1)
                .unwrap()
        })
        .collect();

    let handles: Vec<_> = users
        .iter()
        .copied()
        .map(|user| {
            let service = service.clone();
            thread::spawn(move || {
                for course in 1..=5 {
                    service.rate(user, course, (course % 5 + 1) as f64).unwrap();
                    let response = service.recommend(user);
                    assert!(response.recommendations.len() <= 10);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(service.counts().2, 20);
    let model = service.model().unwrap();
    assert_eq!(model.users().len(), 4);
}
