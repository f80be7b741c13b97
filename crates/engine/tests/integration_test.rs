//! Integration tests for the engine.
//!
//! These run the full train -> predict -> rank -> explain -> evaluate flow
//! against a small in-memory course store.

use data_loader::{Course, CourseId, DataIndex, Rating, UserId};
use engine::{
    evaluate, train, EngineConfig, EngineError, ExplanationGenerator, ExplanationKind,
    RecommendationRanker, RecommendationStatus, ScoringStrategy,
};

fn create_test_index() -> DataIndex {
    let mut index = DataIndex::new();
    let catalog = [
        (10, "Python Programming Fundamentals", "Programming"),
        (11, "Docker and Kubernetes", "DevOps"),
        (12, "Machine Learning with Python", "Data Science"),
        (13, "JavaScript Essentials", "Programming"),
        (14, "CI/CD with Jenkins", "DevOps"),
        (15, "UI/UX Design Principles", "Design"),
    ];
    for (id, title, category) in catalog {
        index.insert_course(Course {
            id,
            title: title.to_string(),
            description: format!("Learn {}", title),
            category: category.to_string(),
        });
    }
    index
}

fn rate(index: &mut DataIndex, user_id: UserId, course_id: CourseId, rating: f64) {
    index.upsert_rating(Rating::new(user_id, course_id, rating));
}

/// Every user rates every course with a taste pattern
fn populated_index() -> DataIndex {
    let mut index = create_test_index();
    let tastes: [(UserId, [f64; 6]); 6] = [
        (1, [5.0, 2.0, 4.0, 5.0, 1.0, 3.0]),
        (2, [4.0, 1.0, 5.0, 4.0, 2.0, 3.0]),
        (3, [1.0, 5.0, 2.0, 1.0, 5.0, 2.0]),
        (4, [2.0, 4.0, 1.0, 2.0, 4.0, 3.0]),
        (5, [5.0, 1.0, 5.0, 4.0, 1.0, 4.0]),
        (6, [1.0, 5.0, 1.0, 2.0, 5.0, 1.0]),
    ];
    for (user, row) in tastes {
        for (offset, rating) in row.into_iter().enumerate() {
            rate(&mut index, user, 10 + offset as CourseId, rating);
        }
    }
    index
}

#[test]
fn test_scenario_rank_one_model() {
    let ratings = vec![
        Rating::new(1, 10, 5.0),
        Rating::new(1, 11, 3.0),
        Rating::new(2, 10, 4.0),
        Rating::new(2, 11, 5.0),
        Rating::new(3, 10, 2.0),
    ];
    let model = train(&ratings).unwrap();

    assert_eq!(model.rank(), 1);
    // Unseen user
    assert_eq!(model.predict(99, 10).unwrap(), model.global_mean());
}

#[test]
fn test_scenario_all_rated() {
    let mut index = create_test_index();
    for id in 10..=15 {
        rate(&mut index, 1, id, 4.0);
    }
    let model = train(&index.get_all_ratings()).unwrap();
    let catalog: Vec<&Course> = index.courses().collect();

    let ranker = RecommendationRanker::new(&EngineConfig::default());
    let result = ranker.recommend(Some(&model), 1, &catalog, index.get_user_ratings(1));

    assert!(result.items.is_empty());
    assert_eq!(result.status, RecommendationStatus::AllRated);
}

#[test]
fn test_scenario_cold_start_neutral_scores() {
    let index = create_test_index();
    let ratings = index.get_all_ratings();
    assert!(train(&ratings).is_none());

    let catalog: Vec<&Course> = index.courses().collect();
    let ranker = RecommendationRanker::new(&EngineConfig::default());
    let result = ranker.recommend(None, 1, &catalog, index.get_user_ratings(1));

    assert_eq!(result.strategy, ScoringStrategy::ColdStart);
    assert_eq!(result.status, RecommendationStatus::Normal);
    let ids: Vec<CourseId> = result.items.iter().map(|r| r.course_id).collect();
    assert_eq!(ids, vec![10, 11, 12, 13, 14, 15]);
    assert!(result.items.iter().all(|r| r.predicted_rating == 3.0));
}

#[test]
fn test_predictions_always_in_range() {
    let index = populated_index();
    let model = train(&index.get_all_ratings()).unwrap();

    for user in 0..=8 {
        for course in 9..=16 {
            if let Ok(p) = model.predict(user, course) {
                assert!((1.0..=5.0).contains(&p), "prediction {} out of range", p);
            }
        }
    }
}

#[test]
fn test_recommendations_exclude_rated_courses() {
    let mut index = populated_index();
    // User 7 has partial history
    rate(&mut index, 7, 10, 5.0);
    rate(&mut index, 7, 11, 1.0);
    let model = train(&index.get_all_ratings()).unwrap();
    let catalog: Vec<&Course> = index.courses().collect();

    let ranker = RecommendationRanker::new(&EngineConfig::default());
    let result = ranker.recommend(Some(&model), 7, &catalog, index.get_user_ratings(7));

    assert_eq!(result.items.len(), 4);
    assert!(result.items.iter().all(|r| r.course_id != 10 && r.course_id != 11));
    let scores: Vec<f64> = result.items.iter().map(|r| r.predicted_rating).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_deleted_user_predicts_global_mean() {
    let mut index = populated_index();
    index.remove_user(3);
    for id in 10..=15 {
        index.remove_rating(3, id);
    }

    let model = train(&index.get_all_ratings()).unwrap();
    assert!(!model.users().contains(3));
    for course in 10..=15 {
        assert_eq!(model.predict(3, course).unwrap(), model.global_mean());
    }
}

#[test]
fn test_explanation_tiering() {
    let generator = ExplanationGenerator::new(&EngineConfig::default());

    // Collaborator 2 liked course 12 and shares course 10 with user 1
    let mut index = create_test_index();
    rate(&mut index, 1, 10, 4.0);
    rate(&mut index, 2, 10, 3.0);
    rate(&mut index, 2, 12, 5.0);
    let explanation = generator.explain(&index, 1, 12);
    assert_eq!(explanation.kind, ExplanationKind::SimilarUsers);
    assert_eq!(explanation.count, Some(1));

    // Without the overlap, the category peers explain course 11
    index.remove_rating(2, 10);
    let explanation = generator.explain(&index, 1, 11);
    assert_eq!(explanation.kind, ExplanationKind::SimilarItems);
    assert_eq!(explanation.count, Some(1));

    // Course 15 is alone in its category
    let explanation = generator.explain(&index, 1, 15);
    assert_eq!(explanation.kind, ExplanationKind::General);
    assert_eq!(explanation.count, None);
}

#[test]
fn test_explanation_json_shape() {
    let generator = ExplanationGenerator::new(&EngineConfig::default());
    let index = create_test_index();

    let json = serde_json::to_value(generator.explain(&index, 1, 10)).unwrap();
    assert_eq!(json["type"], "similar_items");
    assert_eq!(json["message"], "Similar courses in Programming category");
    assert_eq!(json["count"], 1);

    let json = serde_json::to_value(generator.explain(&index, 1, 15)).unwrap();
    assert_eq!(json["type"], "general");
    assert!(json.get("count").is_none());
}

#[test]
fn test_evaluation_bounds() {
    let index = populated_index();
    let report = evaluate(&index.get_all_ratings()).unwrap();

    assert!(report.rmse >= 0.0);
    assert!((0.0..=1.0).contains(&report.precision_at_k));
    assert_eq!(report.train_size + report.test_size, 36);
}

#[test]
fn test_evaluation_needs_ten_ratings() {
    let mut index = create_test_index();
    for id in 10..=15 {
        rate(&mut index, 1, id, 3.0);
    }

    let err = evaluate(&index.get_all_ratings()).unwrap_err();
    assert!(matches!(err, EngineError::InsufficientData { required: 10, available: 6 }));
}
