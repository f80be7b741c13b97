//! Simple harness for the recommendation service.
//!
//! Loads the data directory and prints recommendations for one user.
//!
//! Usage: server [DATA_DIR] [USER_ID]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine::EngineConfig;
use server::RecommendationService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server=debug,engine=debug")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let data_dir = PathBuf::from(args.next().unwrap_or_else(|| "data".to_string()));
    let user_id: u32 = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("Invalid user id: {}", raw))?,
        None => 1,
    };

    info!("Loading data from {}", data_dir.display());
    let service = Arc::new(RecommendationService::open(&data_dir, EngineConfig::default())?);
    service.seed_sample_courses();
    let (users, courses, ratings) = service.counts();
    info!("Loaded {} users, {} courses, {} ratings", users, courses, ratings);

    // Training and ranking are CPU-bound
    let response = tokio::task::spawn_blocking({
        let service = service.clone();
        move || service.recommend(user_id)
    })
    .await
    .context("Recommendation task panicked")?;

    if let Some(message) = &response.message {
        info!("{}", message);
    }
    info!("Received {} recommendations:", response.recommendations.len());
    for (i, rec) in response.recommendations.iter().enumerate() {
        info!(
            "{}. {} [{}] - Predicted: {:.3}",
            i + 1,
            rec.title,
            rec.category,
            rec.predicted_rating
        );
        if let Some(explanation) = response.explanations.get(&rec.course_id) {
            info!("   {}", explanation.message);
        }
    }

    Ok(())
}
