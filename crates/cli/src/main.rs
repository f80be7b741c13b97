use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{CourseId, UserId};
use engine::EngineConfig;
use rand::seq::IndexedRandom;
use serde::Serialize;
use server::{MetricsResponse, RecommendationResponse, RecommendationService};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Course Recs - Course Recommendation Engine
#[derive(Parser)]
#[command(name = "course-recs")]
#[command(about = "Course recommendation engine using collaborative filtering", long_about = None)]
struct Cli {
    /// Directory holding users.dat, courses.dat and ratings.dat
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Print JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    /// Number of recommendations to return
    #[arg(long, global = true)]
    top_n: Option<usize>,

    /// Cut-off for precision@K in metrics
    #[arg(long, global = true)]
    k: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get course recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Show the explanation for each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Show a user profile and rating history
    User {
        #[arg(long)]
        user_id: UserId,
    },

    /// List the course catalog
    Courses {
        /// Only courses in this category
        #[arg(long)]
        category: Option<String>,

        /// Case-insensitive substring match on the title
        #[arg(long)]
        search: Option<String>,
    },

    /// Create or update a rating
    Rate {
        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        course_id: CourseId,

        /// Rating between 1.0 and 5.0
        #[arg(long)]
        rating: f64,
    },

    /// Delete a rating
    Unrate {
        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        course_id: CourseId,
    },

    /// Register a new user
    AddUser {
        #[arg(long)]
        name: String,

        /// Comma-separated interests
        #[arg(long, value_delimiter = ',')]
        interests: Vec<String>,

        /// Comma-separated skills
        #[arg(long, value_delimiter = ',')]
        skills: Vec<String>,

        /// Hours available per week
        #[arg(long, default_value = "0")]
        time_per_week: u32,
    },

    /// Delete a user and all their ratings
    DeleteUser {
        #[arg(long)]
        user_id: UserId,
    },

    /// Evaluate the model on a holdout split
    Metrics,

    /// Add the sample courses to a small catalog
    Seed,

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = EngineConfig::default();
    if let Some(top_n) = cli.top_n {
        config = config.with_top_n(top_n);
    }
    if let Some(k) = cli.k {
        config = config.with_precision_k(k);
    }

    let start = Instant::now();
    let service = Arc::new(
        RecommendationService::open(&cli.data_dir, config).context("Failed to load course data")?,
    );
    let seeded = service.seed_sample_courses();
    if seeded > 0 {
        service.save(&cli.data_dir)?;
    }
    if !cli.json {
        let (users, courses, ratings) = service.counts();
        eprintln!(
            "{} Loaded {} users, {} courses, {} ratings in {:?}",
            "✓".green(),
            users,
            courses,
            ratings,
            start.elapsed()
        );
    }

    let app = App {
        service,
        data_dir: cli.data_dir,
        json: cli.json,
    };

    match cli.command {
        Commands::Recommend { user_id, explain } => handle_recommend(&app, user_id, explain).await?,
        Commands::User { user_id } => handle_user(&app, user_id)?,
        Commands::Courses { category, search } => handle_courses(&app, category, search)?,
        Commands::Rate {
            user_id,
            course_id,
            rating,
        } => handle_rate(&app, user_id, course_id, rating)?,
        Commands::Unrate { user_id, course_id } => handle_unrate(&app, user_id, course_id)?,
        Commands::AddUser {
            name,
            interests,
            skills,
            time_per_week,
        } => handle_add_user(&app, &name, interests, skills, time_per_week)?,
        Commands::DeleteUser { user_id } => handle_delete_user(&app, user_id)?,
        Commands::Metrics => handle_metrics(&app)?,
        Commands::Seed => handle_seed(&app, seeded)?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(&app, requests, concurrent).await?,
    }

    Ok(())
}

/// Shared state for the command handlers
struct App {
    service: Arc<RecommendationService>,
    data_dir: PathBuf,
    json: bool,
}

impl App {
    fn persist(&self) -> Result<()> {
        self.service.save(&self.data_dir)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<UserId>,
}

fn print_message(app: &App, message: String, id: Option<UserId>) -> Result<()> {
    if app.json {
        print_json(&MessageResponse { message, id })
    } else {
        println!("{} {}", "✓".green(), message);
        Ok(())
    }
}

/// Handle the 'recommend' command
async fn handle_recommend(app: &App, user_id: UserId, explain: bool) -> Result<()> {
    // Training and ranking are CPU-bound
    let response = tokio::task::spawn_blocking({
        let service = app.service.clone();
        move || service.recommend(user_id)
    })
    .await
    .context("Recommendation task panicked")?;

    if app.json {
        return print_json(&response);
    }
    print_recommendations(&response, explain);
    Ok(())
}

/// Handle the 'user' command
fn handle_user(app: &App, user_id: UserId) -> Result<()> {
    let user = app.service.user(user_id)?;
    let ratings = app.service.ratings_for_user(user_id);

    if app.json {
        #[derive(Serialize)]
        struct UserView<'a> {
            #[serde(flatten)]
            user: &'a data_loader::User,
            ratings: &'a [data_loader::Rating],
        }
        return print_json(&UserView {
            user: &user,
            ratings: &ratings,
        });
    }

    println!("{}", format!("User {}: {}", user.id, user.name).bold().blue());
    println!("{}Interests: {}", "• ".green(), user.interests.join(", "));
    println!("{}Skills: {}", "• ".green(), user.skills.join(", "));
    println!("{}Time per week: {}h", "• ".green(), user.time_per_week);

    let avg_rating = if ratings.is_empty() {
        0.0
    } else {
        ratings.iter().map(|r| r.rating).sum::<f64>() / ratings.len() as f64
    };
    println!("{}Number of ratings: {}", "• ".cyan(), ratings.len());
    println!("{}Average rating: {:.2}", "• ".cyan(), avg_rating);

    let courses = app.service.courses();
    let mut top_rated: Vec<_> = ratings.iter().collect();
    top_rated.sort_by(|a, b| {
        b.rating
            .partial_cmp(&a.rating)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    println!("Rated courses:");
    for rating in top_rated {
        if let Some(course) = courses.iter().find(|c| c.id == rating.course_id) {
            println!("  - {} [{}] (Rating: {})", course.title, course.category, rating.rating);
        }
    }
    Ok(())
}

/// Handle the 'courses' command
fn handle_courses(app: &App, category: Option<String>, search: Option<String>) -> Result<()> {
    let search = search.map(|s| s.to_lowercase());
    let courses: Vec<_> = app
        .service
        .courses()
        .into_iter()
        .filter(|c| category.as_ref().is_none_or(|cat| c.category.eq_ignore_ascii_case(cat)))
        .filter(|c| {
            search
                .as_ref()
                .is_none_or(|s| c.title.to_lowercase().contains(s.as_str()))
        })
        .collect();

    if app.json {
        return print_json(&courses);
    }

    println!("{}", format!("{} courses:", courses.len()).bold().blue());
    for course in &courses {
        println!(
            "{:>4}: {} [{}]",
            course.id.to_string().green(),
            course.title,
            course.category
        );
        println!("      {}", course.description.dimmed());
    }
    Ok(())
}

/// Handle the 'rate' command
fn handle_rate(app: &App, user_id: UserId, course_id: CourseId, rating: f64) -> Result<()> {
    let previous = app.service.rate(user_id, course_id, rating)?;
    app.persist()?;

    let message = match previous {
        Some(old) => format!("Rating updated from {} to {}", old, rating),
        None => "Rating saved successfully".to_string(),
    };
    print_message(app, message, None)
}

/// Handle the 'unrate' command
fn handle_unrate(app: &App, user_id: UserId, course_id: CourseId) -> Result<()> {
    app.service.unrate(user_id, course_id)?;
    app.persist()?;
    print_message(app, "Rating deleted successfully".to_string(), None)
}

/// Handle the 'add-user' command
fn handle_add_user(
    app: &App,
    name: &str,
    interests: Vec<String>,
    skills: Vec<String>,
    time_per_week: u32,
) -> Result<()> {
    if name.trim().is_empty() {
        bail!("User name must not be empty");
    }
    let id = app
        .service
        .create_user(name, interests, skills, time_per_week)?;
    app.persist()?;
    print_message(app, "User created successfully".to_string(), Some(id))
}

/// Handle the 'delete-user' command
fn handle_delete_user(app: &App, user_id: UserId) -> Result<()> {
    let removed = app.service.delete_user(user_id)?;
    app.persist()?;
    print_message(
        app,
        format!("User and all ratings deleted successfully ({} ratings)", removed),
        None,
    )
}

/// Handle the 'metrics' command
fn handle_metrics(app: &App) -> Result<()> {
    let report = app.service.metrics()?;
    let metrics = MetricsResponse::from(&report);

    if app.json {
        return print_json(&metrics);
    }

    println!("{}", "Model evaluation:".bold().blue());
    println!("{}RMSE: {}", "• ".green(), metrics.rmse);
    println!("{}Precision@{}: {}", "• ".green(), report.k, metrics.top_k_precision);
    println!(
        "{}Split: {} train / {} test ({} predicted)",
        "• ".cyan(),
        report.train_size,
        report.test_size,
        report.predicted
    );
    Ok(())
}

/// Handle the 'seed' command
fn handle_seed(app: &App, seeded: usize) -> Result<()> {
    let (_, courses, _) = app.service.counts();
    print_message(
        app,
        format!("Seeded {} sample courses ({} in catalog)", seeded, courses),
        None,
    )
}

/// Handle the 'benchmark' command
async fn handle_benchmark(app: &App, requests: usize, concurrent: usize) -> Result<()> {
    if requests == 0 || concurrent == 0 {
        bail!("requests and concurrent must both be positive");
    }
    let user_ids = app.service.user_ids();
    if user_ids.is_empty() {
        bail!("No users to benchmark; add one with add-user");
    }

    // Pick random existing users
    let picks: Vec<UserId> = {
        let mut rng = rand::rng();
        (0..requests)
            .filter_map(|_| user_ids.choose(&mut rng).copied())
            .collect()
    };

    let limiter = Arc::new(Semaphore::new(concurrent));
    let wall = Instant::now();
    let mut handles = Vec::with_capacity(picks.len());
    for user in picks {
        let service = app.service.clone();
        let limiter = limiter.clone();
        handles.push(tokio::spawn(async move {
            let _permit = limiter.acquire_owned().await?;
            let start = Instant::now();
            tokio::task::spawn_blocking(move || service.recommend(user)).await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings: Vec<Duration> = Vec::with_capacity(handles.len());
    for handle in handles {
        timings.push(handle.await??);
    }
    let total_time = wall.elapsed();

    timings.sort();
    let sum: Duration = timings.iter().sum();
    let avg_latency = sum / timings.len() as u32;
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", requests, concurrent);
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(response: &RecommendationResponse, explain: bool) {
    if let Some(message) = &response.message {
        println!("{}", message.yellow());
        return;
    }

    println!("{}", "Course Recommendations:".bold().blue());
    for (i, rec) in response.recommendations.iter().enumerate() {
        println!(
            "{}. {} [{}] - Predicted: {:.2}",
            (i + 1).to_string().green(),
            rec.title,
            rec.category,
            rec.predicted_rating
        );
        if explain {
            if let Some(explanation) = response.explanations.get(&rec.course_id) {
                println!("   {}", explanation.message.dimmed());
            }
        }
    }
}
