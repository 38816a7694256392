use anyhow::Result;
use clap::Parser;
use courserec::algorithms::Trainset;
use courserec::services::recommendation::RecommendationService;
use courserec::{init_tracing, Config, RecommendationRequest};
use tracing::{info, warn};

/// Fits the content KNN model once and prints top-N lists for sample users.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Raw user id to sample; repeat for several users. Defaults to every
    /// user with ratings.
    #[arg(short, long = "user")]
    users: Vec<String>,

    /// Recommendations per user; defaults to `recommendation.top_n`.
    #[arg(short, long)]
    num: Option<usize>,

    /// Print each response as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

fn sample_users(service: &RecommendationService, requested: &[String]) -> Vec<String> {
    if !requested.is_empty() {
        return requested.to_vec();
    }

    let trainset = service.trainset();
    (0..trainset.n_users())
        .filter_map(|uid| trainset.to_raw_uid(uid).map(str::to_string))
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };
    config.validate()?;

    info!("Loading course data and fitting content KNN (k = {})", config.knn.k);
    let service = RecommendationService::load(&config)?;

    let num_recommendations = args.num.unwrap_or(config.recommendation.top_n);
    let users = sample_users(&service, &args.users);
    info!("Sampling recommendations for {} users", users.len());

    for user_id in &users {
        let request = RecommendationRequest {
            user_id: user_id.clone(),
            num_recommendations,
        };

        match service.recommend(&request) {
            Ok(response) if args.json => {
                println!("{}", serde_json::to_string(&response)?);
            }
            Ok(response) if response.recommendations.is_empty() => {
                println!("\nUser: {}", user_id);
                println!("  (no course has a usable neighbor)");
            }
            Ok(response) => {
                println!("\nUser: {}", user_id);
                for item in &response.recommendations {
                    println!(
                        "  {:.3}  {}  {}",
                        item.estimated_rating,
                        item.course_id,
                        item.name
                    );
                }
            }
            Err(e) => warn!("Cannot recommend for user {}: {}", user_id, e),
        }
    }

    Ok(())
}
