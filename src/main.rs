use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use courserec::utils::validation::validate_recommendation_request;
use courserec::{init_tracing, AppState, Config, PredictionImpossible, RecommendError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct RecommendationQuery {
    num_recommendations: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    message: String,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
        }
    }

    fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message,
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<T>>)>;

fn error_response<T>(e: &RecommendError) -> (StatusCode, Json<ApiResponse<T>>) {
    let status = match e {
        RecommendError::PredictionImpossible(PredictionImpossible::UnknownEntity) => StatusCode::NOT_FOUND,
        RecommendError::PredictionImpossible(PredictionImpossible::NoNeighbors) => StatusCode::UNPROCESSABLE_ENTITY,
        RecommendError::NotFitted => StatusCode::SERVICE_UNAVAILABLE,
        _ => {
            tracing::error!("Request failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ApiResponse::error(e.to_string())))
}

async fn health_check() -> Json<ApiResponse<HashMap<String, String>>> {
    let mut status = HashMap::new();
    status.insert("status".to_string(), "healthy".to_string());
    status.insert("service".to_string(), "courserec".to_string());
    status.insert("version".to_string(), env!("CARGO_PKG_VERSION").to_string());

    Json(ApiResponse::success(status))
}

async fn get_prediction(
    State(state): State<AppState>,
    Path((user_id, course_id)): Path<(String, String)>,
) -> ApiResult<courserec::PredictionResponse> {
    state
        .recommendation_service()
        .predict(&user_id, &course_id)
        .map(|prediction| Json(ApiResponse::success(prediction)))
        .map_err(|e| error_response(&e))
}

async fn get_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<RecommendationQuery>,
) -> ApiResult<courserec::RecommendationResponse> {
    let request = courserec::RecommendationRequest {
        user_id,
        num_recommendations: params
            .num_recommendations
            .unwrap_or(state.config.recommendation.top_n),
    };

    if let Err(e) = validate_recommendation_request(&request, state.config.recommendation.max_top_n) {
        return Err((StatusCode::BAD_REQUEST, Json(ApiResponse::error(e.to_string()))));
    }

    let service = state.recommendation_service();
    tokio::task::spawn_blocking(move || service.recommend(&request))
        .await
        .map_err(|e| {
            tracing::error!("Recommendation task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<courserec::RecommendationResponse>::error(
                    "recommendation task failed".to_string(),
                )),
            )
        })?
        .map(|response| Json(ApiResponse::success(response)))
        .map_err(|e| error_response(&e))
}

async fn get_user_ratings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<(String, f64)>> {
    let ratings = state.recommendation_service().user_ratings(&user_id);
    if ratings.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("no ratings for user {}", user_id))),
        ));
    }
    Ok(Json(ApiResponse::success(ratings)))
}

async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> ApiResult<courserec::Course> {
    match state.recommendation_service().course(&course_id) {
        Some(course) => Ok(Json(ApiResponse::success(course.clone()))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("unknown course {}", course_id))),
        )),
    }
}

async fn refit(State(state): State<AppState>) -> ApiResult<String> {
    match state.refit().await {
        Ok(()) => Ok(Json(ApiResponse::success("Model refitted".to_string()))),
        Err(e) => {
            tracing::error!("Refit failed, keeping previous model: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(e.to_string())),
            ))
        }
    }
}

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/predictions/:user_id/:course_id", get(get_prediction))
        .route("/recommendations/:user_id", get(get_recommendations))
        .route("/users/:user_id/ratings", get(get_user_ratings))
        .route("/courses/:course_id", get(get_course))
        .route("/refit", post(refit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };
    info!("Starting CourseRec server with config: {:?}", config.server);

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.server.workers)
        .build_global()?;

    let addr = config.server.socket_addr()?;
    let state = tokio::task::spawn_blocking(move || AppState::new(config)).await??;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
