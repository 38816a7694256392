pub mod algorithms;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{PredictionImpossible, RecommendError};
pub use models::*;

use anyhow::Result;
use parking_lot::RwLock;
use services::recommendation::RecommendationService;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    recommendation_service: Arc<RwLock<Arc<RecommendationService>>>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let service = RecommendationService::load(&config)?;

        Ok(Self::with_service(config, service))
    }

    pub fn with_service(config: Config, service: RecommendationService) -> Self {
        Self {
            config: Arc::new(config),
            recommendation_service: Arc::new(RwLock::new(Arc::new(service))),
        }
    }

    /// The currently published model. Callers keep using the returned
    /// snapshot even if a refit swaps in a newer one meanwhile.
    pub fn recommendation_service(&self) -> Arc<RecommendationService> {
        self.recommendation_service.read().clone()
    }

    /// Reloads catalog and ratings and fits a fresh model off the async
    /// runtime. The old model keeps serving until the new one is complete.
    pub async fn refit(&self) -> Result<()> {
        let config = self.config.clone();
        let service = tokio::task::spawn_blocking(move || RecommendationService::load(&config)).await??;

        *self.recommendation_service.write() = Arc::new(service);
        info!("Published refitted recommendation model");
        Ok(())
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
