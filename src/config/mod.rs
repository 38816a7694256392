use crate::error::{RecommendError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub knn: KnnConfig,
    pub recommendation: RecommendationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| RecommendError::InvalidConfig(format!("bad server address: {}", e)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub ratings_path: String,
    pub courses_path: String,
    pub rating_min: f64,
    pub rating_max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnConfig {
    /// Neighborhood size.
    pub k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    pub top_n: usize,
    pub max_top_n: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                workers: num_cpus::get(),
            },
            data: DataConfig {
                ratings_path: "filtered_course_ratings.csv".to_string(),
                courses_path: "filtered_courses.csv".to_string(),
                rating_min: 1.0,
                rating_max: 5.0,
            },
            knn: KnnConfig { k: 40 },
            recommendation: RecommendationConfig {
                top_n: 10,
                max_top_n: 100,
            },
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("COURSEREC").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.knn.k == 0 {
            return Err(RecommendError::InvalidConfig(
                "knn.k must be greater than 0".to_string(),
            ));
        }

        if self.recommendation.top_n == 0 {
            return Err(RecommendError::InvalidConfig(
                "recommendation.top_n must be greater than 0".to_string(),
            ));
        }

        if self.recommendation.top_n > self.recommendation.max_top_n {
            return Err(RecommendError::InvalidConfig(format!(
                "recommendation.top_n ({}) exceeds max_top_n ({})",
                self.recommendation.top_n, self.recommendation.max_top_n
            )));
        }

        if !(self.data.rating_min < self.data.rating_max) {
            return Err(RecommendError::InvalidConfig(format!(
                "rating scale [{}, {}] is empty",
                self.data.rating_min, self.data.rating_max
            )));
        }

        Ok(())
    }
}
