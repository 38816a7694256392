use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categorical attributes of a course. Tokens are opaque: only equality
/// matters, and a missing field is the empty token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseAttributes {
    pub difficulty_level: String,
    pub category_id: String,
    pub lecturer_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: String,
    pub name: String,
    pub attributes: CourseAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: String,
    pub course_id: String,
    pub score: f64,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: String,
    pub num_recommendations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub user_id: String,
    pub recommendations: Vec<RecommendationItem>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub course_id: String,
    pub name: String,
    pub estimated_rating: f64,
    pub popularity_rank: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub user_id: String,
    pub course_id: String,
    pub estimated_rating: f64,
}

impl CourseAttributes {
    pub fn new(
        difficulty_level: impl Into<String>,
        category_id: impl Into<String>,
        lecturer_id: impl Into<String>,
    ) -> Self {
        Self {
            difficulty_level: difficulty_level.into(),
            category_id: category_id.into(),
            lecturer_id: lecturer_id.into(),
        }
    }
}

impl Course {
    pub fn new(course_id: impl Into<String>, name: impl Into<String>, attributes: CourseAttributes) -> Self {
        Self {
            course_id: course_id.into(),
            name: name.into(),
            attributes,
        }
    }
}

impl Rating {
    pub fn new(user_id: impl Into<String>, course_id: impl Into<String>, score: f64) -> Self {
        Self {
            user_id: user_id.into(),
            course_id: course_id.into(),
            score,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}
