use crate::models::*;
use anyhow::{anyhow, Result};

const MAX_ID_LENGTH: usize = 256;

pub fn validate_raw_id(kind: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(anyhow!("{} ID cannot be empty", kind));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(anyhow!("{} ID too long (max {} characters)", kind, MAX_ID_LENGTH));
    }

    Ok(())
}

pub fn validate_rating(rating: &Rating, rating_min: f64, rating_max: f64) -> Result<()> {
    validate_raw_id("User", &rating.user_id)?;
    validate_raw_id("Course", &rating.course_id)?;

    if !rating.score.is_finite() {
        return Err(anyhow!("Rating score contains invalid value (NaN or Infinity)"));
    }

    if rating.score < rating_min || rating.score > rating_max {
        return Err(anyhow!(
            "Rating score {} outside scale [{}, {}]",
            rating.score,
            rating_min,
            rating_max
        ));
    }

    Ok(())
}

pub fn validate_recommendation_request(request: &RecommendationRequest, max_top_n: usize) -> Result<()> {
    validate_raw_id("User", &request.user_id)?;

    if request.num_recommendations == 0 {
        return Err(anyhow!("Number of recommendations must be greater than 0"));
    }

    if request.num_recommendations > max_top_n {
        return Err(anyhow!(
            "Number of recommendations too large (max {})",
            max_top_n
        ));
    }

    Ok(())
}
