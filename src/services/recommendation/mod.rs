use crate::algorithms::{ContentKnn, RatingPredictor, Trainset};
use crate::config::Config;
use crate::error::{PredictionImpossible, Result};
use crate::models::*;
use crate::services::catalog::CourseCatalog;
use crate::services::dataset::{RatingDataset, TrainingSet};
use crate::utils::descending;
use chrono::Utc;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// A fitted content KNN model together with the data it was fitted on.
///
/// Everything is immutable after construction; a catalog or rating reload
/// means building a new service.
pub struct RecommendationService {
    catalog: Arc<CourseCatalog>,
    dataset: RatingDataset,
    trainset: Arc<TrainingSet>,
    model: ContentKnn,
    popularity_ranks: HashMap<String, usize>,
}

impl RecommendationService {
    pub fn load(config: &Config) -> Result<Self> {
        let catalog = CourseCatalog::load(&config.data.courses_path)?;
        let dataset = RatingDataset::load(
            &config.data.ratings_path,
            config.data.rating_min,
            config.data.rating_max,
        )?;

        Self::from_parts(catalog, dataset, config.knn.k)
    }

    pub fn from_parts(catalog: CourseCatalog, dataset: RatingDataset, k: usize) -> Result<Self> {
        let started = Instant::now();
        let catalog = Arc::new(catalog);
        let trainset = Arc::new(dataset.build_full_trainset());
        let popularity_ranks = dataset.popularity_ranks();

        let mut model = ContentKnn::with_catalog(k, catalog.clone());
        model.fit(trainset.clone())?;

        info!(
            "Content KNN fitted (k = {}, {} items) in {:?}",
            k,
            trainset.n_items(),
            started.elapsed()
        );

        Ok(Self {
            catalog,
            dataset,
            trainset,
            model,
            popularity_ranks,
        })
    }

    pub fn predict(&self, user_id: &str, course_id: &str) -> Result<PredictionResponse> {
        let estimated_rating = self.model.predict(user_id, course_id)?;

        Ok(PredictionResponse {
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            estimated_rating,
        })
    }

    /// Ranks every course the user has not rated by estimated rating.
    /// Courses with no usable neighbors are left out.
    pub fn recommend(&self, request: &RecommendationRequest) -> Result<RecommendationResponse> {
        let uid = self
            .trainset
            .to_inner_uid(&request.user_id)
            .ok_or(PredictionImpossible::UnknownEntity)?;

        let rated: HashSet<usize> = self
            .trainset
            .user_ratings(uid)
            .iter()
            .map(|&(iid, _)| iid)
            .collect();

        let mut scored: Vec<(usize, f64)> = self
            .trainset
            .all_items()
            .into_par_iter()
            .filter(|iid| !rated.contains(iid))
            .filter_map(|iid| match self.model.estimate(uid, iid) {
                Ok(rating) => Some(Ok((iid, rating))),
                Err(e) if e.is_prediction_impossible() => None,
                Err(e) => Some(Err(e)),
            })
            .collect::<Result<Vec<_>>>()?;

        scored.sort_unstable_by(|a, b| descending(a.1, b.1).then(a.0.cmp(&b.0)));
        scored.truncate(request.num_recommendations);

        let recommendations = scored
            .into_iter()
            .filter_map(|(iid, estimated_rating)| {
                let course_id = self.trainset.to_raw_iid(iid)?;
                Some(RecommendationItem {
                    course_id: course_id.to_string(),
                    name: self.catalog.name_of(course_id).to_string(),
                    estimated_rating,
                    popularity_rank: self.popularity_ranks.get(course_id).copied(),
                })
            })
            .collect();

        Ok(RecommendationResponse {
            user_id: request.user_id.clone(),
            recommendations,
            generated_at: Utc::now(),
        })
    }

    pub fn user_ratings(&self, user_id: &str) -> Vec<(String, f64)> {
        self.dataset.user_ratings(user_id)
    }

    pub fn course(&self, course_id: &str) -> Option<&Course> {
        self.catalog.course(course_id)
    }

    pub fn popularity_rank(&self, course_id: &str) -> Option<usize> {
        self.popularity_ranks.get(course_id).copied()
    }

    pub fn trainset(&self) -> &TrainingSet {
        &self.trainset
    }

    pub fn model(&self) -> &ContentKnn {
        &self.model
    }
}
