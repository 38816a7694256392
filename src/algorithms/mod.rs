pub mod content_knn;
pub mod similarity;

pub use content_knn::ContentKnn;
pub use similarity::{attribute_similarity, SimilarityMatrix};

use crate::error::{PredictionImpossible, Result};
use crate::models::CourseAttributes;
use std::sync::Arc;

/// Fitted rating set: dense inner indices for users and items plus the
/// per-user rating histories expressed in those indices.
pub trait Trainset: Send + Sync {
    fn n_items(&self) -> usize;

    fn n_users(&self) -> usize;

    fn to_raw_iid(&self, iid: usize) -> Option<&str>;

    fn to_inner_uid(&self, raw_uid: &str) -> Option<usize>;

    fn to_inner_iid(&self, raw_iid: &str) -> Option<usize>;

    fn knows_user(&self, uid: usize) -> bool {
        uid < self.n_users()
    }

    fn knows_item(&self, iid: usize) -> bool {
        iid < self.n_items()
    }

    /// `(item index, rating)` pairs, one per distinct item the user rated.
    /// Empty for unknown users.
    fn user_ratings(&self, uid: usize) -> &[(usize, f64)];
}

/// Read-only attribute lookup keyed by raw item id.
pub trait AttributeCatalog: Send + Sync {
    /// Unknown ids yield empty attributes rather than an error.
    fn attributes_of(&self, raw_iid: &str) -> CourseAttributes;
}

pub trait RatingPredictor: Send + Sync {
    fn fit(&mut self, trainset: Arc<dyn Trainset>) -> Result<()>;

    /// Estimate in inner-index space.
    fn estimate(&self, uid: usize, iid: usize) -> Result<f64>;

    /// The trainset recorded by the last successful `fit`.
    fn trainset(&self) -> Result<&Arc<dyn Trainset>>;

    /// Estimate for raw ids, resolving them through the fitted trainset.
    fn predict(&self, raw_uid: &str, raw_iid: &str) -> Result<f64> {
        let trainset = self.trainset()?;
        match (trainset.to_inner_uid(raw_uid), trainset.to_inner_iid(raw_iid)) {
            (Some(uid), Some(iid)) => self.estimate(uid, iid),
            _ => Err(PredictionImpossible::UnknownEntity.into()),
        }
    }
}
