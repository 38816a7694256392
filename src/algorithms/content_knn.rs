use super::{AttributeCatalog, RatingPredictor, SimilarityMatrix, Trainset};
use crate::error::{PredictionImpossible, RecommendError, Result};
use crate::utils::{descending, top_k_by, weighted_average};
use std::sync::Arc;
use tracing::debug;

/// Neighbor candidate drawn from the user's rating history.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Neighbor {
    iid: usize,
    similarity: f64,
    rating: f64,
}

struct Fitted {
    trainset: Arc<dyn Trainset>,
    similarities: SimilarityMatrix,
}

/// Content-based item KNN.
///
/// `fit` builds the attribute similarity matrix once; `estimate` predicts a
/// rating as the similarity-weighted mean of the user's `k` most similar
/// rated items. Neighbors are ranked by similarity, ties going to the lower
/// inner item index.
pub struct ContentKnn {
    k: usize,
    catalog: Option<Arc<dyn AttributeCatalog>>,
    fitted: Option<Fitted>,
}

impl ContentKnn {
    pub fn new(k: usize, catalog: Option<Arc<dyn AttributeCatalog>>) -> Self {
        Self {
            k,
            catalog,
            fitted: None,
        }
    }

    pub fn with_catalog(k: usize, catalog: Arc<dyn AttributeCatalog>) -> Self {
        Self::new(k, Some(catalog))
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn similarities(&self) -> Option<&SimilarityMatrix> {
        self.fitted.as_ref().map(|fitted| &fitted.similarities)
    }

    fn fitted(&self) -> Result<&Fitted> {
        self.fitted.as_ref().ok_or(RecommendError::NotFitted)
    }
}

impl RatingPredictor for ContentKnn {
    fn fit(&mut self, trainset: Arc<dyn Trainset>) -> Result<()> {
        let catalog = self
            .catalog
            .as_ref()
            .ok_or(RecommendError::MissingCollaborator(
                "an attribute catalog is required to compute similarity",
            ))?;

        let similarities = SimilarityMatrix::build(trainset.as_ref(), catalog.as_ref());
        self.fitted = Some(Fitted {
            trainset,
            similarities,
        });
        Ok(())
    }

    fn estimate(&self, uid: usize, iid: usize) -> Result<f64> {
        let fitted = self.fitted()?;
        let trainset = fitted.trainset.as_ref();

        if !(trainset.knows_user(uid) && trainset.knows_item(iid)) {
            return Err(PredictionImpossible::UnknownEntity.into());
        }

        let candidates: Vec<Neighbor> = trainset
            .user_ratings(uid)
            .iter()
            .map(|&(neighbor_iid, rating)| Neighbor {
                iid: neighbor_iid,
                similarity: fitted.similarities.get(iid, neighbor_iid).unwrap_or(0.0),
                rating,
            })
            .collect();

        let neighbors = top_k_by(candidates, self.k, |a, b| {
            descending(a.similarity, b.similarity).then(a.iid.cmp(&b.iid))
        });

        let prediction = weighted_average(
            neighbors
                .iter()
                .filter(|neighbor| neighbor.similarity > 0.0)
                .map(|neighbor| (neighbor.similarity, neighbor.rating)),
        );

        match prediction {
            Some(rating) => Ok(rating),
            None => {
                debug!("No positively similar neighbors for user {} item {}", uid, iid);
                Err(PredictionImpossible::NoNeighbors.into())
            }
        }
    }

    fn trainset(&self) -> Result<&Arc<dyn Trainset>> {
        Ok(&self.fitted()?.trainset)
    }
}
