use thiserror::Error;

/// Why a single prediction could not be produced.
///
/// Both cases are expected per-call outcomes; callers ranking many items
/// skip them instead of aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PredictionImpossible {
    /// User or item is absent from the trained index space.
    #[error("user and/or item is unknown")]
    UnknownEntity,
    /// No selected neighbor carried positive similarity.
    #[error("no neighbors")]
    NoNeighbors,
}

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("model has not been fitted")]
    NotFitted,

    #[error("prediction impossible: {0}")]
    PredictionImpossible(#[from] PredictionImpossible),

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("{path}:{line}: {message}")]
    CsvParse {
        path: String,
        line: u64,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RecommendError {
    pub fn is_prediction_impossible(&self) -> bool {
        matches!(self, RecommendError::PredictionImpossible(_))
    }
}

pub type Result<T> = std::result::Result<T, RecommendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_impossible_messages_are_distinct() {
        let unknown = RecommendError::from(PredictionImpossible::UnknownEntity);
        let empty = RecommendError::from(PredictionImpossible::NoNeighbors);

        assert_eq!(unknown.to_string(), "prediction impossible: user and/or item is unknown");
        assert_eq!(empty.to_string(), "prediction impossible: no neighbors");
        assert!(unknown.is_prediction_impossible());
        assert!(!RecommendError::NotFitted.is_prediction_impossible());
    }
}
