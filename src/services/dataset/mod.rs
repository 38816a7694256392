use crate::algorithms::Trainset;
use crate::error::{RecommendError, Result};
use crate::models::Rating;
use crate::utils::validation::validate_rating;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Ratings as loaded, before any index assignment.
#[derive(Debug, Clone, Default)]
pub struct RatingDataset {
    ratings: Vec<Rating>,
}

impl RatingDataset {
    pub fn from_ratings(ratings: Vec<Rating>) -> Self {
        Self { ratings }
    }

    /// Reads a headered CSV with columns `user, item, rating[, timestamp]`
    /// (by position). Rows outside `[rating_min, rating_max]` are skipped.
    pub fn load<P: AsRef<Path>>(path: P, rating_min: f64, rating_max: f64) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| RecommendError::Io {
                path: path_str.clone(),
                message: format!("Failed to open CSV: {e}"),
            })?;

        let mut ratings = Vec::new();
        let mut skipped = 0usize;

        for record in reader.records() {
            let record = record.map_err(|e| RecommendError::CsvParse {
                path: path_str.clone(),
                line: e.position().map(|p| p.line()).unwrap_or(0),
                message: e.to_string(),
            })?;

            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let field = |i: usize| record.get(i).unwrap_or("").trim();

            let score: f64 = field(2).parse().map_err(|e| RecommendError::CsvParse {
                path: path_str.clone(),
                line,
                message: format!("invalid rating {:?}: {e}", field(2)),
            })?;

            let mut rating = Rating::new(field(0), field(1), score);
            if !field(3).is_empty() {
                rating = rating.with_timestamp(field(3));
            }

            if let Err(e) = validate_rating(&rating, rating_min, rating_max) {
                warn!("{}:{}: skipping rating: {}", path_str, line, e);
                skipped += 1;
                continue;
            }

            ratings.push(rating);
        }

        info!(
            "Loaded {} ratings from {} ({} skipped)",
            ratings.len(),
            path_str,
            skipped
        );
        Ok(Self { ratings })
    }

    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// All `(course id, score)` pairs rated by `user_id`, in load order.
    pub fn user_ratings(&self, user_id: &str) -> Vec<(String, f64)> {
        self.ratings
            .iter()
            .filter(|rating| rating.user_id == user_id)
            .map(|rating| (rating.course_id.clone(), rating.score))
            .collect()
    }

    /// Rank 1 is the most-rated course; equal counts rank by course id.
    pub fn popularity_ranks(&self) -> HashMap<String, usize> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for rating in &self.ratings {
            *counts.entry(rating.course_id.as_str()).or_insert(0) += 1;
        }

        let mut ordered: Vec<(&str, usize)> = counts.into_iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

        ordered
            .into_iter()
            .enumerate()
            .map(|(i, (course_id, _))| (course_id.to_string(), i + 1))
            .collect()
    }

    /// Assigns inner indices in order of first appearance. A repeated
    /// `(user, course)` pair keeps its last score.
    pub fn build_full_trainset(&self) -> TrainingSet {
        let mut trainset = TrainingSet::default();
        let mut duplicates = 0usize;

        for rating in &self.ratings {
            let uid = intern(&mut trainset.raw2inner_uid, &mut trainset.raw_uids, &rating.user_id);
            let iid = intern(&mut trainset.raw2inner_iid, &mut trainset.raw_iids, &rating.course_id);

            if uid == trainset.ur.len() {
                trainset.ur.push(Vec::new());
            }

            let history = &mut trainset.ur[uid];
            match history.iter_mut().find(|(rated, _)| *rated == iid) {
                Some(entry) => {
                    entry.1 = rating.score;
                    duplicates += 1;
                }
                None => {
                    history.push((iid, rating.score));
                    trainset.n_ratings += 1;
                }
            }
        }

        if duplicates > 0 {
            warn!("{} duplicate user/course ratings collapsed to their last value", duplicates);
        }

        info!(
            "Built trainset: {} users, {} items, {} ratings",
            trainset.n_users(),
            trainset.n_items(),
            trainset.n_ratings
        );
        trainset
    }
}

fn intern(lookup: &mut HashMap<String, usize>, raw_ids: &mut Vec<String>, raw: &str) -> usize {
    if let Some(&inner) = lookup.get(raw) {
        return inner;
    }
    let inner = raw_ids.len();
    raw_ids.push(raw.to_string());
    lookup.insert(raw.to_string(), inner);
    inner
}

/// Ratings re-keyed by dense inner indices.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    raw2inner_uid: HashMap<String, usize>,
    raw2inner_iid: HashMap<String, usize>,
    raw_uids: Vec<String>,
    raw_iids: Vec<String>,
    ur: Vec<Vec<(usize, f64)>>,
    n_ratings: usize,
}

impl TrainingSet {
    pub fn to_raw_uid(&self, uid: usize) -> Option<&str> {
        self.raw_uids.get(uid).map(String::as_str)
    }

    pub fn n_ratings(&self) -> usize {
        self.n_ratings
    }

    pub fn all_items(&self) -> std::ops::Range<usize> {
        0..self.raw_iids.len()
    }
}

impl Trainset for TrainingSet {
    fn n_items(&self) -> usize {
        self.raw_iids.len()
    }

    fn n_users(&self) -> usize {
        self.raw_uids.len()
    }

    fn to_raw_iid(&self, iid: usize) -> Option<&str> {
        self.raw_iids.get(iid).map(String::as_str)
    }

    fn to_inner_uid(&self, raw_uid: &str) -> Option<usize> {
        self.raw2inner_uid.get(raw_uid).copied()
    }

    fn to_inner_iid(&self, raw_iid: &str) -> Option<usize> {
        self.raw2inner_iid.get(raw_iid).copied()
    }

    fn user_ratings(&self, uid: usize) -> &[(usize, f64)] {
        self.ur.get(uid).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn dataset() -> RatingDataset {
        RatingDataset::from_ratings(vec![
            Rating::new("u1", "c1", 5.0),
            Rating::new("u1", "c2", 3.0),
            Rating::new("u2", "c2", 4.0),
            Rating::new("u3", "c3", 2.0),
            Rating::new("u3", "c2", 1.0),
        ])
    }

    #[test]
    fn test_trainset_indices_follow_first_appearance() {
        let trainset = dataset().build_full_trainset();
        assert_eq!(trainset.n_users(), 3);
        assert_eq!(trainset.n_items(), 3);
        assert_eq!(trainset.n_ratings(), 5);
        assert_eq!(trainset.to_inner_uid("u2"), Some(1));
        assert_eq!(trainset.to_inner_iid("c3"), Some(2));
        assert_eq!(trainset.to_raw_iid(1), Some("c2"));
        assert_eq!(trainset.to_raw_uid(2), Some("u3"));
        assert_eq!(trainset.user_ratings(2), &[(2, 2.0), (1, 1.0)]);
        assert!(trainset.knows_item(2));
        assert!(!trainset.knows_item(3));
        assert!(trainset.user_ratings(99).is_empty());
    }

    #[test]
    fn test_duplicate_rating_keeps_last() {
        let trainset = RatingDataset::from_ratings(vec![
            Rating::new("u1", "c1", 2.0),
            Rating::new("u1", "c1", 4.0),
        ])
        .build_full_trainset();
        assert_eq!(trainset.user_ratings(0), &[(0, 4.0)]);
        assert_eq!(trainset.n_ratings(), 1);
    }

    #[test]
    fn test_popularity_ranks() {
        let ranks = dataset().popularity_ranks();
        assert_eq!(ranks["c2"], 1);
        // c1 and c3 both have one rating; the id breaks the tie.
        assert_eq!(ranks["c1"], 2);
        assert_eq!(ranks["c3"], 3);
    }

    #[test]
    fn test_user_ratings_by_raw_id() {
        let ratings = dataset().user_ratings("u3");
        assert_eq!(ratings, vec![("c3".to_string(), 2.0), ("c2".to_string(), 1.0)]);
        assert!(dataset().user_ratings("nobody").is_empty());
    }

    #[test]
    fn test_load_csv_skips_out_of_scale_rows() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "student_id,course_id,rating_point,timestamp").expect("write header");
        writeln!(file, "u1,c1,4.5,1700000000").expect("write row");
        writeln!(file, "u1,c2,9").expect("write row");
        writeln!(file, "u2,c1,1").expect("write row");

        let dataset = RatingDataset::load(file.path(), 1.0, 5.0).expect("load");
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.ratings()[0].timestamp.as_deref(), Some("1700000000"));
        assert_eq!(dataset.ratings()[1].timestamp, None);
    }

    #[test]
    fn test_load_csv_rejects_unparseable_rating() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "student_id,course_id,rating_point").expect("write header");
        writeln!(file, "u1,c1,great").expect("write row");

        let err = RatingDataset::load(file.path(), 1.0, 5.0).expect_err("bad rating");
        assert!(matches!(err, RecommendError::CsvParse { line: 2, .. }));
    }
}
