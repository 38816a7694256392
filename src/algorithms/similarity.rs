use super::{AttributeCatalog, Trainset};
use crate::models::CourseAttributes;
use ndarray::Array2;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

// Match weights in tenths so every reachable score is an exact literal
// from {0, 0.2, 0.4, 0.6, 0.8, 1.0}.
const DIFFICULTY_WEIGHT: u8 = 4;
const CATEGORY_WEIGHT: u8 = 4;
const LECTURER_WEIGHT: u8 = 2;
const WEIGHT_SCALE: f64 = 10.0;

const PROGRESS_INTERVAL: usize = 100;

/// Content similarity of two courses: 0.4 for equal difficulty, 0.4 for equal
/// category, 0.2 for equal lecturer. Two empty tokens are equal.
pub fn attribute_similarity(a: &CourseAttributes, b: &CourseAttributes) -> f64 {
    weighted_matches(
        a.difficulty_level == b.difficulty_level,
        a.category_id == b.category_id,
        a.lecturer_id == b.lecturer_id,
    )
}

fn weighted_matches(same_difficulty: bool, same_category: bool, same_lecturer: bool) -> f64 {
    let mut tenths = 0u8;
    if same_difficulty {
        tenths += DIFFICULTY_WEIGHT;
    }
    if same_category {
        tenths += CATEGORY_WEIGHT;
    }
    if same_lecturer {
        tenths += LECTURER_WEIGHT;
    }
    f64::from(tenths) / WEIGHT_SCALE
}

/// Attribute tokens mapped to small integer codes. Equal tokens share a code,
/// so comparing codes is equivalent to comparing the strings.
#[derive(Debug, Default)]
struct TokenInterner {
    codes: HashMap<String, u32>,
}

impl TokenInterner {
    fn intern(&mut self, token: &str) -> u32 {
        if let Some(&code) = self.codes.get(token) {
            return code;
        }
        let code = self.codes.len() as u32;
        self.codes.insert(token.to_string(), code);
        code
    }

    fn encode(&mut self, attributes: &CourseAttributes) -> [u32; 3] {
        [
            self.intern(&attributes.difficulty_level),
            self.intern(&attributes.category_id),
            self.intern(&attributes.lecturer_id),
        ]
    }
}

/// Dense, symmetric item-item similarity over inner item indices.
///
/// The diagonal is never written and stays 0: an item is not its own
/// neighbor, so a user's rating of the target item does not feed back into
/// its own estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    values: Array2<f64>,
}

impl SimilarityMatrix {
    pub fn zeros(n_items: usize) -> Self {
        Self {
            values: Array2::zeros((n_items, n_items)),
        }
    }

    /// Scores every unordered pair `p < q` of the trainset's items once and
    /// writes the score to both `(p, q)` and `(q, p)`.
    pub fn build(trainset: &dyn Trainset, catalog: &dyn AttributeCatalog) -> Self {
        let n_items = trainset.n_items();
        let started = Instant::now();
        info!("Computing content-based similarity matrix for {} items", n_items);

        let mut interner = TokenInterner::default();
        let codes: Vec<[u32; 3]> = (0..n_items)
            .map(|iid| {
                let attributes = trainset
                    .to_raw_iid(iid)
                    .map(|raw| catalog.attributes_of(raw))
                    .unwrap_or_default();
                interner.encode(&attributes)
            })
            .collect();

        let mut matrix = Self::zeros(n_items);
        for p in 0..n_items {
            if p % PROGRESS_INTERVAL == 0 {
                debug!("{} of {}", p, n_items);
            }
            let this = codes[p];
            for q in (p + 1)..n_items {
                let other = codes[q];
                let similarity = weighted_matches(
                    this[0] == other[0],
                    this[1] == other[1],
                    this[2] == other[2],
                );
                matrix.set_symmetric(p, q, similarity);
            }
        }

        info!(
            "Similarity matrix done: {} items, {} distinct attribute tokens, {:?}",
            n_items,
            interner.codes.len(),
            started.elapsed()
        );
        matrix
    }

    fn set_symmetric(&mut self, p: usize, q: usize, similarity: f64) {
        self.values[[p, q]] = similarity;
        self.values[[q, p]] = similarity;
    }

    pub fn n_items(&self) -> usize {
        self.values.nrows()
    }

    /// Similarity of `p` and `q`, or `None` if either index is out of range.
    pub fn get(&self, p: usize, q: usize) -> Option<f64> {
        self.values.get([p, q]).copied()
    }

    pub fn is_symmetric(&self) -> bool {
        self.values == self.values.t()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::CourseCatalog;
    use crate::services::dataset::RatingDataset;
    use crate::models::{Course, Rating};

    const REACHABLE: [f64; 6] = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0];

    fn attrs(difficulty: &str, category: &str, lecturer: &str) -> CourseAttributes {
        CourseAttributes::new(difficulty, category, lecturer)
    }

    fn fixture() -> (CourseCatalog, RatingDataset) {
        let mut catalog = CourseCatalog::new();
        catalog.insert(Course::new("c1", "Rust Basics", attrs("beginner", "prog", "alice")));
        catalog.insert(Course::new("c2", "Rust Async", attrs("beginner", "prog", "bob")));
        catalog.insert(Course::new("c3", "Watercolor", attrs("expert", "art", "carol")));
        catalog.insert(Course::new("c4", "Go Basics", attrs("beginner", "prog", "alice")));
        catalog.insert(Course::new("c5", "Sketching", attrs("beginner", "art", "carol")));

        let dataset = RatingDataset::from_ratings(vec![
            Rating::new("u1", "c1", 5.0),
            Rating::new("u1", "c2", 4.0),
            Rating::new("u2", "c3", 2.0),
            Rating::new("u2", "c4", 3.0),
            Rating::new("u3", "c5", 1.0),
            Rating::new("u3", "unlisted", 4.0),
        ]);

        (catalog, dataset)
    }

    #[test]
    fn test_attribute_similarity_scenarios() {
        let a = attrs("beginner", "prog", "alice");
        assert_eq!(attribute_similarity(&a, &attrs("beginner", "prog", "bob")), 0.8);
        assert_eq!(attribute_similarity(&a, &attrs("expert", "art", "carol")), 0.0);
        assert_eq!(attribute_similarity(&a, &attrs("beginner", "art", "alice")), 0.6);
        assert_eq!(attribute_similarity(&a, &attrs("expert", "art", "alice")), 0.2);
        assert_eq!(attribute_similarity(&a, &a), 1.0);
    }

    #[test]
    fn test_empty_tokens_match_each_other() {
        let empty = CourseAttributes::default();
        assert_eq!(attribute_similarity(&empty, &empty), 1.0);
        assert_eq!(attribute_similarity(&empty, &attrs("", "prog", "")), 0.6);
    }

    #[test]
    fn test_build_properties() {
        let (catalog, dataset) = fixture();
        let trainset = dataset.build_full_trainset();
        let matrix = SimilarityMatrix::build(&trainset, &catalog);

        let n = trainset.n_items();
        assert_eq!(matrix.n_items(), n);
        assert!(matrix.is_symmetric());

        for p in 0..n {
            assert_eq!(matrix.get(p, p), Some(0.0));
            for q in 0..n {
                let value = matrix.get(p, q).expect("in range");
                if p != q {
                    assert!(REACHABLE.contains(&value), "unexpected score {}", value);
                }
            }
        }
        assert_eq!(matrix.get(n, 0), None);
    }

    #[test]
    fn test_build_matches_pairwise_scores() {
        let (catalog, dataset) = fixture();
        let trainset = dataset.build_full_trainset();
        let matrix = SimilarityMatrix::build(&trainset, &catalog);

        let idx = |raw: &str| trainset.to_inner_iid(raw).expect("known item");
        assert_eq!(matrix.get(idx("c1"), idx("c2")), Some(0.8));
        assert_eq!(matrix.get(idx("c1"), idx("c4")), Some(1.0));
        assert_eq!(matrix.get(idx("c1"), idx("c3")), Some(0.0));
        assert_eq!(matrix.get(idx("c3"), idx("c5")), Some(0.6));
        // Not in the catalog: all three tokens empty, matches nothing here.
        assert_eq!(matrix.get(idx("unlisted"), idx("c1")), Some(0.0));
    }

    #[test]
    fn test_build_is_deterministic() {
        let (catalog, dataset) = fixture();
        let trainset = dataset.build_full_trainset();
        let first = SimilarityMatrix::build(&trainset, &catalog);
        let second = SimilarityMatrix::build(&trainset, &catalog);
        assert_eq!(first, second);
    }

    #[test]
    fn test_build_empty_trainset() {
        let catalog = CourseCatalog::new();
        let trainset = RatingDataset::from_ratings(Vec::new()).build_full_trainset();
        let matrix = SimilarityMatrix::build(&trainset, &catalog);
        assert_eq!(matrix.n_items(), 0);
    }
}
