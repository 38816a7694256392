use std::cmp::Ordering;

pub mod validation;

/// Descending order on scores. `total_cmp` keeps the order total even if a
/// NaN slips in.
pub fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// The `k` smallest items under `compare`, sorted by `compare`.
///
/// Selection runs in O(n) before the final sort of the kept `k`, so the cost
/// of a long history is dominated by the partition, not a full sort. With a
/// total `compare` the result does not depend on input order.
pub fn top_k_by<T, F>(mut items: Vec<T>, k: usize, mut compare: F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    if k == 0 {
        return Vec::new();
    }

    if items.len() > k {
        items.select_nth_unstable_by(k - 1, &mut compare);
        items.truncate(k);
    }

    items.sort_unstable_by(&mut compare);
    items
}

pub fn top_k_indices(scores: &[f64], k: usize) -> Vec<usize> {
    let indexed_scores: Vec<(usize, f64)> = scores.iter().copied().enumerate().collect();

    top_k_by(indexed_scores, k, |a, b| descending(a.1, b.1).then(a.0.cmp(&b.0)))
        .into_iter()
        .map(|(i, _)| i)
        .collect()
}

/// Weighted mean of `(weight, value)` pairs. `None` when the total weight is
/// not positive.
pub fn weighted_average<I>(pairs: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (weighted_sum, total_weight) = pairs
        .into_iter()
        .fold((0.0, 0.0), |(sum, total), (weight, value)| {
            (sum + weight * value, total + weight)
        });

    if total_weight > 0.0 {
        Some(weighted_sum / total_weight)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_k_indices() {
        let scores = vec![0.1, 0.5, 0.3, 0.9, 0.2];
        let top_2 = top_k_indices(&scores, 2);
        assert_eq!(top_2, vec![3, 1]);
    }

    #[test]
    fn test_top_k_ties_prefer_lower_index() {
        let scores = vec![0.4, 0.8, 0.4, 0.8, 0.4];
        assert_eq!(top_k_indices(&scores, 3), vec![1, 3, 0]);
    }

    #[test]
    fn test_top_k_larger_than_input() {
        let scores = vec![0.2, 0.6];
        assert_eq!(top_k_indices(&scores, 10), vec![1, 0]);
        assert!(top_k_indices(&scores, 0).is_empty());
        assert!(top_k_indices(&[], 3).is_empty());
    }

    #[test]
    fn test_weighted_average() {
        let avg = weighted_average(vec![(0.8, 5.0), (0.2, 1.0)]).expect("positive weight");
        assert!((avg - 4.2).abs() < 1e-9);

        assert_eq!(weighted_average(Vec::<(f64, f64)>::new()), None);
        assert_eq!(weighted_average(vec![(0.0, 3.0)]), None);
    }
}
