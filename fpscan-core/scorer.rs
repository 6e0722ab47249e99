//! Ratio-test filtering and similarity scoring of one (sample, candidate) pair.

use std::collections::HashMap;

use crate::traits::NearestNeighborMatcher;
use crate::types::{AcceptedMatch, DescriptorSet, KnnMatch};

/// Nearest distance must be below this fraction of the second-nearest
pub const RATIO_THRESHOLD: f32 = 0.7;

/// Score and the correspondences it was computed from
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub score: f64,
    pub accepted: Vec<AcceptedMatch>,
}

/// `100 * accepted / min(a, b)`, or 0 when either keypoint count is 0
pub fn similarity(accepted: usize, sample_len: usize, candidate_len: usize) -> f64 {
    let denom = sample_len.min(candidate_len);
    if denom == 0 {
        return 0.0;
    }
    100.0 * accepted as f64 / denom as f64
}

/// Keep correspondences whose nearest distance is strictly below `ratio`
/// times the second-nearest distance.
///
/// Queries without a second neighbour are rejected. When several queries
/// accept the same train descriptor only the closest one is kept (lower query
/// index on equal distance), so the result never holds more entries than
/// either descriptor set.
pub fn ratio_test(knn: &[KnnMatch], ratio: f32) -> Vec<AcceptedMatch> {
    let mut by_train: HashMap<usize, AcceptedMatch> = HashMap::new();

    for m in knn {
        let Some(second) = m.second else { continue };
        let distinct = m.nearest.distance < ratio * second.distance;
        if !distinct {
            continue;
        }
        by_train
            .entry(m.nearest.train_idx)
            .and_modify(|kept| {
                let closer = m.nearest.distance < kept.distance;
                let tie_earlier =
                    m.nearest.distance == kept.distance && m.nearest.query_idx < kept.query_idx;
                if closer || tie_earlier {
                    *kept = m.nearest;
                }
            })
            .or_insert(m.nearest);
    }

    let mut accepted: Vec<AcceptedMatch> = by_train.into_values().collect();
    accepted.sort_by_key(|m| m.query_idx);
    accepted
}

/// Match `sample` against `candidate` and score the accepted correspondences.
pub fn score<M>(sample: &DescriptorSet, candidate: &DescriptorSet, ratio: f32, matcher: &M) -> Scored
where
    M: NearestNeighborMatcher + ?Sized,
{
    if sample.is_empty() || candidate.is_empty() {
        return Scored {
            score: 0.0,
            accepted: Vec::new(),
        };
    }

    let knn = matcher.knn2(sample, candidate);
    let accepted = ratio_test(&knn, ratio);
    Scored {
        score: similarity(accepted.len(), sample.len(), candidate.len()),
        accepted,
    }
}
