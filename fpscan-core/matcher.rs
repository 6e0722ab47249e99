use rayon::prelude::*;

use crate::traits::NearestNeighborMatcher;
use crate::types::{Correspondence, DescriptorSet, KnnMatch};
use crate::Descriptor;

/// Number of differing bits between two binary descriptors
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Exhaustive Hamming-distance k=2 search, parallel over query descriptors.
///
/// Exact rather than approximate; equal distances resolve to the lower train
/// index.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceMatcher;

impl BruteForceMatcher {
    pub fn new() -> Self {
        Self
    }

    fn two_nearest(query_idx: usize, query: &Descriptor, train: &[Descriptor]) -> Option<KnnMatch> {
        let mut best: Option<(usize, u32)> = None;
        let mut second: Option<(usize, u32)> = None;

        for (train_idx, candidate) in train.iter().enumerate() {
            let d = hamming_distance(query, candidate);
            match best {
                Some((_, bd)) if d >= bd => {
                    if second.map_or(true, |(_, sd)| d < sd) {
                        second = Some((train_idx, d));
                    }
                }
                _ => {
                    second = best;
                    best = Some((train_idx, d));
                }
            }
        }

        let to_corr = |(train_idx, d): (usize, u32)| Correspondence {
            query_idx,
            train_idx,
            distance: d as f32,
        };

        best.map(|b| KnnMatch {
            nearest: to_corr(b),
            second: second.map(to_corr),
        })
    }
}

impl NearestNeighborMatcher for BruteForceMatcher {
    fn knn2(&self, query: &DescriptorSet, train: &DescriptorSet) -> Vec<KnnMatch> {
        let train = train.descriptors();
        if train.is_empty() {
            return Vec::new();
        }
        query
            .descriptors()
            .par_iter()
            .enumerate()
            .filter_map(|(i, d)| Self::two_nearest(i, d, train))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Keypoint;

    fn set_of(descs: &[Descriptor]) -> DescriptorSet {
        let kps = descs.iter().map(|_| Keypoint::new(0.0, 0.0)).collect();
        DescriptorSet::new(kps, descs.to_vec()).unwrap()
    }

    fn with_bits(n: usize) -> Descriptor {
        let mut d = [0u8; 32];
        for bit in 0..n {
            d[bit / 8] |= 1 << (bit % 8);
        }
        d
    }

    #[test]
    fn test_hamming_distance() {
        assert_eq!(hamming_distance(&[0; 32], &[0; 32]), 0);
        assert_eq!(hamming_distance(&[0; 32], &[0xff; 32]), 256);
        assert_eq!(hamming_distance(&with_bits(3), &with_bits(10)), 7);
    }

    #[test]
    fn test_knn_orders_nearest_first() {
        let query = set_of(&[with_bits(0)]);
        let train = set_of(&[with_bits(9), with_bits(2), with_bits(5)]);

        let matches = BruteForceMatcher.knn2(&query, &train);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].nearest.train_idx, 1);
        assert_eq!(matches[0].nearest.distance, 2.0);
        let second = matches[0].second.unwrap();
        assert_eq!(second.train_idx, 2);
        assert_eq!(second.distance, 5.0);
    }

    #[test]
    fn test_knn_single_train_descriptor_has_no_second() {
        let query = set_of(&[with_bits(1), with_bits(4)]);
        let train = set_of(&[with_bits(0)]);

        let matches = BruteForceMatcher.knn2(&query, &train);
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.second.is_none()));
        assert_eq!(matches[1].query_idx(), 1);
    }

    #[test]
    fn test_knn_ties_keep_lower_index() {
        let query = set_of(&[with_bits(0)]);
        let train = set_of(&[with_bits(3), with_bits(3)]);

        let m = BruteForceMatcher.knn2(&query, &train)[0];
        assert_eq!(m.nearest.train_idx, 0);
        assert_eq!(m.second.unwrap().train_idx, 1);
    }

    #[test]
    fn test_knn_empty_sets() {
        let empty = DescriptorSet::empty();
        let one = set_of(&[with_bits(1)]);
        assert!(BruteForceMatcher.knn2(&empty, &one).is_empty());
        assert!(BruteForceMatcher.knn2(&one, &empty).is_empty());
    }
}
