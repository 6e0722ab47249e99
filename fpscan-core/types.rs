use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ExtractError;
use crate::scorer::similarity;
use crate::{Descriptor, ImageBuffer, Keypoint};

/// Keypoints of one image paired positionally with their descriptors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorSet {
    keypoints: Vec<Keypoint>,
    descriptors: Vec<Descriptor>,
}

impl DescriptorSet {
    pub fn new(keypoints: Vec<Keypoint>, descriptors: Vec<Descriptor>) -> Result<Self, ExtractError> {
        if keypoints.len() != descriptors.len() {
            return Err(ExtractError::CountMismatch {
                keypoints: keypoints.len(),
                descriptors: descriptors.len(),
            });
        }
        Ok(Self {
            keypoints,
            descriptors,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, keypoint: Keypoint, descriptor: Descriptor) {
        self.keypoints.push(keypoint);
        self.descriptors.push(descriptor);
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Keypoint, &Descriptor)> {
        self.keypoints.iter().zip(self.descriptors.iter())
    }
}

/// One query descriptor paired with one train descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: f32,
}

/// Raw k=2 nearest-neighbour answer for one query descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnnMatch {
    pub nearest: Correspondence,
    pub second: Option<Correspondence>,
}

impl KnnMatch {
    pub fn query_idx(&self) -> usize {
        self.nearest.query_idx
    }
}

/// Correspondence that survived the ratio test
pub type AcceptedMatch = Correspondence;

/// Scored comparison of the sample against one candidate
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub candidate_id: String,
    pub path: PathBuf,
    pub candidate_image: ImageBuffer,
    pub sample: Arc<DescriptorSet>,
    pub candidate: DescriptorSet,
    pub accepted: Vec<AcceptedMatch>,
}

impl MatchResult {
    /// Percentage of keypoints with an accepted correspondence, normalized by
    /// the smaller keypoint count.
    pub fn score(&self) -> f64 {
        similarity(self.accepted.len(), self.sample.len(), self.candidate.len())
    }

    /// Line segments (sample point, candidate point) for every accepted match.
    /// Keypoints without an accepted correspondence are not included.
    pub fn match_segments(&self) -> Vec<((f32, f32), (f32, f32))> {
        let sample_kps = self.sample.keypoints();
        let candidate_kps = self.candidate.keypoints();
        self.accepted
            .iter()
            .filter_map(|m| {
                let a = sample_kps.get(m.query_idx)?;
                let b = candidate_kps.get(m.train_idx)?;
                Some((a.position(), b.position()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_with(points: &[(f32, f32)]) -> DescriptorSet {
        let mut set = DescriptorSet::empty();
        for (i, &(x, y)) in points.iter().enumerate() {
            set.push(Keypoint::new(x, y), [i as u8; 32]);
        }
        set
    }

    #[test]
    fn test_descriptor_set_count_mismatch() {
        let result = DescriptorSet::new(vec![Keypoint::new(0.0, 0.0)], Vec::new());
        assert!(matches!(
            result,
            Err(ExtractError::CountMismatch { keypoints: 1, descriptors: 0 })
        ));
    }

    #[test]
    fn test_match_segments_only_accepted() {
        let sample = Arc::new(set_with(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]));
        let candidate = set_with(&[(10.0, 10.0), (20.0, 20.0)]);
        let result = MatchResult {
            candidate_id: "c".into(),
            path: PathBuf::from("c.png"),
            candidate_image: ImageBuffer::filled(8, 8, 0),
            sample,
            candidate,
            accepted: vec![Correspondence {
                query_idx: 2,
                train_idx: 0,
                distance: 4.0,
            }],
        };

        let segments = result.match_segments();
        assert_eq!(segments, vec![((3.0, 3.0), (10.0, 10.0))]);
        assert!((result.score() - 50.0).abs() < 1e-9);
    }
}
