use crate::types::ScoredKeypoint;

/// Post-processing of raw FAST responses
pub struct KeypointRefinement;

impl KeypointRefinement {
    /// Greedy non-maximum suppression: strongest first, dropping anything
    /// closer than `min_distance` to an already kept keypoint.
    pub fn non_maximum_suppression(keypoints: &[ScoredKeypoint], min_distance: f32) -> Vec<ScoredKeypoint> {
        if keypoints.is_empty() {
            return Vec::new();
        }

        let mut sorted = keypoints.to_vec();
        Self::sort_by_response(&mut sorted);

        let min_distance_sq = min_distance * min_distance;
        let mut kept: Vec<ScoredKeypoint> = Vec::new();
        for candidate in sorted {
            let isolated = kept.iter().all(|k| {
                let dx = candidate.keypoint.x - k.keypoint.x;
                let dy = candidate.keypoint.y - k.keypoint.y;
                dx * dx + dy * dy >= min_distance_sq
            });
            if isolated {
                kept.push(candidate);
            }
        }
        kept
    }

    /// Keep the `max` strongest keypoints; 0 keeps everything
    pub fn retain_strongest(mut keypoints: Vec<ScoredKeypoint>, max: usize) -> Vec<ScoredKeypoint> {
        if max == 0 || keypoints.len() <= max {
            return keypoints;
        }
        Self::sort_by_response(&mut keypoints);
        keypoints.truncate(max);
        keypoints
    }

    // Descending response; equal responses fall back to raster order so
    // results do not depend on rayon's collection order.
    fn sort_by_response(keypoints: &mut [ScoredKeypoint]) {
        keypoints.sort_by(|a, b| {
            b.response
                .total_cmp(&a.response)
                .then(a.keypoint.y.total_cmp(&b.keypoint.y))
                .then(a.keypoint.x.total_cmp(&b.keypoint.x))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpscan_core::Keypoint;

    fn scored(x: f32, y: f32, response: f32) -> ScoredKeypoint {
        ScoredKeypoint {
            keypoint: Keypoint::new(x, y),
            response,
        }
    }

    #[test]
    fn test_nms_keeps_strongest_of_cluster() {
        let kps = vec![scored(10.0, 10.0, 5.0), scored(11.0, 10.0, 9.0), scored(30.0, 30.0, 1.0)];
        let kept = KeypointRefinement::non_maximum_suppression(&kps, 3.0);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].keypoint.x, 11.0);
        assert_eq!(kept[1].keypoint.x, 30.0);
    }

    #[test]
    fn test_nms_minimum_distance_holds() {
        let kps: Vec<ScoredKeypoint> = (0..50)
            .map(|i| scored((i % 10) as f32 * 1.5, (i / 10) as f32 * 1.5, (i * 7 % 13) as f32))
            .collect();
        let kept = KeypointRefinement::non_maximum_suppression(&kps, 4.0);
        for (i, a) in kept.iter().enumerate() {
            for b in &kept[i + 1..] {
                let dx = a.keypoint.x - b.keypoint.x;
                let dy = a.keypoint.y - b.keypoint.y;
                assert!((dx * dx + dy * dy).sqrt() >= 4.0);
            }
        }
    }

    #[test]
    fn test_retain_strongest() {
        let kps = vec![scored(0.0, 0.0, 1.0), scored(5.0, 0.0, 3.0), scored(9.0, 0.0, 2.0)];
        let kept = KeypointRefinement::retain_strongest(kps.clone(), 2);
        let responses: Vec<f32> = kept.iter().map(|k| k.response).collect();
        assert_eq!(responses, vec![3.0, 2.0]);
        assert_eq!(KeypointRefinement::retain_strongest(kps, 0).len(), 3);
    }
}
