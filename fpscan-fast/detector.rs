use fpscan_core::{FeatureConfig, ImageBuffer, Keypoint};
use rayon::prelude::*;
use tracing::trace;

use crate::error::{FastError, FastResult};
use crate::refinement::KeypointRefinement;
use crate::types::{CornerType, ScoredKeypoint};
use crate::utils::{circle_mask, has_consecutive_pixels};

/// FAST requires a 3-pixel border on each side
pub const MIN_IMAGE_SIZE: usize = 7;

/// Contiguous circle pixels needed to call a corner (FAST-9)
pub const ARC_LENGTH: usize = 9;

/// Radius-3 Bresenham circle, clockwise from the left
const OFF: [(i32, i32); 16] = [
    (-3, 0), (-3, 1), (-2, 2), (-1, 3),
    (0, 3), (1, 3), (2, 2), (3, 1),
    (3, 0), (3, -1), (2, -2), (1, -3),
    (0, -3), (-1, -3), (-2, -2), (-3, -1),
];

#[derive(Debug, Clone)]
pub struct FastDetector {
    cfg: FeatureConfig,
    w: usize,
    h: usize,
}

impl FastDetector {
    /// Creates a new FAST detector with validation
    pub fn new(cfg: FeatureConfig, width: usize, height: usize) -> FastResult<Self> {
        if width == 0 || height == 0 {
            return Err(FastError::InvalidImageSize { width, height });
        }

        if width < MIN_IMAGE_SIZE || height < MIN_IMAGE_SIZE {
            return Err(FastError::ImageTooSmall {
                width,
                height,
                min_size: MIN_IMAGE_SIZE,
            });
        }

        // 0 would detect everything, >127 overflows the u8 comparisons
        if cfg.threshold == 0 || cfg.threshold > 127 {
            return Err(FastError::InvalidThreshold(cfg.threshold));
        }

        let min_dim = width.min(height);
        if cfg.patch_size % 2 == 0 || cfg.patch_size >= min_dim {
            return Err(FastError::InvalidPatchSize {
                patch_size: cfg.patch_size,
                min_image_dim: min_dim,
            });
        }

        Ok(Self {
            cfg,
            w: width,
            h: height,
        })
    }

    fn validate_image(&self, img: &ImageBuffer) -> FastResult<()> {
        if img.dimensions() != (self.w, self.h) {
            return Err(FastError::InvalidImageData {
                expected_len: self.w * self.h,
                actual_len: img.pixels().len(),
            });
        }
        Ok(())
    }

    /// Suppressed, capped keypoints ordered by descending response
    pub fn detect_keypoints(&self, img: &ImageBuffer) -> FastResult<Vec<Keypoint>> {
        let raw = self.detect_keypoints_with_response(img)?;
        let raw_count = raw.len();
        let suppressed = KeypointRefinement::non_maximum_suppression(&raw, self.cfg.nms_distance);
        let kept = KeypointRefinement::retain_strongest(suppressed, self.cfg.max_keypoints);
        trace!(raw = raw_count, kept = kept.len(), "FAST detection");
        Ok(kept.into_iter().map(|sk| sk.keypoint).collect())
    }

    /// Every pixel passing the segment test, with its corner response
    pub fn detect_keypoints_with_response(&self, img: &ImageBuffer) -> FastResult<Vec<ScoredKeypoint>> {
        self.validate_image(img)?;

        let threshold = self.cfg.threshold;
        let keypoints = (3..self.h - 3)
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut row = Vec::new();
                for x in 3..self.w - 3 {
                    let p = img.get(x, y);
                    let ring: [u8; 16] =
                        OFF.map(|(dx, dy)| img.get((x as i32 + dx) as usize, (y as i32 + dy) as usize));

                    let bright = circle_mask(ring.iter().map(|&q| q >= p.saturating_add(threshold)));
                    let dark = circle_mask(ring.iter().map(|&q| q.saturating_add(threshold) <= p));

                    let corner = if has_consecutive_pixels(bright, ARC_LENGTH) {
                        CornerType::Bright
                    } else if has_consecutive_pixels(dark, ARC_LENGTH) {
                        CornerType::Dark
                    } else {
                        CornerType::None
                    };
                    if corner == CornerType::None {
                        continue;
                    }

                    let mask = if corner == CornerType::Bright { bright } else { dark };
                    let response = Self::response(p, &ring, mask);
                    let keypoint = Keypoint {
                        x: x as f32,
                        y: y as f32,
                        angle: self.compute_orientation(img, x, y),
                        size: self.cfg.patch_size as f32,
                        response,
                    };
                    row.push(ScoredKeypoint { keypoint, response });
                }
                row
            })
            .collect();

        Ok(keypoints)
    }

    /// Mean absolute difference between the centre and the circle pixels in `mask`
    fn response(p: u8, ring: &[u8; 16], mask: u16) -> f32 {
        let (sum, count) = ring
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .fold((0i32, 0i32), |(sum, count), (_, &q)| (sum + (q as i32 - p as i32).abs(), count + 1));
        if count == 0 {
            0.0
        } else {
            sum as f32 / count as f32
        }
    }

    /// Intensity-centroid orientation over the square patch, clamped at the borders
    fn compute_orientation(&self, img: &ImageBuffer, x: usize, y: usize) -> f32 {
        let half = (self.cfg.patch_size / 2) as i64;
        let (cx, cy) = (x as i64, y as i64);
        let mut m10 = 0i64;
        let mut m01 = 0i64;

        for dy in -half..=half {
            let yy = (cy + dy).clamp(0, self.h as i64 - 1) as usize;
            for dx in -half..=half {
                let xx = (cx + dx).clamp(0, self.w as i64 - 1) as usize;
                let val = img.get(xx, yy) as i64;
                m10 += dx * val;
                m01 += dy * val;
            }
        }

        if m10 == 0 && m01 == 0 {
            0.0
        } else {
            (m01 as f32).atan2(m10 as f32)
        }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.cfg
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.w, self.h)
    }
}
