//! Steered BRIEF: 256 intensity comparisons around each keypoint, rotated by
//! the keypoint orientation and packed into a 32-byte binary descriptor.

use std::sync::OnceLock;

use fpscan_core::{Descriptor, ImageBuffer, Keypoint, DESCRIPTOR_BYTES};
use rayon::prelude::*;
use thiserror::Error;

/// One comparison per descriptor bit
pub const PAIR_COUNT: usize = DESCRIPTOR_BYTES * 8;

/// Sampling offsets stay within this many pixels of the keypoint
pub const PATCH_RADIUS: i32 = 12;

/// Offsets `(dx1, dy1, dx2, dy2)` of the two pixels compared for one bit
pub type SamplingPair = (i32, i32, i32, i32);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BriefError {
    #[error("Invalid image dimensions: {width}x{height} (must be > 0)")]
    InvalidImageSize { width: usize, height: usize },

    #[error("Image is {actual_width}x{actual_height}, generator expects {width}x{height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        actual_width: usize,
        actual_height: usize,
    },
}

pub type BriefResult<T> = Result<T, BriefError>;

/// Fixed pseudo-random comparison pattern shared by every generator.
///
/// Offsets follow a triangular distribution centred on the keypoint, so the
/// inner part of the patch is sampled more densely than the rim.
pub fn sampling_pattern() -> &'static [SamplingPair] {
    static PATTERN: OnceLock<Vec<SamplingPair>> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let mut state: u32 = 0x9E37_79B9;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        };
        let span = (2 * PATCH_RADIUS + 1) as u32;
        let mut offset = move || {
            let a = (next() % span) as i32;
            let b = (next() % span) as i32;
            (a + b) / 2 - PATCH_RADIUS
        };

        let mut pairs = Vec::with_capacity(PAIR_COUNT);
        while pairs.len() < PAIR_COUNT {
            let pair = (offset(), offset(), offset(), offset());
            if (pair.0, pair.1) != (pair.2, pair.3) {
                pairs.push(pair);
            }
        }
        pairs
    })
}

pub struct BriefGenerator {
    w: usize,
    h: usize,
}

impl BriefGenerator {
    pub fn new(width: usize, height: usize) -> BriefResult<Self> {
        if width == 0 || height == 0 {
            return Err(BriefError::InvalidImageSize { width, height });
        }
        Ok(Self { w: width, h: height })
    }

    /// One descriptor per keypoint, in keypoint order
    pub fn generate_descriptors(&self, img: &ImageBuffer, kps: &[Keypoint]) -> BriefResult<Vec<Descriptor>> {
        if img.dimensions() != (self.w, self.h) {
            return Err(BriefError::DimensionMismatch {
                width: self.w,
                height: self.h,
                actual_width: img.width(),
                actual_height: img.height(),
            });
        }

        let pattern = sampling_pattern();
        Ok(kps.par_iter().map(|kp| self.describe(img, kp, pattern)).collect())
    }

    fn describe(&self, img: &ImageBuffer, kp: &Keypoint, pattern: &[SamplingPair]) -> Descriptor {
        let (s, c) = kp.angle.sin_cos();
        let (cx, cy) = (kp.x, kp.y);
        let rotate = |dx: i32, dy: i32| {
            let (dx, dy) = (dx as f32, dy as f32);
            (cx + c * dx - s * dy, cy + s * dx + c * dy)
        };

        let mut d = [0u8; DESCRIPTOR_BYTES];
        for (i, &(dx1, dy1, dx2, dy2)) in pattern.iter().enumerate() {
            let (x1, y1) = rotate(dx1, dy1);
            let (x2, y2) = rotate(dx2, dy2);
            let bit = (self.bilinear_sample(img, x1, y1) < self.bilinear_sample(img, x2, y2)) as u8;
            d[i / 8] |= bit << (i % 8);
        }
        d
    }

    /// Bilinear interpolation; samples outside the interior snap to the nearest pixel
    fn bilinear_sample(&self, img: &ImageBuffer, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();

        if x0 < 0.0 || y0 < 0.0 || x0 + 1.0 >= self.w as f32 || y0 + 1.0 >= self.h as f32 {
            let cx = x.round().clamp(0.0, (self.w - 1) as f32) as usize;
            let cy = y.round().clamp(0.0, (self.h - 1) as f32) as usize;
            return img.get(cx, cy) as f32;
        }

        let dx = x - x0;
        let dy = y - y0;
        let (xi, yi) = (x0 as usize, y0 as usize);

        let p00 = img.get(xi, yi) as f32;
        let p10 = img.get(xi + 1, yi) as f32;
        let p01 = img.get(xi, yi + 1) as f32;
        let p11 = img.get(xi + 1, yi + 1) as f32;

        let top = p00 * (1.0 - dx) + p10 * dx;
        let bottom = p01 * (1.0 - dx) + p11 * dx;
        top * (1.0 - dy) + bottom * dy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn noise_image(width: usize, height: usize, seed: u32) -> ImageBuffer {
        let mut state = seed.max(1);
        let pixels = (0..width * height)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 24) as u8
            })
            .collect();
        ImageBuffer::from_raw(width, height, pixels).unwrap()
    }

    fn hamming(a: &Descriptor, b: &Descriptor) -> u32 {
        a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
    }

    #[test]
    fn test_pattern_shape() {
        let pattern = sampling_pattern();
        assert_eq!(pattern.len(), PAIR_COUNT);
        for &(x1, y1, x2, y2) in pattern {
            for v in [x1, y1, x2, y2] {
                assert!((-PATCH_RADIUS..=PATCH_RADIUS).contains(&v));
            }
            assert_ne!((x1, y1), (x2, y2));
        }
        assert!(std::ptr::eq(pattern, sampling_pattern()));
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            BriefGenerator::new(0, 10),
            Err(BriefError::InvalidImageSize { .. })
        ));
    }

    #[test]
    fn test_dimension_mismatch() {
        let generator = BriefGenerator::new(32, 32).unwrap();
        let img = ImageBuffer::filled(16, 32, 0);
        assert!(matches!(
            generator.generate_descriptors(&img, &[Keypoint::new(8.0, 8.0)]),
            Err(BriefError::DimensionMismatch { actual_width: 16, .. })
        ));
    }

    #[test]
    fn test_uniform_image_gives_zero_descriptor() {
        let generator = BriefGenerator::new(40, 40).unwrap();
        let img = ImageBuffer::filled(40, 40, 77);
        // Integer position with zero angle samples exact pixels, so no comparison is strict.
        let kps = [Keypoint::new(20.0, 20.0), Keypoint::new(2.0, 3.0)];
        let descriptors = generator.generate_descriptors(&img, &kps).unwrap();
        assert_eq!(descriptors, vec![[0u8; DESCRIPTOR_BYTES]; 2]);
    }

    #[test]
    fn test_all_bytes_are_used() {
        let generator = BriefGenerator::new(64, 64).unwrap();
        let img = noise_image(64, 64, 11);
        let descriptors = generator
            .generate_descriptors(&img, &[Keypoint::new(32.0, 32.0)])
            .unwrap();
        assert!(descriptors[0][4..].iter().any(|&b| b != 0));
    }

    #[test]
    fn test_distinct_patches_differ() {
        let generator = BriefGenerator::new(80, 80).unwrap();
        let img = noise_image(80, 80, 3);
        let kps = [Keypoint::new(20.0, 20.0), Keypoint::new(60.0, 60.0)];
        let descriptors = generator.generate_descriptors(&img, &kps).unwrap();
        assert!(hamming(&descriptors[0], &descriptors[1]) > 0);
    }

    #[test]
    fn test_empty_keypoints() {
        let generator = BriefGenerator::new(10, 10).unwrap();
        let img = ImageBuffer::filled(10, 10, 0);
        assert!(generator.generate_descriptors(&img, &[]).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn prop_deterministic_and_order_preserving(
            seed in 1u32..10_000,
            points in prop::collection::vec((0.0f32..48.0, 0.0f32..48.0, -3.2f32..3.2), 1..20),
        ) {
            let generator = BriefGenerator::new(48, 48).unwrap();
            let img = noise_image(48, 48, seed);
            let kps: Vec<Keypoint> = points
                .iter()
                .map(|&(x, y, angle)| Keypoint { angle, ..Keypoint::new(x, y) })
                .collect();

            let all = generator.generate_descriptors(&img, &kps).unwrap();
            prop_assert_eq!(all.len(), kps.len());
            for (kp, d) in kps.iter().zip(&all) {
                let single = generator.generate_descriptors(&img, std::slice::from_ref(kp)).unwrap();
                prop_assert_eq!(&single[0], d);
            }
        }
    }
}
