//! Core of the fingerprint scanner: data model, capability traits, the
//! ratio-test scorer and the batch scan engine.
//!
//! Feature extraction and image decoding live in the sibling crates; this
//! crate only sees them through the [`Extractor`] and [`ImageLoader`] traits,
//! so every piece of the scan logic can be driven with synthetic inputs.

pub mod candidates;
pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod report;
pub mod scorer;
pub mod session;
pub mod traits;
pub mod types;

pub use candidates::{has_supported_extension, list_candidates};
pub use config::ScanConfig;
pub use engine::{eta_seconds, CancelToken, NoProgress, Progress, ProgressSink, ScanEngine, ScanOutcome, ScanState};
pub use error::{ExtractError, LoadError, ScanError, ScanResult};
pub use matcher::{hamming_distance, BruteForceMatcher};
pub use report::{summarize, ReportRecord, ScanReport};
pub use scorer::{ratio_test, score, similarity, Scored, RATIO_THRESHOLD};
pub use session::{ScanHandle, ScanSession};
pub use traits::{Extractor, ImageLoader, NearestNeighborMatcher};
pub use types::{AcceptedMatch, Correspondence, DescriptorSet, KnnMatch, MatchResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row-major 8-bit grayscale image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl ImageBuffer {
    /// Wrap raw luma pixels; `None` if the length does not match `width * height`.
    pub fn from_raw(width: usize, height: usize, pixels: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || pixels.len() != width * height {
            return None;
        }
        Some(Self { width, height, pixels })
    }

    /// Uniformly filled image
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![value; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }
}

/// Key-point ≙ detected corner + orientation (radians)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    /// Diameter of the patch the orientation was measured over
    pub size: f32,
    pub response: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            angle: 0.0,
            size: 0.0,
            response: 0.0,
        }
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

/// Bytes in one binary descriptor
pub const DESCRIPTOR_BYTES: usize = 32;

/// 256-bit binary descriptor = 32 bytes
pub type Descriptor = [u8; DESCRIPTOR_BYTES];

/// Keypoint detection and description settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FeatureConfig {
    pub threshold: u8,
    pub patch_size: usize,
    pub n_threads: usize,
    /// Minimum distance between keypoints surviving non-maximum suppression
    pub nms_distance: f32,
    /// Strongest responses kept per image; 0 keeps all
    pub max_keypoints: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            threshold: 20,
            patch_size: 15,
            n_threads: num_cpus::get().max(1),
            nms_distance: 3.0,
            max_keypoints: 500,
        }
    }
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}
