//! FAST corner detection with intensity-centroid orientation.
//!
//! Produces the keypoints that `fpscan-brief` turns into descriptors.

mod detector;
mod error;
mod refinement;
mod types;
mod utils;

pub use detector::{FastDetector, ARC_LENGTH, MIN_IMAGE_SIZE};
pub use error::{FastError, FastResult};
pub use refinement::KeypointRefinement;
pub use types::ScoredKeypoint;
pub use utils::has_consecutive_pixels;
