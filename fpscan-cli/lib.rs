//! High-level pieces behind the `fpscan` binary: the FAST + BRIEF extractor,
//! `image`-crate decoding, and a blocking helper that runs one scan session.

pub mod config;
pub mod overlay;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fpscan_brief::{BriefError, BriefGenerator};
use fpscan_core::{
    list_candidates, summarize, BruteForceMatcher, DescriptorSet, ExtractError, Extractor, FeatureConfig,
    ImageBuffer, ImageLoader, LoadError, MatchResult, Progress, ScanEngine, ScanError, ScanReport, ScanSession,
};
use fpscan_fast::{FastDetector, FastError};
use thiserror::Error;
use tracing::info;

pub use config::{AppConfig, OverlayConfig};
pub use fpscan_core;
pub use overlay::render_overlay;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("sample image: {0}")]
    Load(#[from] LoadError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type CliResult<T> = Result<T, CliError>;

fn fast_error(err: FastError) -> ExtractError {
    match err {
        FastError::ImageTooSmall {
            width,
            height,
            min_size,
        } => ExtractError::ImageTooSmall {
            width,
            height,
            min_size,
        },
        other => ExtractError::Detector(other.to_string()),
    }
}

fn brief_error(err: BriefError) -> ExtractError {
    ExtractError::Detector(err.to_string())
}

/// FAST keypoints described with steered BRIEF.
///
/// Detectors are sized per image, so one extractor serves samples and
/// candidates of any resolution.
#[derive(Debug, Clone, Default)]
pub struct OrbExtractor {
    cfg: FeatureConfig,
}

impl OrbExtractor {
    pub fn new(cfg: FeatureConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.cfg
    }
}

impl Extractor for OrbExtractor {
    fn extract(&self, image: &ImageBuffer) -> Result<DescriptorSet, ExtractError> {
        let (w, h) = image.dimensions();
        let detector = FastDetector::new(self.cfg.clone(), w, h).map_err(fast_error)?;
        let keypoints = detector.detect_keypoints(image).map_err(fast_error)?;
        let descriptors = BriefGenerator::new(w, h)
            .and_then(|brief| brief.generate_descriptors(image, &keypoints))
            .map_err(brief_error)?;
        DescriptorSet::new(keypoints, descriptors)
    }
}

/// Decodes any format the `image` crate recognizes and converts it to luma8
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFileLoader;

impl ImageLoader for ImageFileLoader {
    fn load(&self, path: &Path) -> Result<ImageBuffer, LoadError> {
        let io_err = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let decoded = image::ImageReader::open(path)
            .map_err(io_err)?
            .with_guessed_format()
            .map_err(io_err)?
            .decode()
            .map_err(|e| LoadError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
            .to_luma8();

        let (w, h) = decoded.dimensions();
        ImageBuffer::from_raw(w as usize, h as usize, decoded.into_raw()).ok_or_else(|| LoadError::Decode {
            path: path.to_path_buf(),
            reason: format!("empty image ({}x{})", w, h),
        })
    }
}

/// Engine wired with the concrete extractor, decoder and matcher
pub type FileScanEngine = ScanEngine<ImageFileLoader, OrbExtractor, BruteForceMatcher>;

pub fn build_engine(cfg: &AppConfig) -> FileScanEngine {
    ScanEngine::new(ImageFileLoader, OrbExtractor::new(cfg.features.clone()), BruteForceMatcher)
}

/// Everything a presenter needs after a scan
#[derive(Debug)]
pub struct ScanOutput {
    pub report: ScanReport,
    pub sample: Arc<ImageBuffer>,
    pub best: Option<MatchResult>,
}

/// Scan `dir` for the closest match to the image at `sample`, blocking until
/// the worker finishes. `on_progress` runs on the calling thread.
///
/// Updates pass through a channel of `scan.progress_capacity` entries that
/// drops the oldest entry when full. A slow `on_progress` may therefore see
/// fewer updates than there are candidates; `processed` still increases and
/// the final update is always delivered.
pub fn run_scan<F>(sample: &Path, dir: &Path, cfg: &AppConfig, mut on_progress: F) -> CliResult<ScanOutput>
where
    F: FnMut(&Progress),
{
    cfg.validate()?;

    let candidates = list_candidates(dir, &cfg.scan)?;
    let sample = Arc::new(ImageFileLoader.load(sample)?);
    info!(
        sample_width = sample.width(),
        sample_height = sample.height(),
        candidates = candidates.len(),
        "starting scan"
    );

    let session = ScanSession::new(cfg.scan.progress_capacity);
    let handle = session.start(Arc::new(build_engine(cfg)), Some(Arc::clone(&sample)), candidates)?;
    for progress in handle.progress().iter() {
        on_progress(&progress);
    }
    let state = handle.join()?;

    let report = summarize(&state, state.elapsed());
    Ok(ScanOutput {
        report,
        sample,
        best: state.into_best(),
    })
}
