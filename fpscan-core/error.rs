use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn an image into a descriptor set
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("image {width}x{height} too small for feature extraction (minimum {min_size}x{min_size})")]
    ImageTooSmall {
        width: usize,
        height: usize,
        min_size: usize,
    },

    #[error("descriptor count {descriptors} does not match keypoint count {keypoints}")]
    CountMismatch { keypoints: usize, descriptors: usize },

    #[error("detector error: {0}")]
    Detector(String),
}

/// Failure to decode one candidate file
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

/// Errors that stop a scan from starting or finishing
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("no sample image selected")]
    MissingSample,

    #[error("candidate directory {path} is not accessible: {source}")]
    CandidateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("a scan is already in flight")]
    AlreadyRunning,

    #[error("scan worker panicked")]
    WorkerPanicked,

    #[error("failed to spawn scan worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type ScanResult<T> = Result<T, ScanError>;
