#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ScanError, ScanResult};

/// Candidate selection and progress hand-off settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScanConfig {
    /// Upper bound on candidates taken from the sorted directory listing
    pub max_candidates: usize,
    /// Case-insensitive extension allow-list, without the dot
    pub extensions: Vec<String>,
    /// Progress updates buffered between the worker and the presenter
    pub progress_capacity: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_candidates: 1000,
            extensions: vec!["bmp".to_string(), "jpg".to_string(), "png".to_string()],
            progress_capacity: 64,
        }
    }
}

impl ScanConfig {
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    pub fn validate(&self) -> ScanResult<()> {
        if self.max_candidates == 0 {
            return Err(ScanError::Config("max_candidates must be at least 1".to_string()));
        }
        if self.extensions.is_empty() {
            return Err(ScanError::Config("extension allow-list is empty".to_string()));
        }
        if self.progress_capacity == 0 {
            return Err(ScanError::Config("progress_capacity must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn summary(&self) -> String {
        format!(
            "ScanConfig: max_candidates={}, extensions=[{}], progress_capacity={}",
            self.max_candidates,
            self.extensions.join(","),
            self.progress_capacity
        )
    }
}
