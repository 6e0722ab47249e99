use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::ScanConfig;
use crate::error::{ScanError, ScanResult};

/// Case-insensitive extension check against the allow-list
pub fn has_supported_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Supported image files directly inside `dir`, sorted by file name and
/// capped to `config.max_candidates`.
pub fn list_candidates(dir: &Path, config: &ScanConfig) -> ScanResult<Vec<PathBuf>> {
    let directory_error = |source| ScanError::CandidateDirectory {
        path: dir.to_path_buf(),
        source,
    };

    let entries = std::fs::read_dir(dir).map_err(directory_error)?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(directory_error)?;
        let path = entry.path();
        if path.is_file() && has_supported_extension(&path, &config.extensions) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    let found = files.len();
    files.truncate(config.max_candidates);
    debug!(dir = %dir.display(), found, kept = files.len(), "listed candidates");

    Ok(files)
}
