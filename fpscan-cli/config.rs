use std::path::Path;

use fpscan_core::{FeatureConfig, ScanConfig};
use serde::{Deserialize, Serialize};

use crate::{CliError, CliResult};

/// Appearance of the match overlay image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Integer upscale applied to the finished canvas
    pub scale: u32,
    pub line_color: [u8; 3],
    pub point_color: [u8; 3],
    pub point_radius: i32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            scale: 2,
            line_color: [0, 255, 0],
            point_color: [255, 0, 0],
            point_radius: 3,
        }
    }
}

/// Everything the `fpscan` binary can read from a config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scan: ScanConfig,
    pub features: FeatureConfig,
    pub overlay: OverlayConfig,
}

impl AppConfig {
    pub fn validate(&self) -> CliResult<()> {
        self.scan.validate()?;

        let f = &self.features;
        if f.threshold == 0 || f.threshold > 127 {
            return Err(CliError::Config(format!(
                "features.threshold must be 1-127, got {}",
                f.threshold
            )));
        }
        if f.patch_size % 2 == 0 {
            return Err(CliError::Config(format!(
                "features.patch_size must be odd, got {}",
                f.patch_size
            )));
        }
        if f.nms_distance.is_nan() || f.nms_distance < 0.0 {
            return Err(CliError::Config("features.nms_distance must be non-negative".to_string()));
        }
        if f.n_threads == 0 {
            return Err(CliError::Config("features.n_threads must be at least 1".to_string()));
        }

        if self.overlay.scale == 0 {
            return Err(CliError::Config("overlay.scale must be at least 1".to_string()));
        }
        if self.overlay.point_radius < 0 {
            return Err(CliError::Config("overlay.point_radius must be non-negative".to_string()));
        }
        Ok(())
    }

    pub fn summary(&self) -> String {
        format!(
            "{}; features: threshold={}, patch_size={}, nms_distance={}, max_keypoints={}, threads={}; overlay scale={}",
            self.scan.summary(),
            self.features.threshold,
            self.features.patch_size,
            self.features.nms_distance,
            self.features.max_keypoints,
            self.features.n_threads,
            self.overlay.scale
        )
    }

    /// Load by extension: `.json` is read as JSON, anything else as TOML
    pub fn load<P: AsRef<Path>>(path: P) -> CliResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::load_json(path),
            _ => Self::load_toml(path),
        }
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> CliResult<()> {
        write_file(path.as_ref(), &self.to_json()?)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> CliResult<Self> {
        Self::from_json(&read_file(path.as_ref())?)
    }

    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> CliResult<()> {
        write_file(path.as_ref(), &self.to_toml()?)
    }

    pub fn load_toml<P: AsRef<Path>>(path: P) -> CliResult<Self> {
        Self::from_toml(&read_file(path.as_ref())?)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> CliResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn from_toml(toml_str: &str) -> CliResult<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

fn read_file(path: &Path) -> CliResult<String> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, content: &str) -> CliResult<()> {
    std::fs::write(path, content).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}
