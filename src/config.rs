//! Application configuration
//!
//! Layered: built-in defaults, optional TOML file, then CLI overrides
//! applied by the binary.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AppError, Result};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub motion: MotionConfig,
    pub edge: EdgeConfig,
    pub detector: DetectorConfig,
    pub source: SourceConfig,
    pub web: WebConfig,
}

/// Frame admission and pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum interval between two processed frames, in milliseconds.
    /// Frames arriving sooner are dropped before any conversion work.
    pub min_frame_interval_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_frame_interval_ms: 150,
        }
    }
}

/// Temporal blend tuning for the motion stabilizer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Per-pixel absolute luma difference above which a pixel counts as moving
    pub diff_threshold: u8,
    /// Moving-pixel ratio above which motion is considered high
    pub high_ratio: f32,
    /// Moving-pixel ratio above which motion is considered moderate
    pub moderate_ratio: f32,
    /// (current, previous) blend weights for high motion
    pub high_weights: (f32, f32),
    /// (current, previous) blend weights for moderate motion
    pub moderate_weights: (f32, f32),
    /// (current, previous) blend weights for a near-static scene
    pub low_weights: (f32, f32),
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            diff_threshold: 30,
            high_ratio: 0.05,
            moderate_ratio: 0.01,
            high_weights: (0.3, 0.7),
            moderate_weights: (0.6, 0.4),
            low_weights: (0.8, 0.2),
        }
    }
}

/// Edge detection tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub low_threshold: f32,
    pub high_threshold: f32,
    /// Gaussian blur kernel size, must be odd
    pub blur_kernel: usize,
    pub blur_sigma: f32,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            low_threshold: 50.0,
            high_threshold: 150.0,
            blur_kernel: 5,
            blur_sigma: 1.5,
        }
    }
}

/// Region detector wiring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Path to the detector asset. Missing or empty file disables detection.
    pub asset_path: Option<String>,
    /// Smallest region side the detector reports, in pixels
    pub min_size: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            asset_path: None,
            min_size: 80,
        }
    }
}

/// Synthetic capture source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub width: u32,
    pub height: u32,
    /// Sensor-to-display rotation in degrees, one of 0/90/180/270
    pub rotation: u32,
    /// Delivery rate of the source, frames per second
    pub fps: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            rotation: 0,
            fps: 30,
        }
    }
}

/// HTTP surface settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub bind_address: String,
    pub port: u16,
    pub jpeg_quality: u8,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            jpeg_quality: 85,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// any section the file omits.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load from a file if one is given, otherwise defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_pipeline_tuning() {
        let config = AppConfig::default();
        assert_eq!(config.pipeline.min_frame_interval_ms, 150);
        assert_eq!(config.motion.diff_threshold, 30);
        assert_eq!(config.edge.blur_kernel, 5);
        assert_eq!(config.web.port, 8080);
        assert_eq!(config.web.jpeg_quality, 85);
    }

    #[test]
    fn partial_file_keeps_defaults_elsewhere() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[web]\nport = 9090\n\n[edge]\nlow_threshold = 40.0").unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.web.port, 9090);
        assert_eq!(config.edge.low_threshold, 40.0);
        // untouched sections keep their defaults
        assert_eq!(config.pipeline.min_frame_interval_ms, 150);
        assert_eq!(config.motion.high_weights, (0.3, 0.7));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = AppConfig::load(Path::new("/nonexistent/framecast.toml"));
        assert!(err.is_err());
    }
}
