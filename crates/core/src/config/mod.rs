use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{FretCoachError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detector: DetectorConfig,
    pub scoring: ScoringConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing fields fall back to their
    /// defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.detector.contrast_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(FretCoachError::msg(format!(
                "contrast threshold must be a non-negative number, got {threshold}"
            )));
        }

        let ScoringConfig {
            accuracy_weight,
            timing_weight,
        } = self.scoring;
        if accuracy_weight < 0.0 || timing_weight < 0.0 {
            return Err(FretCoachError::msg("scoring weights must not be negative"));
        }
        if ((accuracy_weight + timing_weight) - 1.0).abs() > 1e-6 {
            return Err(FretCoachError::msg(format!(
                "scoring weights must sum to 1, got {}",
                accuracy_weight + timing_weight
            )));
        }

        Ok(())
    }
}

/// Configuration for the frame-based marker detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum grid contrast (exclusive) on the 0-255 brightness scale.
    pub contrast_threshold: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            contrast_threshold: 100.0,
        }
    }
}

/// Weights used to blend accuracy and timing into overall progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub accuracy_weight: f64,
    pub timing_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            accuracy_weight: 0.6,
            timing_weight: 0.4,
        }
    }
}

/// How marker visibility interacts with playback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub require_marker_to_start: bool,
    pub pause_on_marker_loss: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            require_marker_to_start: false,
            pause_on_marker_loss: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = AppConfig::from_json(r#"{ "detector": { "contrast_threshold": 80.0 } }"#)
            .expect("partial config should load");

        assert_eq!(config.detector.contrast_threshold, 80.0);
        assert_eq!(config.scoring, ScoringConfig::default());
        assert!(config.session.pause_on_marker_loss);
    }

    #[test]
    fn rejects_weights_that_do_not_sum_to_one() {
        let err = AppConfig::from_json(
            r#"{ "scoring": { "accuracy_weight": 0.5, "timing_weight": 0.2 } }"#,
        )
        .unwrap_err();
        assert!(format!("{err}").contains("sum to 1"));
    }

    #[test]
    fn rejects_negative_threshold() {
        let mut config = AppConfig::default();
        config.detector.contrast_threshold = -1.0;
        assert!(config.validate().is_err());
    }
}
