//! Detector configuration

use crate::DetectError;
use login_detect_ocr::OcrConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Score at or above which a page counts as a login page
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;

fn default_confidence_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

/// Configuration for a [`crate::LoginPageDetector`]
///
/// ```yaml
/// confidence_threshold: 0.6
/// ocr:
///   language: eng
///   page_segmentation_mode: 3
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Verdict threshold in [0, 1]
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    #[serde(default)]
    pub ocr: OcrConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            ocr: OcrConfig::default(),
        }
    }
}

impl DetectorConfig {
    /// Default configuration with a different verdict threshold
    #[must_use]
    pub fn with_threshold(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold,
            ..Self::default()
        }
    }

    /// Load configuration from a YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self, DetectError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Parse and validate YAML configuration
    pub fn from_yaml_str(contents: &str) -> Result<Self, DetectError> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DetectError> {
        validate_threshold(self.confidence_threshold)?;
        if self.ocr.language.trim().is_empty() {
            return Err(DetectError::InvalidConfig(
                "ocr.language must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_threshold(threshold: f64) -> Result<(), DetectError> {
    if threshold.is_finite() && (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(DetectError::InvalidConfig(format!(
            "confidence_threshold must be within [0, 1] (got {threshold})"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold() {
        let config = DetectorConfig::default();
        assert_eq!(config.confidence_threshold, 0.6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_with_defaults() {
        let config = DetectorConfig::from_yaml_str("confidence_threshold: 0.75\n").unwrap();
        assert_eq!(config.confidence_threshold, 0.75);
        assert_eq!(config.ocr.language, "eng");

        let empty = DetectorConfig::from_yaml_str("{}").unwrap();
        assert_eq!(empty, DetectorConfig::default());
    }

    #[test]
    fn test_yaml_nested_ocr() {
        let yaml = "ocr:\n  language: fra\n  data_path: /usr/share/tessdata\n";
        let config = DetectorConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.ocr.language, "fra");
        assert_eq!(config.ocr.data_path.as_deref(), Some("/usr/share/tessdata"));
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        for bad in [-0.1, 1.5, f64::NAN] {
            assert!(matches!(
                DetectorConfig::with_threshold(bad).validate(),
                Err(DetectError::InvalidConfig(_))
            ));
        }
        assert!(matches!(
            DetectorConfig::from_yaml_str("confidence_threshold: 2.0"),
            Err(DetectError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            DetectorConfig::from_yaml_str("confidence_threshold: [oops"),
            Err(DetectError::Yaml(_))
        ));
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detector.yaml");
        std::fs::write(&path, "confidence_threshold: 0.5\n").unwrap();
        assert_eq!(
            DetectorConfig::from_yaml(&path).unwrap().confidence_threshold,
            0.5
        );
        assert!(matches!(
            DetectorConfig::from_yaml(dir.path().join("missing.yaml")),
            Err(DetectError::Io(_))
        ));
    }
}
