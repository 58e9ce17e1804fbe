//! Error types for the detection pipeline

use login_detect_common::ImageError;
use login_detect_ocr::OcrError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Unable to read image from {path}")]
    ImageRead {
        path: String,
        #[source]
        source: ImageError,
    },

    #[error("OCR engine fault: {0}")]
    Ocr(#[from] OcrError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
