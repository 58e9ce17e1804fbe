//! Login form detection for screenshot images
//!
//! Given a screenshot, decide whether it shows a login/authentication form
//! and report the input fields found on it.
//!
//! # Pipeline
//!
//! 1. **Candidate extraction** ([`extractor`]): adaptive threshold, outer
//!    contours, near-rectangular polygons, size filters
//! 2. **Classification** ([`keywords`], [`shape`]): OCR label text plus
//!    geometry decide whether a candidate is an input field and of which type
//! 3. **Password dots** ([`password`]): dot-like blobs inside password fields
//! 4. **Scoring** ([`confidence`]): capped, weighted signals summed into a
//!    confidence in `[0, 1]`
//!
//! [`LoginPageDetector`] wires these together and owns the OCR engine.
//!
//! # Example
//! ```no_run
//! use login_detect::{DetectorConfig, LoginPageDetector};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut detector = LoginPageDetector::new(DetectorConfig::default())?;
//! let result = detector.analyze_path("screenshot.png");
//!
//! println!("login page: {} ({:.2})", result.is_login_page, result.confidence);
//! for field in &result.fields {
//!     println!("  {} at {}: {}", field.field_type, field.region, field.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod confidence;
pub mod config;
pub mod error;
pub mod extractor;
pub mod keywords;
pub mod password;
pub mod pipeline;
pub mod shape;

pub use confidence::{ConfidenceAggregator, LoginScore, LoginScorer};
pub use config::{DetectorConfig, DEFAULT_CONFIDENCE_THRESHOLD};
pub use error::DetectError;
pub use extractor::FieldCandidateExtractor;
pub use keywords::{FieldClassifier, KeywordClassifier};
pub use password::{DotCounter, PasswordDotCounter};
pub use pipeline::{LoginAssessment, LoginPageDetector};
pub use shape::{NeighborhoodProbe, ShapeAssessment};

pub use login_detect_common::{
    ConfidenceFactors, DetectionResult, FieldType, FormField, Region,
};
pub use login_detect_ocr::{OcrConfig, OcrEngine, OcrError};
