//! Detection pipeline orchestration

use crate::config::{validate_threshold, DetectorConfig};
use crate::confidence::{ConfidenceAggregator, LoginScore, LoginScorer};
use crate::error::DetectError;
use crate::extractor::FieldCandidateExtractor;
use image::RgbImage;
use login_detect_common::{load_image, DetectionResult, FormField};
use login_detect_ocr::{default_engine, DefaultOcrEngine, OcrEngine};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Verdict for one page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoginAssessment {
    pub is_login_page: bool,
    pub score: LoginScore,
}

/// Analyzes screenshots for login forms.
///
/// Each detector owns its OCR engine. Analyses through one instance are
/// sequential; run several instances for parallel work.
pub struct LoginPageDetector<O: OcrEngine = DefaultOcrEngine> {
    config: DetectorConfig,
    extractor: FieldCandidateExtractor,
    scorer: ConfidenceAggregator,
    ocr: O,
}

impl LoginPageDetector<DefaultOcrEngine> {
    /// Detector backed by the default OCR engine
    pub fn new(config: DetectorConfig) -> Result<Self, DetectError> {
        let ocr = default_engine(&config.ocr);
        Self::with_engine(config, ocr)
    }
}

impl<O: OcrEngine> LoginPageDetector<O> {
    /// Detector backed by a caller-supplied OCR engine.
    ///
    /// The engine is initialized here; a failure is not fatal and is retried
    /// at the start of every analysis.
    pub fn with_engine(config: DetectorConfig, mut ocr: O) -> Result<Self, DetectError> {
        config.validate()?;
        if let Err(e) = ocr.initialize() {
            warn!("OCR engine failed to initialize: {}", e);
        }
        Ok(Self {
            config,
            extractor: FieldCandidateExtractor::new(),
            scorer: ConfidenceAggregator::new(),
            ocr,
        })
    }

    #[must_use]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn set_confidence_threshold(&mut self, threshold: f64) -> Result<(), DetectError> {
        validate_threshold(threshold)?;
        self.config.confidence_threshold = threshold;
        Ok(())
    }

    #[must_use]
    pub fn ocr(&self) -> &O {
        &self.ocr
    }

    pub fn ocr_mut(&mut self) -> &mut O {
        &mut self.ocr
    }

    /// Load and analyze an image file. Never fails: problems are reported in
    /// [`DetectionResult::errors`] with a negative verdict.
    pub fn analyze_path(&mut self, path: impl AsRef<Path>) -> DetectionResult {
        let start = Instant::now();
        let path = path.as_ref();

        let outcome = load_image(path)
            .map_err(|source| DetectError::ImageRead {
                path: path.display().to_string(),
                source,
            })
            .and_then(|image| self.try_analyze(&image));

        self.finish(outcome, start, &path.display().to_string())
    }

    /// Analyze an already decoded image
    pub fn analyze_image(&mut self, image: &RgbImage) -> DetectionResult {
        let start = Instant::now();
        let outcome = self.try_analyze(image);
        self.finish(outcome, start, "<memory>")
    }

    /// Run the pipeline, surfacing failures as [`DetectError`]
    pub fn try_analyze(&mut self, image: &RgbImage) -> Result<DetectionResult, DetectError> {
        self.ocr.ensure_initialized()?;

        let fields = self.detect_form_fields(image);
        let assessment = self.is_login_page(image, &fields)?;

        Ok(DetectionResult {
            is_login_page: assessment.is_login_page,
            confidence: assessment.score.confidence,
            fields,
            errors: Vec::new(),
            execution_time_ms: 0.0,
            factors: assessment.score.factors,
        })
    }

    /// Candidate extraction and classification only
    pub fn detect_form_fields(&mut self, image: &RgbImage) -> Vec<FormField> {
        self.extractor.detect(image, &mut self.ocr)
    }

    /// Score the page given the fields already found on it
    pub fn is_login_page(
        &mut self,
        image: &RgbImage,
        fields: &[FormField],
    ) -> Result<LoginAssessment, DetectError> {
        let page_text = self.ocr.extract_text(image)?;
        let score = self.scorer.score(fields, &page_text);
        Ok(LoginAssessment {
            is_login_page: score.confidence >= self.config.confidence_threshold,
            score,
        })
    }

    fn finish(
        &self,
        outcome: Result<DetectionResult, DetectError>,
        start: Instant,
        source: &str,
    ) -> DetectionResult {
        let mut result = outcome.unwrap_or_else(|e| {
            warn!("Analysis of {} failed: {}", source, e);
            DetectionResult::failed(format!("Error: {e}"))
        });
        result.execution_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        info!(
            "{}: login_page={} confidence={:.2} fields={} ({:.1} ms)",
            source,
            result.is_login_page,
            result.confidence,
            result.fields.len(),
            result.execution_time_ms
        );
        result
    }
}

impl<O: OcrEngine> Drop for LoginPageDetector<O> {
    fn drop(&mut self) {
        self.ocr.release();
    }
}
