//! OCR collaborator for login form detection
//!
//! The detector only needs two capabilities from an OCR engine: the full text
//! of a page (lowercased) and the cleaned-up text of one rectangular region.
//! Both are provided by [`OcrEngine`], whose default methods take care of
//! lazy initialization, region clamping and text cleanup so implementations
//! only supply raw recognition on a preprocessed buffer.
//!
//! # Features
//! - `tesseract`: Tesseract 5.x backend via `leptess` (requires the native
//!   libraries and English language data at build/run time)
//!
//! # Example
//! ```no_run
//! use login_detect_ocr::{default_engine, OcrConfig, OcrEngine};
//! use image::RgbImage;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = default_engine(&OcrConfig::default());
//! engine.initialize()?;
//!
//! let img = RgbImage::new(640, 480);
//! let text = engine.extract_text(&img)?;
//! println!("page text: {text}");
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "tesseract")]
pub mod tesseract;

use image::{GrayImage, RgbImage};
use login_detect_common::imaging::{self, Polarity, ADAPTIVE_BLOCK_SIZE};
use login_detect_common::Region;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

#[cfg(feature = "tesseract")]
pub use tesseract::TesseractOcr;

/// Offset applied when binarizing a whole page before recognition
const PAGE_THRESHOLD_OFFSET: f32 = 2.0;

/// Fixed level used to binarize a single field crop
const REGION_THRESHOLD_LEVEL: u8 = 127;

/// Configuration for the OCR engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract language code
    #[serde(default = "default_language")]
    pub language: String,
    /// Directory holding `*.traineddata`; `None` uses the engine default
    #[serde(default)]
    pub data_path: Option<String>,
    /// Page segmentation mode (see Tesseract PSM)
    #[serde(default = "default_page_segmentation_mode")]
    pub page_segmentation_mode: u32,
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_page_segmentation_mode() -> u32 {
    3 // PSM_AUTO
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            data_path: None,
            page_segmentation_mode: default_page_segmentation_mode(),
        }
    }
}

/// Errors that can occur during OCR processing
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Failed to initialize OCR engine: {0}")]
    InitError(String),

    #[error("OCR engine is not initialized")]
    NotInitialized,

    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to run OCR: {0}")]
    RecognitionError(String),
}

/// Text recognition capability consumed by the detector.
///
/// An engine holds native state and is not meant to be shared between
/// concurrent analyses; every method takes `&mut self`.
pub trait OcrEngine {
    /// Bring the engine up. Calling it on an initialized engine is a no-op.
    fn initialize(&mut self) -> Result<(), OcrError>;

    fn is_initialized(&self) -> bool;

    /// Tear down native resources. The engine may be initialized again later.
    fn release(&mut self);

    /// Recognize text in an already binarized buffer
    fn recognize(&mut self, binary: &GrayImage) -> Result<String, OcrError>;

    /// Initialize on first use
    fn ensure_initialized(&mut self) -> Result<(), OcrError> {
        if self.is_initialized() {
            Ok(())
        } else {
            self.initialize()
        }
    }

    /// Text of the whole image, lowercased
    fn extract_text(&mut self, image: &RgbImage) -> Result<String, OcrError> {
        self.ensure_initialized()?;
        let prepared = prepare_page(image);
        Ok(self.recognize(&prepared)?.to_lowercase())
    }

    /// Text of one region with line breaks removed and surrounding blanks
    /// trimmed. A region that is empty after clamping yields `""`.
    fn extract_text_from_region(
        &mut self,
        image: &RgbImage,
        region: Region,
    ) -> Result<String, OcrError> {
        self.ensure_initialized()?;
        let Some(prepared) = prepare_region(image, region) else {
            trace!(
                "Region {} lies outside the {}x{} image",
                region,
                image.width(),
                image.height()
            );
            return Ok(String::new());
        };
        Ok(clean_region_text(&self.recognize(&prepared)?))
    }
}

/// Binarize a full page with a local threshold (dark text stays dark)
#[must_use]
pub fn prepare_page(image: &RgbImage) -> GrayImage {
    let gray = imaging::to_gray(image);
    imaging::adaptive_threshold(
        &gray,
        ADAPTIVE_BLOCK_SIZE,
        PAGE_THRESHOLD_OFFSET,
        Polarity::Binary,
    )
}

/// Crop and binarize one region; `None` when the clamped region is empty
#[must_use]
pub fn prepare_region(image: &RgbImage, region: Region) -> Option<GrayImage> {
    let crop = imaging::crop(image, region)?;
    let gray = imaging::to_gray(&crop);
    Some(imaging::fixed_threshold(
        &gray,
        REGION_THRESHOLD_LEVEL,
        Polarity::Inverted,
    ))
}

/// Drop line breaks and trim spaces/tabs at both ends
#[must_use]
pub fn clean_region_text(raw: &str) -> String {
    let joined: String = raw.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    joined.trim_matches(|c| c == ' ' || c == '\t').to_string()
}

/// Engine used when the crate is built without an OCR backend.
///
/// Initialization always fails, which the detector reports as an engine
/// fault for each analysis.
#[derive(Debug, Default)]
pub struct UnavailableOcr;

impl OcrEngine for UnavailableOcr {
    fn initialize(&mut self) -> Result<(), OcrError> {
        Err(OcrError::Unavailable(
            "built without the `tesseract` feature".to_string(),
        ))
    }

    fn is_initialized(&self) -> bool {
        false
    }

    fn release(&mut self) {}

    fn recognize(&mut self, _binary: &GrayImage) -> Result<String, OcrError> {
        Err(OcrError::NotInitialized)
    }
}

/// The engine selected by the enabled backend feature
#[cfg(feature = "tesseract")]
pub type DefaultOcrEngine = TesseractOcr;

/// The engine selected by the enabled backend feature
#[cfg(not(feature = "tesseract"))]
pub type DefaultOcrEngine = UnavailableOcr;

/// Construct the default engine (not yet initialized)
#[cfg(feature = "tesseract")]
#[must_use]
pub fn default_engine(config: &OcrConfig) -> DefaultOcrEngine {
    TesseractOcr::new(config.clone())
}

/// Construct the default engine (not yet initialized)
#[cfg(not(feature = "tesseract"))]
#[must_use]
pub fn default_engine(_config: &OcrConfig) -> DefaultOcrEngine {
    UnavailableOcr
}
