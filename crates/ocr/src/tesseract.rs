//! Tesseract 5.x backend
//!
//! One `LepTess` handle is kept alive between calls so that language data is
//! loaded once per engine, not once per region.

use crate::{OcrConfig, OcrEngine, OcrError};
use image::{GrayImage, ImageFormat};
use leptess::{LepTess, Variable};
use std::io::Cursor;
use tracing::debug;

/// OCR engine backed by a persistent Tesseract handle
pub struct TesseractOcr {
    config: OcrConfig,
    api: Option<LepTess>,
}

impl TesseractOcr {
    /// Create an engine; Tesseract itself is started on `initialize`
    #[must_use]
    pub fn new(config: OcrConfig) -> Self {
        Self { config, api: None }
    }

    #[must_use]
    pub fn config(&self) -> &OcrConfig {
        &self.config
    }
}

impl OcrEngine for TesseractOcr {
    fn initialize(&mut self) -> Result<(), OcrError> {
        if self.api.is_some() {
            return Ok(());
        }

        let mut lt = LepTess::new(self.config.data_path.as_deref(), &self.config.language)
            .map_err(|e| {
                OcrError::InitError(format!(
                    "Failed to initialize Tesseract with language '{}': {}. \
                     Make sure language data is installed",
                    self.config.language, e
                ))
            })?;

        lt.set_variable(
            Variable::TesseditPagesegMode,
            &self.config.page_segmentation_mode.to_string(),
        )
        .map_err(|e| OcrError::InitError(format!("Failed to set PSM: {}", e)))?;

        debug!(
            "Tesseract initialized (language '{}', psm {})",
            self.config.language, self.config.page_segmentation_mode
        );
        self.api = Some(lt);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.api.is_some()
    }

    fn release(&mut self) {
        if self.api.take().is_some() {
            debug!("Tesseract released");
        }
    }

    fn recognize(&mut self, binary: &GrayImage) -> Result<String, OcrError> {
        let lt = self.api.as_mut().ok_or(OcrError::NotInitialized)?;

        // leptess expects encoded image data
        let mut png_buf = Cursor::new(Vec::new());
        binary.write_to(&mut png_buf, ImageFormat::Png).map_err(|e| {
            OcrError::RecognitionError(format!("Failed to encode image to PNG: {}", e))
        })?;

        lt.set_image_from_mem(png_buf.get_ref()).map_err(|e| {
            OcrError::RecognitionError(format!("Failed to set image from memory: {}", e))
        })?;

        lt.get_utf8_text()
            .map_err(|e| OcrError::RecognitionError(format!("Invalid UTF-8 from Tesseract: {}", e)))
    }
}

impl Drop for TesseractOcr {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use login_detect_common::Region;

    #[test]
    fn test_initialize_and_release() {
        let mut engine = TesseractOcr::new(OcrConfig::default());
        assert!(!engine.is_initialized());
        engine
            .initialize()
            .expect("Tesseract with English data must be installed for this test");
        assert!(engine.is_initialized());
        engine.release();
        assert!(!engine.is_initialized());
    }

    #[test]
    fn test_invalid_language_fails() {
        let mut engine = TesseractOcr::new(OcrConfig {
            language: "invalid_lang_xyz".to_string(),
            ..OcrConfig::default()
        });
        assert!(matches!(engine.initialize(), Err(OcrError::InitError(_))));
    }

    #[test]
    fn test_blank_page_has_no_text() {
        let mut engine = TesseractOcr::new(OcrConfig::default());
        let img = RgbImage::from_pixel(200, 100, Rgb([255, 255, 255]));
        let text = engine.extract_text(&img).expect("OCR failed");
        assert!(text.trim().is_empty(), "unexpected text: {text:?}");

        let region_text = engine
            .extract_text_from_region(&img, Region::new(10, 10, 50, 20))
            .unwrap();
        assert!(region_text.is_empty());
    }
}
