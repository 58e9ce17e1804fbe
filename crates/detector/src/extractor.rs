//! Input-field candidate extraction
//!
//! Finds rectangular outlines in a screenshot, reads the text around each of
//! them and keeps the ones the classifier accepts as input fields.

use crate::keywords::{FieldClassifier, KeywordClassifier};
use crate::password::{DotCounter, PasswordDotCounter};
use image::RgbImage;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use login_detect_common::imaging::{self, Polarity, ADAPTIVE_BLOCK_SIZE};
use login_detect_common::{FieldType, FormField, Region};
use login_detect_ocr::{OcrEngine, OcrError};
use tracing::{debug, warn};

/// Pre-threshold blur kernel
const BLUR_KERNEL_SIZE: u32 = 5;

/// Local threshold offset for outline segmentation
const THRESHOLD_OFFSET: f32 = 4.0;

/// Polygon tolerance as a fraction of the contour perimeter
const POLYGON_EPSILON: f64 = 0.02;

const MIN_VERTICES: usize = 4;
const MAX_VERTICES: usize = 8;

const MIN_WIDTH: i32 = 50;
const MIN_HEIGHT: i32 = 10;
const MAX_WIDTH_FRACTION: f64 = 0.9;
const MAX_HEIGHT_FRACTION: f64 = 0.2;

/// Label search margins around a candidate
const LABEL_MARGIN_X: i32 = 50;
const LABEL_MARGIN_Y: i32 = 30;
const LABEL_EXTRA_WIDTH: i32 = 100;
const LABEL_EXTRA_HEIGHT: i32 = 40;

/// Turns a screenshot into classified form fields
#[derive(Debug, Clone, Default)]
pub struct FieldCandidateExtractor<C = KeywordClassifier, D = PasswordDotCounter> {
    classifier: C,
    dot_counter: D,
}

impl FieldCandidateExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: FieldClassifier, D: DotCounter> FieldCandidateExtractor<C, D> {
    pub fn with_components(classifier: C, dot_counter: D) -> Self {
        Self {
            classifier,
            dot_counter,
        }
    }

    /// Fields in contour discovery order.
    ///
    /// A candidate whose OCR fails is skipped; the others are unaffected.
    pub fn detect<O: OcrEngine + ?Sized>(&self, image: &RgbImage, ocr: &mut O) -> Vec<FormField> {
        let (img_w, img_h) = image.dimensions();
        if img_w == 0 || img_h == 0 {
            return Vec::new();
        }

        let gray = imaging::to_gray(image);
        let blurred = imaging::gaussian_blur(&gray, BLUR_KERNEL_SIZE);
        let binary = imaging::adaptive_threshold(
            &blurred,
            ADAPTIVE_BLOCK_SIZE,
            THRESHOLD_OFFSET,
            Polarity::Inverted,
        );

        let contours = imaging::external_contours(&binary);
        debug!("{} outer contours in {}x{} image", contours.len(), img_w, img_h);

        let mut fields = Vec::new();
        for contour in &contours {
            let Some(rect) = candidate_rect(&contour.points, img_w, img_h) else {
                continue;
            };
            match self.classify_candidate(image, rect, ocr) {
                Ok(Some(field)) => {
                    debug!("Field {} at {}: {:?}", field.field_type, rect, field.content);
                    fields.push(field);
                }
                Ok(None) => {}
                Err(e) => warn!("Skipping candidate {}: {}", rect, e),
            }
        }
        fields
    }

    fn classify_candidate<O: OcrEngine + ?Sized>(
        &self,
        image: &RgbImage,
        rect: Region,
        ocr: &mut O,
    ) -> Result<Option<FormField>, OcrError> {
        let label_area = label_region(rect, image.width(), image.height());
        if label_area.is_empty() {
            return Ok(None);
        }

        let label = ocr.extract_text_from_region(image, label_area)?;
        if !self.classifier.is_form_field(&label, rect, image) {
            return Ok(None);
        }

        let (field_type, _) = self.classifier.field_type(&label);
        let content = match field_type {
            FieldType::NotAField => return Ok(None),
            FieldType::Password => {
                let dots = imaging::crop(image, rect)
                    .map_or(0, |crop| self.dot_counter.count_dots(&crop));
                format!("Password field: {dots} dots")
            }
            _ => ocr.extract_text_from_region(image, rect)?,
        };

        Ok(Some(FormField {
            field_type,
            region: rect,
            content,
        }))
    }
}

/// Bounding rectangle of a contour that is polygonal enough and sized like
/// an input field; `None` otherwise
#[must_use]
pub fn candidate_rect(points: &[Point<i32>], img_w: u32, img_h: u32) -> Option<Region> {
    if points.len() < MIN_VERTICES {
        return None;
    }
    let perimeter = arc_length(points, true);
    if perimeter <= 0.0 {
        return None;
    }

    let polygon = approximate_polygon_dp(points, POLYGON_EPSILON * perimeter, true);
    if !(MIN_VERTICES..=MAX_VERTICES).contains(&polygon.len()) {
        return None;
    }

    let rect = imaging::bounding_rect(points);
    passes_size_filters(rect, img_w, img_h).then_some(rect)
}

/// Size and proportion limits for a candidate rectangle
#[must_use]
pub fn passes_size_filters(rect: Region, img_w: u32, img_h: u32) -> bool {
    if rect.width < MIN_WIDTH || rect.height < MIN_HEIGHT {
        return false;
    }
    if f64::from(rect.width) > f64::from(img_w) * MAX_WIDTH_FRACTION
        || f64::from(rect.height) > f64::from(img_h) * MAX_HEIGHT_FRACTION
    {
        return false;
    }
    // squarish mid-sized boxes are buttons
    !(rect.aspect_ratio() < 2.0 && rect.width < 150 && rect.height >= 25)
}

/// Area searched for a candidate's label: the rect grown up and to the left,
/// cut at the image edge
#[must_use]
pub fn label_region(rect: Region, img_w: u32, img_h: u32) -> Region {
    let x = (rect.x - LABEL_MARGIN_X).max(0);
    let y = (rect.y - LABEL_MARGIN_Y).max(0);
    let max_w = i32::try_from(img_w).unwrap_or(i32::MAX);
    let max_h = i32::try_from(img_h).unwrap_or(i32::MAX);
    Region::new(
        x,
        y,
        (max_w - x).min(rect.width + LABEL_EXTRA_WIDTH),
        (max_h - y).min(rect.height + LABEL_EXTRA_HEIGHT),
    )
}
