//! End-to-end tests for the detection pipeline
//!
//! Synthetic screenshots are drawn with `imageproc::drawing`; OCR output is
//! scripted so the tests do not depend on an installed Tesseract.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use login_detect::{
    DetectError, DetectorConfig, FieldType, LoginPageDetector, OcrEngine, OcrError, Region,
};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

/// OCR stand-in returning the label whose anchor point falls inside the
/// queried region
#[derive(Default)]
struct ScriptedOcr {
    page_text: String,
    labels: Vec<(Region, String)>,
    ready: bool,
    init_failures: usize,
    fail_regions: bool,
    init_calls: usize,
    released: bool,
}

impl ScriptedOcr {
    fn new(page_text: &str, labels: &[(Region, &str)]) -> Self {
        Self {
            page_text: page_text.to_string(),
            labels: labels
                .iter()
                .map(|(r, t)| (*r, (*t).to_string()))
                .collect(),
            ..Self::default()
        }
    }
}

impl OcrEngine for ScriptedOcr {
    fn initialize(&mut self) -> Result<(), OcrError> {
        self.init_calls += 1;
        if self.init_failures > 0 {
            self.init_failures -= 1;
            return Err(OcrError::InitError("scripted failure".to_string()));
        }
        self.ready = true;
        self.released = false;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.ready
    }

    fn release(&mut self) {
        self.ready = false;
        self.released = true;
    }

    fn recognize(&mut self, _binary: &GrayImage) -> Result<String, OcrError> {
        Ok(String::new())
    }

    fn extract_text(&mut self, _image: &RgbImage) -> Result<String, OcrError> {
        self.ensure_initialized()?;
        Ok(self.page_text.to_lowercase())
    }

    fn extract_text_from_region(
        &mut self,
        _image: &RgbImage,
        region: Region,
    ) -> Result<String, OcrError> {
        self.ensure_initialized()?;
        if self.fail_regions {
            return Err(OcrError::RecognitionError("scripted failure".to_string()));
        }
        Ok(self
            .labels
            .iter()
            .find(|(anchor, _)| {
                let (cx, cy) = anchor.center();
                region.contains_point(cx, cy)
            })
            .map(|(_, text)| text.clone())
            .unwrap_or_default())
    }
}

const USERNAME_BOX: Region = Region::new(50, 100, 300, 40);
const PASSWORD_BOX: Region = Region::new(50, 200, 300, 40);

fn draw_input_box(img: &mut RgbImage, r: Region) {
    // 2px outline
    draw_hollow_rect_mut(img, Rect::at(r.x, r.y).of_size(r.width as u32, r.height as u32), INK);
    draw_hollow_rect_mut(
        img,
        Rect::at(r.x + 1, r.y + 1).of_size(r.width as u32 - 2, r.height as u32 - 2),
        INK,
    );
}

fn sign_in_form() -> RgbImage {
    let mut img = RgbImage::from_pixel(800, 600, WHITE);
    draw_input_box(&mut img, USERNAME_BOX);
    draw_input_box(&mut img, PASSWORD_BOX);
    for i in 0..6 {
        draw_filled_circle_mut(&mut img, (80 + i * 30, PASSWORD_BOX.y + 20), 4, INK);
    }
    img
}

fn sign_in_ocr() -> ScriptedOcr {
    ScriptedOcr::new(
        "Sign in to your account",
        &[(USERNAME_BOX, "Username"), (PASSWORD_BOX, "Password")],
    )
}

fn detector(ocr: ScriptedOcr) -> LoginPageDetector<ScriptedOcr> {
    LoginPageDetector::with_engine(DetectorConfig::default(), ocr).unwrap()
}

/// Field regions may be a pixel or two larger than the drawn outline
fn roughly_at(found: Region, drawn: Region) -> bool {
    (found.x - drawn.x).abs() <= 3
        && (found.y - drawn.y).abs() <= 3
        && (found.width - drawn.width).abs() <= 6
        && (found.height - drawn.height).abs() <= 6
}

#[test]
fn test_sign_in_form_is_detected() {
    let mut detector = detector(sign_in_ocr());
    let result = detector.analyze_image(&sign_in_form());

    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
    assert!(result.is_login_page);
    assert!(result.confidence >= 0.6);
    assert!((result.confidence - 0.94).abs() < 1e-9, "{}", result.confidence);

    assert_eq!(result.fields.len(), 2, "fields: {:?}", result.fields);
    assert_eq!(result.fields[0].field_type, FieldType::Username);
    assert_eq!(result.fields[0].content, "Username");
    assert!(roughly_at(result.fields[0].region, USERNAME_BOX));

    assert_eq!(result.fields[1].field_type, FieldType::Password);
    assert_eq!(result.fields[1].content, "Password field: 6 dots");
    assert!(roughly_at(result.fields[1].region, PASSWORD_BOX));

    assert!(result.execution_time_ms >= 0.0);
    assert!((result.factors.password_field - 0.35).abs() < 1e-9);
}

#[test]
fn test_threshold_controls_verdict_only() {
    let mut detector = LoginPageDetector::with_engine(
        DetectorConfig::with_threshold(0.95),
        sign_in_ocr(),
    )
    .unwrap();
    let result = detector.analyze_image(&sign_in_form());
    assert!(!result.is_login_page);
    assert!((result.confidence - 0.94).abs() < 1e-9);

    detector.set_confidence_threshold(0.9).unwrap();
    assert!(detector.analyze_image(&sign_in_form()).is_login_page);
}

#[test]
fn test_invalid_threshold_rejected() {
    assert!(matches!(
        LoginPageDetector::with_engine(DetectorConfig::with_threshold(1.2), ScriptedOcr::default()),
        Err(DetectError::InvalidConfig(_))
    ));

    let mut detector = detector(ScriptedOcr::default());
    assert!(detector.set_confidence_threshold(-1.0).is_err());
    assert_eq!(detector.config().confidence_threshold, 0.6);
}

#[test]
fn test_blank_image() {
    let mut detector = detector(ScriptedOcr::default());
    let result = detector.analyze_image(&RgbImage::from_pixel(800, 600, WHITE));

    assert!(!result.is_login_page);
    assert_eq!(result.confidence, 0.0);
    assert!(result.fields.is_empty());
    assert!(result.errors.is_empty());
}

#[test]
fn test_analyze_path_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("login.png");
    sign_in_form().save(&path).unwrap();

    let mut detector = detector(sign_in_ocr());
    let result = detector.analyze_path(&path);
    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
    assert!(result.is_login_page);
    assert_eq!(result.fields.len(), 2);
}

#[test]
fn test_missing_file() {
    let mut detector = detector(sign_in_ocr());
    let path = "/nonexistent/dir/screenshot.png";
    let result = detector.analyze_path(path);

    assert!(!result.is_login_page);
    assert_eq!(result.confidence, 0.0);
    assert!(result.fields.is_empty());
    assert_eq!(
        result.errors,
        vec![format!("Error: Unable to read image from {path}")]
    );
}

#[test]
fn test_undecodable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"definitely not a png").unwrap();

    let mut detector = detector(sign_in_ocr());
    let result = detector.analyze_path(&path);
    assert_eq!(
        result.errors,
        vec![format!("Error: Unable to read image from {}", path.display())]
    );

    // the detector stays usable afterwards
    assert!(detector.analyze_image(&sign_in_form()).is_login_page);
}

#[test]
fn test_engine_that_never_starts() {
    let ocr = ScriptedOcr {
        init_failures: usize::MAX,
        ..sign_in_ocr()
    };
    let mut detector = detector(ocr);
    let result = detector.analyze_image(&sign_in_form());

    assert!(!result.is_login_page);
    assert_eq!(result.confidence, 0.0);
    assert!(result.fields.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert!(
        result.errors[0].starts_with("Error: OCR engine fault"),
        "{}",
        result.errors[0]
    );
}

#[test]
fn test_engine_recovers_lazily() {
    let ocr = ScriptedOcr {
        init_failures: 1,
        ..sign_in_ocr()
    };
    let mut detector = detector(ocr);
    assert!(!detector.ocr().is_initialized());

    let result = detector.analyze_image(&sign_in_form());
    assert!(result.errors.is_empty());
    assert!(result.is_login_page);
    assert_eq!(detector.ocr().init_calls, 2);
}

#[test]
fn test_region_ocr_failures_skip_candidates() {
    let ocr = ScriptedOcr {
        fail_regions: true,
        ..sign_in_ocr()
    };
    let mut detector = detector(ocr);
    let result = detector.analyze_image(&sign_in_form());

    assert!(result.errors.is_empty());
    assert!(result.fields.is_empty());
    // page keywords alone
    assert!((result.confidence - 0.14).abs() < 1e-9, "{}", result.confidence);
    assert!(!result.is_login_page);
}

#[test]
fn test_link_labels_are_not_fields() {
    let mut img = RgbImage::from_pixel(800, 600, WHITE);
    draw_input_box(&mut img, USERNAME_BOX);
    draw_input_box(&mut img, PASSWORD_BOX);

    let ocr = ScriptedOcr::new(
        "",
        &[
            (USERNAME_BOX, "Forgot password"),
            (PASSWORD_BOX, "Terms of service"),
        ],
    );
    let result = detector(ocr).analyze_image(&img);
    assert!(result.fields.is_empty(), "fields: {:?}", result.fields);
    assert_eq!(result.confidence, 0.0);
}

#[test]
fn test_instruction_label_is_unknown_field() {
    let mut img = RgbImage::from_pixel(800, 600, WHITE);
    draw_input_box(&mut img, PASSWORD_BOX);

    let ocr = ScriptedOcr::new("", &[(PASSWORD_BOX, "Confirm your password")]);
    let result = detector(ocr).analyze_image(&img);

    assert_eq!(result.fields.len(), 1);
    assert_eq!(result.fields[0].field_type, FieldType::UnknownField);
    assert_eq!(result.confidence, 0.0);
}

#[test]
fn test_email_field() {
    let mut img = RgbImage::from_pixel(800, 600, WHITE);
    draw_input_box(&mut img, USERNAME_BOX);

    let ocr = ScriptedOcr::new("", &[(USERNAME_BOX, "Email Address")]);
    let result = detector(ocr).analyze_image(&img);

    assert_eq!(result.fields.len(), 1);
    assert_eq!(result.fields[0].field_type, FieldType::Email);
    assert_eq!(result.fields[0].content, "Email Address");
}

#[test]
fn test_button_sized_boxes_are_ignored() {
    let mut img = RgbImage::from_pixel(800, 600, WHITE);
    draw_input_box(&mut img, Region::new(50, 300, 120, 60));

    let ocr = ScriptedOcr::new("", &[(Region::new(50, 300, 120, 60), "Password")]);
    let result = detector(ocr).analyze_image(&img);
    assert!(result.fields.is_empty());
}

#[test]
fn test_engine_released_on_drop() {
    use std::cell::Cell;
    use std::rc::Rc;

    struct Tracked(Rc<Cell<bool>>, ScriptedOcr);

    impl OcrEngine for Tracked {
        fn initialize(&mut self) -> Result<(), OcrError> {
            self.1.initialize()
        }
        fn is_initialized(&self) -> bool {
            self.1.is_initialized()
        }
        fn release(&mut self) {
            self.0.set(true);
            self.1.release();
        }
        fn recognize(&mut self, binary: &GrayImage) -> Result<String, OcrError> {
            self.1.recognize(binary)
        }
    }

    let released = Rc::new(Cell::new(false));
    let detector = LoginPageDetector::with_engine(
        DetectorConfig::default(),
        Tracked(Rc::clone(&released), ScriptedOcr::default()),
    )
    .unwrap();
    assert!(!released.get());
    drop(detector);
    assert!(released.get());
}
