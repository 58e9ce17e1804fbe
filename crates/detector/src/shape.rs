//! Geometric heuristics for input-field candidates

use image::RgbImage;
use imageproc::edges::canny;
use login_detect_common::{imaging, Region};
use tracing::trace;

/// Brightness below which a region is considered dark-themed
const DARK_BRIGHTNESS: f64 = 128.0;

/// Canny hysteresis thresholds for the neighbourhood probe
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

/// Probe windows smaller than this (either side) are not edge-scanned
const MIN_PROBE_SIDE: i32 = 3;

/// Shape classification of a candidate rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeAssessment {
    pub looks_like_button: bool,
    pub looks_like_checkbox: bool,
    pub is_field_shape: bool,
}

impl ShapeAssessment {
    #[must_use]
    pub fn of(rect: Region) -> Self {
        let aspect = rect.aspect_ratio();
        let (w, h) = (rect.width, rect.height);
        Self {
            looks_like_button: (aspect > 0.75 && aspect < 2.5) || (w < 150 && h > 30),
            looks_like_checkbox: aspect > 0.6 && aspect < 1.5 && w < 50,
            is_field_shape: aspect > 2.5 && h > 20 && w > 100 && w < 500,
        }
    }

    /// Neither button- nor checkbox-shaped
    #[must_use]
    pub fn is_input_like(&self) -> bool {
        !self.looks_like_button && !self.looks_like_checkbox
    }
}

/// What the surroundings of a candidate look like
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NeighborhoodProbe {
    pub dark_theme: bool,
    pub has_nearby_input_field: bool,
}

impl NeighborhoodProbe {
    /// Scan the area right of and below `rect` for other input-like edges
    #[must_use]
    pub fn scan(image: &RgbImage, rect: Region) -> Self {
        let dark_theme = imaging::mean_brightness(image, rect) < DARK_BRIGHTNESS;

        let has_nearby_input_field = probe_windows(rect, image.width(), image.height())
            .into_iter()
            .filter(|w| w.width >= MIN_PROBE_SIDE && w.height >= MIN_PROBE_SIDE)
            .any(|w| window_has_input_edge(image, w, dark_theme));

        let probe = Self {
            dark_theme,
            has_nearby_input_field,
        };
        trace!("Neighbourhood of {}: {:?}", rect, probe);
        probe
    }
}

/// The right and below windows, clamped to the image (possibly empty)
#[must_use]
pub fn probe_windows(rect: Region, img_w: u32, img_h: u32) -> [Region; 2] {
    let (w, h) = (
        i32::try_from(img_w).unwrap_or(i32::MAX),
        i32::try_from(img_h).unwrap_or(i32::MAX),
    );
    let right = Region::new(
        rect.right(),
        rect.y - rect.height / 2,
        500_i32.min(w - rect.right()),
        rect.height * 2,
    );
    let below = Region::new(
        rect.x - 50,
        rect.bottom(),
        rect.width + 100,
        100_i32.min(h - rect.bottom()),
    );
    [right.clamp_to(img_w, img_h), below.clamp_to(img_w, img_h)]
}

fn window_has_input_edge(image: &RgbImage, window: Region, dark_theme: bool) -> bool {
    let Some(crop) = imaging::crop(image, window) else {
        return false;
    };
    let edges = canny(&imaging::to_gray(&crop), CANNY_LOW, CANNY_HIGH);
    imaging::external_contours(&edges).iter().any(|c| {
        let bounds = imaging::bounding_rect(&c.points);
        let aspect = bounds.aspect_ratio();
        (aspect > 2.0 && aspect < 15.0)
            || (dark_theme && bounds.width > 100 && bounds.height > 20)
    })
}
