//! Masked-password dot counting
//!
//! Password inputs render each typed character as a small filled dot. The
//! counter drops the field outline by looking only at the interior of the
//! crop, binarizes it against its local background, removes thin strokes
//! (cursors, underlines) with a morphological opening and counts the compact
//! blobs that are left.

use image::{GrayImage, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use imageproc::point::Point;
use login_detect_common::imaging::{self, Polarity, ADAPTIVE_BLOCK_SIZE};
use login_detect_common::Region;
use tracing::trace;

/// Mean brightness below which a crop is treated as light-on-dark
const DARK_BRIGHTNESS: f64 = 128.0;

/// Local threshold offset used for dot segmentation
const DOT_THRESHOLD_OFFSET: f32 = 3.0;

/// Accepted blob area (inclusive), in square pixels
const MIN_DOT_AREA: f64 = 2.0;
const MAX_DOT_AREA: f64 = 300.0;

/// Accepted bounding-box width/height ratio (inclusive)
const MIN_DOT_ASPECT: f32 = 0.33;
const MAX_DOT_ASPECT: f32 = 3.0;

/// Smallest margin trimmed from every side of the crop
const MIN_INSET: u32 = 3;

/// Counts masking glyphs inside a password field crop
pub trait DotCounter {
    fn count_dots(&self, field: &RgbImage) -> usize;
}

/// Contour-based [`DotCounter`] that copes with light and dark themes
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordDotCounter;

impl PasswordDotCounter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DotCounter for PasswordDotCounter {
    fn count_dots(&self, field: &RgbImage) -> usize {
        let Some(inner) = interior(field) else {
            return 0;
        };

        let brightness = imaging::image_brightness(&inner);
        let gray = imaging::to_gray(&inner);

        // Dots are the high-contrast side of the local mean in either theme
        let binary = if brightness < DARK_BRIGHTNESS {
            imaging::adaptive_threshold(
                &gray,
                ADAPTIVE_BLOCK_SIZE,
                -DOT_THRESHOLD_OFFSET,
                Polarity::Binary,
            )
        } else {
            imaging::adaptive_threshold(
                &gray,
                ADAPTIVE_BLOCK_SIZE,
                DOT_THRESHOLD_OFFSET,
                Polarity::Inverted,
            )
        };

        let opened = morphology::open(&binary, Norm::L1, 1);
        let dots = imaging::external_contours(&opened)
            .iter()
            .filter(|c| !touches_edge(&c.points, &opened) && is_dot_like(&c.points))
            .count();

        trace!(
            "{}x{} interior (brightness {:.1}): {} dots",
            inner.width(),
            inner.height(),
            brightness,
            dots
        );
        dots
    }
}

/// Margin trimmed per side: `max(3, height / 8)`
#[must_use]
pub fn inset_for(height: u32) -> u32 {
    MIN_INSET.max(height / 8)
}

/// The crop without its outline band; `None` when nothing is left
fn interior(field: &RgbImage) -> Option<RgbImage> {
    let inset = inset_for(field.height());
    if field.width() <= 2 * inset || field.height() <= 2 * inset {
        return None;
    }
    let region = Region::new(
        inset as i32,
        inset as i32,
        (field.width() - 2 * inset) as i32,
        (field.height() - 2 * inset) as i32,
    );
    imaging::crop(field, region)
}

/// Blobs cut by the interior boundary are outline remnants, not glyphs
fn touches_edge(points: &[Point<i32>], binary: &GrayImage) -> bool {
    let bounds = imaging::bounding_rect(points);
    bounds.x <= 0
        || bounds.y <= 0
        || bounds.right() >= binary.width() as i32
        || bounds.bottom() >= binary.height() as i32
}

fn is_dot_like(points: &[Point<i32>]) -> bool {
    let area = imaging::contour_area(points);
    if !(MIN_DOT_AREA..=MAX_DOT_AREA).contains(&area) {
        return false;
    }
    let aspect = imaging::bounding_rect(points).aspect_ratio();
    (MIN_DOT_ASPECT..=MAX_DOT_ASPECT).contains(&aspect)
}
