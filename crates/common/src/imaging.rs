//! Raster primitives shared by the detector and the OCR preprocessing
//!
//! Every function returns a freshly allocated buffer; inputs are never
//! modified.

use crate::Region;
use image::{imageops, GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::filter::gaussian_blur_f32;
use imageproc::point::Point;

/// Neighbourhood size used for local thresholding throughout the pipeline
pub const ADAPTIVE_BLOCK_SIZE: u32 = 11;

/// Which side of the local threshold becomes foreground
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Pixels brighter than the threshold become 255
    Binary,
    /// Pixels at or below the threshold become 255
    Inverted,
}

/// Single-channel intensity image with BT.601 luma weights
/// (0.299, 0.587, 0.114), rounded to nearest
#[must_use]
pub fn to_gray(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let weighted = u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114;
        Luma([((weighted + 500) / 1000) as u8])
    })
}

/// Gaussian sigma matching a square kernel of `kernel_size` pixels
#[must_use]
pub fn kernel_sigma(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Gaussian blur sized by kernel width rather than sigma
#[must_use]
pub fn gaussian_blur(gray: &GrayImage, kernel_size: u32) -> GrayImage {
    if gray.width() == 0 || gray.height() == 0 {
        return gray.clone();
    }
    gaussian_blur_f32(gray, kernel_sigma(kernel_size))
}

/// Locally adaptive threshold against a Gaussian-weighted neighbourhood mean.
///
/// A pixel is "above" when `value > local_mean - offset`; `polarity` picks
/// whether above-threshold pixels become foreground or background.
#[must_use]
pub fn adaptive_threshold(
    gray: &GrayImage,
    block_size: u32,
    offset: f32,
    polarity: Polarity,
) -> GrayImage {
    let local_mean = gaussian_blur(gray, block_size);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = f32::from(gray.get_pixel(x, y)[0]);
        let mean = f32::from(local_mean.get_pixel(x, y)[0]);
        let above = value > mean - offset;
        let on = match polarity {
            Polarity::Binary => above,
            Polarity::Inverted => !above,
        };
        Luma([if on { 255 } else { 0 }])
    })
}

/// Global threshold at a fixed level
#[must_use]
pub fn fixed_threshold(gray: &GrayImage, level: u8, polarity: Polarity) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let above = gray.get_pixel(x, y)[0] > level;
        let on = match polarity {
            Polarity::Binary => above,
            Polarity::Inverted => !above,
        };
        Luma([if on { 255 } else { 0 }])
    })
}

/// Mean over all channels of the (clamped) region; 0 for an empty region
#[must_use]
pub fn mean_brightness(image: &RgbImage, region: Region) -> f64 {
    let region = region.clamp_to(image.width(), image.height());
    if region.is_empty() {
        return 0.0;
    }

    let mut total: u64 = 0;
    for y in region.y..region.bottom() {
        for x in region.x..region.right() {
            let px = image.get_pixel(x as u32, y as u32);
            total += u64::from(px[0]) + u64::from(px[1]) + u64::from(px[2]);
        }
    }
    total as f64 / (region.area() as f64 * 3.0)
}

/// Mean brightness of the whole image
#[must_use]
pub fn image_brightness(image: &RgbImage) -> f64 {
    let full = Region::new(
        0,
        0,
        i32::try_from(image.width()).unwrap_or(i32::MAX),
        i32::try_from(image.height()).unwrap_or(i32::MAX),
    );
    mean_brightness(image, full)
}

/// Copy of the clamped region, or `None` when nothing is left after clamping
#[must_use]
pub fn crop(image: &RgbImage, region: Region) -> Option<RgbImage> {
    let region = region.clamp_to(image.width(), image.height());
    if region.is_empty() {
        return None;
    }
    Some(
        imageops::crop_imm(
            image,
            region.x as u32,
            region.y as u32,
            region.width as u32,
            region.height as u32,
        )
        .to_image(),
    )
}

/// Outer borders of top-level foreground blobs (holes and nested blobs are
/// dropped)
#[must_use]
pub fn external_contours(binary: &GrayImage) -> Vec<Contour<i32>> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .collect()
}

/// Smallest pixel-inclusive rectangle covering every point
#[must_use]
pub fn bounding_rect(points: &[Point<i32>]) -> Region {
    let Some(first) = points.first() else {
        return Region::default();
    };

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Region::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
}

/// Area enclosed by a closed contour (shoelace formula)
#[must_use]
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
        .sum();
    twice.abs() as f64 / 2.0
}
