//! Common types and utilities for login form detection

use image::Rgb;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod image_io;
pub mod imaging;

pub use image_io::{load_image, ImageError};

/// Semantic category assigned to a detected form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldType {
    Username,
    Email,
    Phone,
    Name,
    Password,
    #[serde(rename = "Unknown Field")]
    UnknownField,
    #[serde(rename = "Not a Field")]
    NotAField,
}

impl FieldType {
    /// Types that count towards the labeled-fields confidence factor
    pub const LOGIN_FIELDS: [FieldType; 5] = [
        FieldType::Username,
        FieldType::Email,
        FieldType::Password,
        FieldType::Phone,
        FieldType::Name,
    ];

    /// Canonical name, as exposed across the C boundary
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Username => "Username",
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::Name => "Name",
            Self::Password => "Password",
            Self::UnknownField => "Unknown Field",
            Self::NotAField => "Not a Field",
        }
    }

    /// Fixed overlay color used when visualizing detections
    #[must_use]
    pub const fn display_color(self) -> Rgb<u8> {
        match self {
            Self::Username => Rgb([0, 0, 255]),
            Self::Email => Rgb([0, 255, 0]),
            Self::Phone => Rgb([0, 255, 255]),
            Self::Name => Rgb([255, 0, 255]),
            Self::Password => Rgb([255, 0, 0]),
            Self::UnknownField => Rgb([128, 128, 128]),
            Self::NotAField => Rgb([0, 0, 0]),
        }
    }

    /// Username, email, phone or name: anything identifying the account holder
    #[must_use]
    pub const fn is_identity(self) -> bool {
        matches!(
            self,
            Self::Username | Self::Email | Self::Phone | Self::Name
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Username" => Ok(Self::Username),
            "Email" => Ok(Self::Email),
            "Phone" => Ok(Self::Phone),
            "Name" => Ok(Self::Name),
            "Password" => Ok(Self::Password),
            "Unknown Field" => Ok(Self::UnknownField),
            "Not a Field" => Ok(Self::NotAField),
            other => Err(format!("unknown field type: '{other}'")),
        }
    }
}

/// Axis-aligned rectangle in image coordinates
///
/// Coordinates are signed so that expansions past the image edge can be
/// expressed before clamping. A region with zero area is a valid "nothing
/// here" value, not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    #[must_use]
    pub const fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width as i64 * self.height as i64
        }
    }

    /// Width over height; infinite for a zero-height region
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            f32::INFINITY
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Center point, rounded towards the origin
    #[must_use]
    pub const fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    #[must_use]
    pub const fn contains_point(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Clamp to an image of `width` x `height` pixels.
    ///
    /// The origin is pulled inside the image first, then the extent is cut
    /// at the right/bottom edge. Extents that end up negative collapse to 0.
    #[must_use]
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let max_w = i32::try_from(width).unwrap_or(i32::MAX);
        let max_h = i32::try_from(height).unwrap_or(i32::MAX);
        let x = self.x.clamp(0, max_w);
        let y = self.y.clamp(0, max_h);
        Self {
            x,
            y,
            width: self.width.min(max_w - x).max(0),
            height: self.height.min(max_h - y).max(0),
        }
    }

    /// True when the whole region lies inside a `width` x `height` image
    #[must_use]
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let max_w = i64::from(width);
        let max_h = i64::from(height);
        self.x >= 0
            && self.y >= 0
            && self.width >= 0
            && self.height >= 0
            && i64::from(self.x) + i64::from(self.width) <= max_w
            && i64::from(self.y) + i64::from(self.height) <= max_h
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.x, self.y
        )
    }
}

/// A classified input field found on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub region: Region,
    /// OCR text of the field, or a dot-count summary for password fields
    pub content: String,
}

/// Individually capped contributions to the login-page score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFactors {
    pub labeled_fields: f64,
    pub login_keywords: f64,
    pub strong_keywords: f64,
    pub password_field: f64,
    pub username_field: f64,
}

impl ConfidenceFactors {
    pub const NAMES: [&'static str; 5] = [
        "labeled_fields",
        "login_keywords",
        "strong_keywords",
        "password_field",
        "username_field",
    ];

    /// Named contributions in a stable order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        Self::NAMES.into_iter().zip([
            self.labeled_fields,
            self.login_keywords,
            self.strong_keywords,
            self.password_field,
            self.username_field,
        ])
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Uncapped sum of all contributions
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.iter().map(|(_, v)| v).sum()
    }
}

/// Outcome of analyzing one image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub is_login_page: bool,
    /// Always within [0, 1]
    pub confidence: f64,
    /// Discovery order; not a spatial ordering
    pub fields: Vec<FormField>,
    pub errors: Vec<String>,
    pub execution_time_ms: f64,
    #[serde(default)]
    pub factors: ConfidenceFactors,
}

impl DetectionResult {
    /// A negative verdict carrying a single error message
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            errors: vec![error.into()],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
