//! `analyze` - run the detector over one or more screenshots

use anyhow::{Context as _, Result};
use clap::Args;
use image::RgbImage;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use login_detect::{DetectionResult, DetectorConfig, FormField, LoginPageDetector};
use login_detect_common::load_image;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Args)]
pub struct AnalyzeCommand {
    /// Screenshot files to analyze
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// Confidence needed for a positive verdict (overrides the config file)
    #[arg(short, long)]
    threshold: Option<f64>,

    /// YAML detector configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print a JSON array of results instead of summaries
    #[arg(long, default_value = "false")]
    json: bool,

    /// Write copies with detected fields outlined into this directory
    #[arg(long, value_name = "DIR")]
    annotate: Option<PathBuf>,
}

impl AnalyzeCommand {
    pub fn execute(self) -> Result<()> {
        let config = self.load_config()?;

        if !cfg!(feature = "tesseract") {
            warn!("Built without the `tesseract` feature: analyses will report an OCR engine fault");
        }

        let mut detector =
            LoginPageDetector::new(config).context("Failed to create detector")?;

        if let Some(dir) = &self.annotate {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let mut reports = Vec::with_capacity(self.images.len());
        for path in &self.images {
            let result = detector.analyze_path(path);

            if let Some(dir) = &self.annotate {
                if !result.has_errors() {
                    if let Err(e) = write_annotated(path, &result.fields, dir) {
                        warn!("No annotated copy of {}: {:#}", path.display(), e);
                    }
                }
            }

            if self.json {
                reports.push(serde_json::json!({
                    "path": path.display().to_string(),
                    "result": result,
                }));
            } else {
                print!("{}", format_summary(path, &result));
            }
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        Ok(())
    }

    fn load_config(&self) -> Result<DetectorConfig> {
        let mut config = match &self.config {
            Some(path) => DetectorConfig::from_yaml(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => DetectorConfig::default(),
        };
        if let Some(threshold) = self.threshold {
            config.confidence_threshold = threshold;
        }
        config.validate().context("Invalid detector configuration")?;
        Ok(config)
    }
}

/// Human-readable report ending in a bare `true`/`false` verdict line
fn format_summary(path: &Path, result: &DetectionResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", path.display());
    let _ = writeln!(
        out,
        "  confidence {:.2} ({:.1} ms)",
        result.confidence, result.execution_time_ms
    );

    if !result.has_errors() {
        let factors: Vec<String> = result
            .factors
            .iter()
            .map(|(name, value)| format!("{name}={value:.2}"))
            .collect();
        let _ = writeln!(out, "  factors: {}", factors.join(" "));
    }

    for field in &result.fields {
        let _ = writeln!(
            out,
            "  {} {}: {:?}",
            field.field_type, field.region, field.content
        );
    }
    for error in &result.errors {
        let _ = writeln!(out, "  {error}");
    }

    let _ = writeln!(out, "{}", result.is_login_page);
    out
}

fn annotated_path(image: &Path, dir: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map_or_else(|| "image".into(), |s| s.to_string_lossy());
    dir.join(format!("{stem}.annotated.png"))
}

/// Outline each field in its type's color
fn draw_fields(image: &mut RgbImage, fields: &[FormField]) {
    for field in fields {
        let r = field.region;
        if r.width <= 2 || r.height <= 2 {
            continue;
        }
        let color = field.field_type.display_color();
        draw_hollow_rect_mut(
            image,
            Rect::at(r.x, r.y).of_size(r.width as u32, r.height as u32),
            color,
        );
        draw_hollow_rect_mut(
            image,
            Rect::at(r.x + 1, r.y + 1).of_size(r.width as u32 - 2, r.height as u32 - 2),
            color,
        );
    }
}

fn write_annotated(path: &Path, fields: &[FormField], dir: &Path) -> Result<PathBuf> {
    let mut image = load_image(path)?;
    draw_fields(&mut image, fields);

    let out = annotated_path(path, dir);
    image
        .save(&out)
        .with_context(|| format!("Failed to save {}", out.display()))?;
    Ok(out)
}
