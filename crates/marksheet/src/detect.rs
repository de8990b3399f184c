//! End-to-end helpers on decoded `image` photos.

use std::path::Path;

use ::image::{DynamicImage, RgbImage as ImgRgb};
use log::info;

use crate::convert::{self, ConvertError};
use crate::core::Rgb;
use crate::{AnswerSheet, SheetAnswers, SheetReport};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the high-level facade helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error(transparent)]
    Image(#[from] ::image::ImageError),
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Default overlay colour for marked cells.
pub const MARK_COLOR: Rgb = [255, 0, 0];

pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage, DetectError> {
    Ok(::image::open(path)?)
}

/// Rectify and read a decoded photo.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, sheet), fields(width = img.width(), height = img.height()))
)]
pub fn read_sheet(img: &DynamicImage, sheet: &AnswerSheet) -> Option<SheetAnswers> {
    let gray = convert::to_gray(img);
    sheet.read(&gray.view())
}

/// Like [`read_sheet`] but keeps the detected markers for reporting.
pub fn inspect_sheet(img: &DynamicImage, sheet: &AnswerSheet) -> SheetReport {
    let gray = convert::to_gray(img);
    let report = SheetReport::inspect(sheet, &gray.view());
    info!(
        "{} marker(s), sheet {}",
        report.markers.len(),
        if report.found() { "found" } else { "not found" }
    );
    report
}

/// Paint the marked cells of `answers` onto the photo.
pub fn overlay_answers(
    img: &DynamicImage,
    sheet: &AnswerSheet,
    answers: &SheetAnswers,
    alpha: f32,
    color: Rgb,
) -> Result<ImgRgb, DetectError> {
    let base = convert::to_rgb(img);
    let out = sheet.overlay(&base, answers, alpha, color);
    Ok(convert::rgb_to_image(&out)?)
}
