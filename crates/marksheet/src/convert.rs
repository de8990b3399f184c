//! Conversions between `image` buffers and the lightweight core types.

use ::image::{DynamicImage, GrayImage as ImgGray, RgbImage as ImgRgb};

use crate::core;

#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("image dimensions {width}x{height} do not fit an `image` buffer")]
    Dimensions { width: usize, height: usize },
}

/// Borrow an `image::GrayImage` as a core view.
pub fn gray_view(img: &ImgGray) -> core::GrayImageView<'_> {
    core::GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Luma of any decoded image.
pub fn to_gray(img: &DynamicImage) -> core::GrayImage {
    let luma = img.to_luma8();
    core::GrayImage {
        width: luma.width() as usize,
        height: luma.height() as usize,
        data: luma.into_raw(),
    }
}

pub fn to_rgb(img: &DynamicImage) -> core::RgbImage {
    let rgb = img.to_rgb8();
    core::RgbImage {
        width: rgb.width() as usize,
        height: rgb.height() as usize,
        data: rgb.into_raw(),
    }
}

fn dims(width: usize, height: usize) -> Result<(u32, u32), ConvertError> {
    let err = ConvertError::Dimensions { width, height };
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(err),
    }
}

pub fn gray_to_image(img: &core::GrayImage) -> Result<ImgGray, ConvertError> {
    let (w, h) = dims(img.width, img.height)?;
    ImgGray::from_raw(w, h, img.data.clone()).ok_or(ConvertError::Dimensions {
        width: img.width,
        height: img.height,
    })
}

pub fn rgb_to_image(img: &core::RgbImage) -> Result<ImgRgb, ConvertError> {
    let (w, h) = dims(img.width, img.height)?;
    ImgRgb::from_raw(w, h, img.data.clone()).ok_or(ConvertError::Dimensions {
        width: img.width,
        height: img.height,
    })
}
