//! Core types and utilities for answer sheet reading.
//!
//! This crate is intentionally small and purely pixel/geometry oriented. It
//! does *not* depend on any concrete image codec; callers hand in row-major
//! 8-bit buffers and get the same back.
//!
//! Coordinate convention: pixel centres sit on integer coordinates, so an
//! identity homography or a same-size resize reproduces the input exactly.

mod homography;
mod image;
mod logger;
mod resize;
mod threshold;
mod warp;

pub use homography::{homography_from_4pt, Homography};
pub use image::{
    sample_bilinear, sample_nearest, GrayImage, GrayImageView, PixelRect, Rgb, RgbImage,
};
pub use resize::resize_gray;
pub use threshold::{adaptive_threshold, otsu_level};
pub use warp::{warp_perspective_gray, Interpolation};

#[cfg(feature = "tracing")]
pub use logger::{init_tracing, TraceFormat};

pub use logger::init_with_level;
