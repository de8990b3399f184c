use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::homography::Homography;
use crate::image::{sample_bilinear, sample_nearest, GrayImage, GrayImageView};

/// Pixel interpolation used by warps and resizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Nearest source pixel. Keeps binary masks binary.
    Nearest,
    #[default]
    Bilinear,
}

/// Inverse-map warp: every output pixel `(x, y)` reads the source at
/// `h_src_from_dst * (x, y)`.
///
/// Samples falling outside `src` take `border`. Bilinear results are rounded
/// to the nearest integer.
pub fn warp_perspective_gray(
    src: &GrayImageView<'_>,
    h_src_from_dst: &Homography,
    out_w: usize,
    out_h: usize,
    interpolation: Interpolation,
    border: u8,
) -> GrayImage {
    let mut out = vec![0u8; out_w * out_h];

    for y in 0..out_h {
        let row = &mut out[y * out_w..(y + 1) * out_w];
        for (x, px) in row.iter_mut().enumerate() {
            let ps = h_src_from_dst.apply(Point2::new(x as f32, y as f32));
            if !ps.x.is_finite() || !ps.y.is_finite() {
                *px = border;
                continue;
            }
            *px = match interpolation {
                Interpolation::Nearest => sample_nearest(src, ps.x, ps.y, border),
                Interpolation::Bilinear => {
                    sample_bilinear(src, ps.x, ps.y, border).round().clamp(0.0, 255.0) as u8
                }
            };
        }
    }

    GrayImage {
        width: out_w,
        height: out_h,
        data: out,
    }
}
