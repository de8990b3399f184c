use crate::image::{GrayImage, GrayImageView};
use crate::warp::Interpolation;

/// Resample `src` to exactly `out_w × out_h`.
///
/// Pixel centres are aligned (`sx = (x + 0.5) * w_in / w_out - 0.5`), so a
/// same-size resize returns the input unchanged. An empty source yields a
/// black image.
pub fn resize_gray(
    src: &GrayImageView<'_>,
    out_w: usize,
    out_h: usize,
    interpolation: Interpolation,
) -> GrayImage {
    if src.width == out_w && src.height == out_h {
        return src.to_image();
    }
    let mut out = GrayImage::new(out_w, out_h);
    if src.width == 0 || src.height == 0 {
        return out;
    }

    let scale_x = src.width as f32 / out_w.max(1) as f32;
    let scale_y = src.height as f32 / out_h.max(1) as f32;
    let max_x = (src.width - 1) as f32;
    let max_y = (src.height - 1) as f32;

    for y in 0..out_h {
        for x in 0..out_w {
            let v = match interpolation {
                Interpolation::Nearest => {
                    let sx = (((x as f32 + 0.5) * scale_x).floor() as usize).min(src.width - 1);
                    let sy = (((y as f32 + 0.5) * scale_y).floor() as usize).min(src.height - 1);
                    src.get(sx, sy)
                }
                Interpolation::Bilinear => {
                    let sx = ((x as f32 + 0.5) * scale_x - 0.5).clamp(0.0, max_x);
                    let sy = ((y as f32 + 0.5) * scale_y - 0.5).clamp(0.0, max_y);
                    bilinear_clamped(src, sx, sy)
                }
            };
            out.set(x, y, v);
        }
    }
    out
}

// Edge-replicating bilinear sample; `x`, `y` are already inside the image.
fn bilinear_clamped(src: &GrayImageView<'_>, x: f32, y: f32) -> u8 {
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(src.width - 1);
    let y1 = (y0 + 1).min(src.height - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = src.get(x0, y0) as f32;
    let p10 = src.get(x1, y0) as f32;
    let p01 = src.get(x0, y1) as f32;
    let p11 = src.get(x1, y1) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    (a + fy * (b - a)).round().clamp(0.0, 255.0) as u8
}
