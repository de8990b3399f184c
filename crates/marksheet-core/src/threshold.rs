//! Global (Otsu) and local (mean) thresholds.

use crate::image::{GrayImage, GrayImageView};

/// Otsu threshold over a set of intensities.
///
/// Returns the level `t` maximising between-class variance when class 0 is
/// `v <= t`. `None` for an empty or single-valued input, where no split
/// exists.
pub fn otsu_level(samples: &[u8]) -> Option<u8> {
    let (&first, rest) = samples.split_first()?;
    let (mut min_v, mut max_v) = (first, first);
    for &v in rest {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if min_v == max_v {
        return None;
    }

    let mut hist = [0u32; 256];
    for &v in samples {
        hist[v as usize] += 1;
    }
    if hist.iter().filter(|&&h| h > 0).count() <= 2 {
        return Some(((min_v as u16 + max_v as u16) / 2) as u8);
    }

    let total = samples.len() as f64;
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = min_v;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += t as f64 * h as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    Some(best_t)
}

/// Mean-C adaptive threshold.
///
/// A pixel is foreground (255) when `v + offset < mean`, where `mean` is the
/// average over the `(2 * radius + 1)²` window clipped to the image. Everything
/// else is 0, so dark ink on light paper comes out white.
pub fn adaptive_threshold(src: &GrayImageView<'_>, radius: usize, offset: u8) -> GrayImage {
    let (w, h) = (src.width, src.height);
    let mut out = GrayImage::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }

    // (w + 1) × (h + 1) summed-area table
    let stride = w + 1;
    let mut integral = vec![0u64; stride * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += src.get(x, y) as u64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }

    for y in 0..h {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius + 1).min(h);
        for x in 0..w {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius + 1).min(w);
            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let area = ((x1 - x0) * (y1 - y0)) as u64;
            // v + offset < sum / area, kept in integers
            let lhs = (src.get(x, y) as u64 + offset as u64) * area;
            if lhs < sum {
                out.set(x, y, 255);
            }
        }
    }
    out
}
