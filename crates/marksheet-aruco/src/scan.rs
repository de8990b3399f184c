//! Marker decoding from an image-space quadrilateral.

use marksheet_core::{homography_from_4pt, otsu_level, GrayImageView, Homography};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::Matcher;

/// Sampling and acceptance settings for one quad.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadDecodeConfig {
    /// Black border width in bit cells (OpenCV prints 1).
    pub border_bits: usize,
    /// Fraction of the marker side ignored along each edge before sampling.
    pub inset_frac: f32,
    /// Minimum fraction of border cells that must read black.
    pub min_border_score: f32,
}

impl Default for QuadDecodeConfig {
    fn default() -> Self {
        Self {
            border_bits: 1,
            inset_frac: 0.0,
            min_border_score: 0.85,
        }
    }
}

/// One decoded marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerDetection {
    pub id: u32,
    /// Image corners in the marker's own order: TL, TR, BR, BL as printed.
    pub corners: [Point2<f32>; 4],
    /// Quarter turns between the sampled quad and the printed marker.
    pub rotation: u8,
    pub hamming: u8,
    /// `border_score` discounted by the fraction of corrected bits.
    pub score: f32,
    pub border_score: f32,
    /// Inner bits as sampled from the quad, row-major, black = 1.
    pub code: u64,
}

#[derive(Clone, Copy, Debug)]
struct MarkerObservation {
    code: u64,
    border_score: f32,
}

const MIN_SIDE_PX: f32 = 12.0;
const THRESH_SUBDIV: usize = 3;

// Sample positions in a canonical `s × s` square.
struct SampleGrid {
    cells: usize,
    points: Vec<Point2<f32>>, // row-major: cy * cells + cx
    threshold_points: Vec<Point2<f32>>,
}

impl SampleGrid {
    fn new(cfg: &QuadDecodeConfig, bits: usize, s: f32) -> Option<Self> {
        let cells = bits + 2 * cfg.border_bits;
        if bits * bits > 64 || cells == 0 {
            return None;
        }

        let inset = (cfg.inset_frac * s).max(0.0);
        let side = s - 2.0 * inset;
        if side < MIN_SIDE_PX {
            return None;
        }

        let step = side / cells as f32;
        let points = (0..cells * cells)
            .map(|i| {
                let (cx, cy) = (i % cells, i / cells);
                Point2::new(
                    inset + (cx as f32 + 0.5) * step,
                    inset + (cy as f32 + 0.5) * step,
                )
            })
            .collect();

        let grid = cells * THRESH_SUBDIV;
        let tstep = side / grid as f32;
        let threshold_points = (0..grid * grid)
            .map(|i| {
                let (tx, ty) = (i % grid, i / grid);
                Point2::new(
                    inset + (tx as f32 + 0.5) * tstep,
                    inset + (ty as f32 + 0.5) * tstep,
                )
            })
            .collect();

        Some(Self {
            cells,
            points,
            threshold_points,
        })
    }
}

/// Decode a marker whose outer black border spans `quad` (clockwise, any
/// starting corner).
///
/// The returned corners are reordered so `corners[0]` is the marker's printed
/// top-left. `None` if the quad leaves the image, the border is not black
/// enough, or no dictionary code is within the matcher's Hamming budget.
pub fn decode_marker_in_quad(
    image: &GrayImageView<'_>,
    quad: &[Point2<f32>; 4],
    cfg: &QuadDecodeConfig,
    matcher: &Matcher,
) -> Option<MarkerDetection> {
    let dict = matcher.dictionary();
    let s = mean_side(quad);
    let grid = SampleGrid::new(cfg, dict.marker_size, s)?;

    let square = [
        Point2::new(0.0, 0.0),
        Point2::new(s, 0.0),
        Point2::new(s, s),
        Point2::new(0.0, s),
    ];
    let h = homography_from_4pt(&square, quad)?;

    let obs = observe(image, &h, &grid, dict.marker_size, cfg)?;
    let m = matcher.match_code(obs.code)?;

    let bits = dict.bit_count().max(1) as f32;
    let score = (obs.border_score * (1.0 - m.hamming as f32 / bits)).clamp(0.0, 1.0);
    let r = m.rotation as usize;

    Some(MarkerDetection {
        id: m.id,
        corners: [0, 1, 2, 3].map(|k| quad[(k + r) % 4]),
        rotation: m.rotation,
        hamming: m.hamming,
        score,
        border_score: obs.border_score,
        code: obs.code,
    })
}

fn observe(
    image: &GrayImageView<'_>,
    h: &Homography,
    grid: &SampleGrid,
    bits: usize,
    cfg: &QuadDecodeConfig,
) -> Option<MarkerObservation> {
    let samples = grid
        .points
        .iter()
        .map(|p| {
            let q = h.apply(*p);
            sample_mean_3x3(image, q.x, q.y)
        })
        .collect::<Option<Vec<u8>>>()?;

    let thr_samples: Vec<u8> = grid
        .threshold_points
        .iter()
        .filter_map(|p| {
            let q = h.apply(*p);
            sample_mean_3x3(image, q.x, q.y)
        })
        .collect();

    decode_samples(
        &samples,
        &thr_samples,
        grid.cells,
        bits,
        cfg.border_bits,
        cfg.min_border_score,
    )
}

// Black-on-white only: an inverted print is rejected by its border.
fn decode_samples(
    samples: &[u8],
    thr_samples: &[u8],
    cells: usize,
    bits: usize,
    border: usize,
    min_border_score: f32,
) -> Option<MarkerObservation> {
    if samples.len() != cells * cells {
        return None;
    }

    let thr = otsu_level(thr_samples).or_else(|| otsu_level(samples))?;

    let mut border_ok = 0u32;
    let mut border_total = 0u32;
    let mut code = 0u64;

    for cy in 0..cells {
        for cx in 0..cells {
            let is_black = samples[cy * cells + cx] <= thr;
            let is_border =
                cx < border || cy < border || cx + border >= cells || cy + border >= cells;
            if is_border {
                border_total += 1;
                border_ok += is_black as u32;
            } else if is_black {
                let idx = (cy - border) * bits + (cx - border);
                code |= 1u64 << idx;
            }
        }
    }

    let border_score = if border_total > 0 {
        border_ok as f32 / border_total as f32
    } else {
        1.0
    };
    (border_score >= min_border_score).then_some(MarkerObservation { code, border_score })
}

fn mean_side(quad: &[Point2<f32>; 4]) -> f32 {
    (0..4)
        .map(|i| (quad[(i + 1) % 4] - quad[i]).norm())
        .sum::<f32>()
        / 4.0
}

// Mean of the 3×3 block around the nearest pixel; `None` near the image edge.
fn sample_mean_3x3(img: &GrayImageView<'_>, x: f32, y: f32) -> Option<u8> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let ix = x.round() as i64;
    let iy = y.round() as i64;
    if ix < 1 || iy < 1 || ix + 1 >= img.width as i64 || iy + 1 >= img.height as i64 {
        return None;
    }

    let (ix, iy) = (ix as usize, iy as usize);
    let mut sum = 0u32;
    for yy in iy - 1..=iy + 1 {
        for xx in ix - 1..=ix + 1 {
            sum += img.get(xx, yy) as u32;
        }
    }
    Some((sum / 9) as u8)
}
