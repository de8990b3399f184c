//! Full-image fiducial detection.

use std::collections::BTreeMap;

use log::debug;
use marksheet_core::{adaptive_threshold, GrayImageView};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::builtins::builtin_dictionary;
use crate::quads::{find_quads, QuadLimits};
use crate::scan::{decode_marker_in_quad, MarkerDetection, QuadDecodeConfig};
use crate::Matcher;

/// Errors returned when building a [`MarkerDetector`].
#[derive(thiserror::Error, Debug)]
pub enum DetectorError {
    #[error("unknown dictionary `{0}`")]
    UnknownDictionary(String),
    #[error("invalid detector parameter: {0}")]
    InvalidParams(&'static str),
}

/// Configuration for [`MarkerDetector`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerDetectorParams {
    /// Built-in dictionary name.
    pub dictionary: String,
    /// Half window of the mean-C threshold; `0` picks `max(15, min(w, h) / 8)`.
    pub threshold_radius: usize,
    /// A pixel is dark when it is this much below its local mean.
    pub threshold_offset: u8,
    /// Shortest accepted blob bounding-box side, in pixels.
    pub min_side_px: usize,
    /// Longest accepted blob side as a fraction of the shorter image side.
    pub max_side_frac: f32,
    /// Largest accepted bounding-box aspect ratio.
    pub max_aspect: f32,
    /// Accepted range of dark pixels per bounding-box pixel.
    pub min_fill: f32,
    pub max_fill: f32,
    /// Minimum ratio of fitted quad area to blob hull area.
    pub min_quad_fill: f32,
    /// Bit errors tolerated when matching, capped by the dictionary.
    pub max_hamming: u8,
    pub decode: QuadDecodeConfig,
}

impl Default for MarkerDetectorParams {
    fn default() -> Self {
        Self {
            dictionary: "DICT_4X4_50".to_string(),
            threshold_radius: 0,
            threshold_offset: 7,
            min_side_px: 20,
            max_side_frac: 0.5,
            max_aspect: 3.0,
            min_fill: 0.2,
            max_fill: 0.95,
            min_quad_fill: 0.85,
            max_hamming: 1,
            decode: QuadDecodeConfig::default(),
        }
    }
}

/// Finds and decodes ArUco markers anywhere in a grayscale image.
#[derive(Clone, Debug)]
pub struct MarkerDetector {
    params: MarkerDetectorParams,
    matcher: Matcher,
}

impl MarkerDetector {
    pub fn new(params: MarkerDetectorParams) -> Result<Self, DetectorError> {
        let dict = builtin_dictionary(&params.dictionary)
            .ok_or_else(|| DetectorError::UnknownDictionary(params.dictionary.clone()))?;
        if !params.max_side_frac.is_finite() || params.max_side_frac <= 0.0 {
            return Err(DetectorError::InvalidParams("max_side_frac must be > 0"));
        }
        if !params.max_aspect.is_finite() || params.max_aspect < 1.0 {
            return Err(DetectorError::InvalidParams("max_aspect must be >= 1"));
        }
        let matcher = Matcher::new(dict, params.max_hamming);
        Ok(Self { params, matcher })
    }

    #[inline]
    pub fn params(&self) -> &MarkerDetectorParams {
        &self.params
    }

    #[inline]
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Detect markers, keeping the best-scoring detection per id, sorted by id.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, image), fields(w = image.width, h = image.height))
    )]
    pub fn detect(&self, image: &GrayImageView<'_>) -> Vec<MarkerDetection> {
        let p = &self.params;
        let short_side = image.width.min(image.height);
        if short_side == 0 {
            return Vec::new();
        }

        let radius = if p.threshold_radius == 0 {
            (short_side / 8).max(15)
        } else {
            p.threshold_radius
        };
        let binary = adaptive_threshold(image, radius, p.threshold_offset);

        let limits = QuadLimits {
            min_side: p.min_side_px,
            max_side: ((p.max_side_frac * short_side as f32) as usize).max(p.min_side_px),
            max_aspect: p.max_aspect,
            min_fill: p.min_fill,
            max_fill: p.max_fill,
            min_quad_fill: p.min_quad_fill,
        };
        let quads = find_quads(&binary, &limits);

        let mut best: BTreeMap<u32, MarkerDetection> = BTreeMap::new();
        for quad in &quads {
            let Some(det) = decode_marker_in_quad(image, quad, &p.decode, &self.matcher) else {
                continue;
            };
            match best.get(&det.id) {
                Some(prev) if prev.score >= det.score => {}
                _ => {
                    best.insert(det.id, det);
                }
            }
        }

        debug!(
            "marker detection: {} candidate quads, ids {:?}",
            quads.len(),
            best.keys().collect::<Vec<_>>()
        );
        best.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::DICT_4X4_50;
    use crate::draw_marker;
    use marksheet_core::{
        homography_from_4pt, warp_perspective_gray, GrayImage, Interpolation, PixelRect,
    };
    use nalgebra::Point2;

    fn page() -> GrayImage {
        let mut page = GrayImage::filled(400, 300, 235);
        for (id, x, y) in [(0u32, 30usize, 30usize), (7, 280, 40), (21, 150, 170)] {
            let m = draw_marker(&DICT_4X4_50, id, 72).expect("marker");
            page.paste(&m, x, y);
        }
        // A filled answer box that must not decode.
        page.fill_rect(PixelRect::new(40, 200, 60, 36), 15);
        page
    }

    #[test]
    fn finds_upright_markers_with_corners() {
        let img = page();
        let det = MarkerDetector::new(MarkerDetectorParams::default()).expect("detector");
        let found = det.detect(&img.view());
        let ids: Vec<u32> = found.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![0, 7, 21]);

        let tl = found[0].corners[0];
        let br = found[0].corners[2];
        assert!((tl.x - 29.5).abs() < 1.0 && (tl.y - 29.5).abs() < 1.0, "{tl:?}");
        assert!((br.x - 101.5).abs() < 1.0 && (br.y - 101.5).abs() < 1.0, "{br:?}");
    }

    #[test]
    fn finds_markers_under_perspective() {
        let img = page();
        let src = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(400.0, 0.0),
            Point2::new(400.0, 300.0),
            Point2::new(0.0, 300.0),
        ];
        let dst = [
            Point2::new(30.0_f32, 20.0),
            Point2::new(450.0, 45.0),
            Point2::new(430.0, 340.0),
            Point2::new(15.0, 320.0),
        ];
        let h_photo_from_page = homography_from_4pt(&src, &dst).expect("homography");
        let h_page_from_photo = h_photo_from_page.inverse().expect("inverse");
        let photo = warp_perspective_gray(
            &img.view(),
            &h_page_from_photo,
            480,
            370,
            Interpolation::Bilinear,
            235,
        );

        let det = MarkerDetector::new(MarkerDetectorParams::default()).expect("detector");
        let found = det.detect(&photo.view());
        let ids: Vec<u32> = found.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![0, 7, 21]);

        // Printed top-left of marker 0 lands near its projected position.
        let expected = h_photo_from_page.apply(Point2::new(29.5, 29.5));
        let got = found[0].corners[0];
        assert!((got - expected).norm() < 2.0, "{got:?} vs {expected:?}");
    }

    #[test]
    fn unknown_dictionary_is_an_error() {
        let params = MarkerDetectorParams {
            dictionary: "DICT_APRILTAG_36h11".into(),
            ..MarkerDetectorParams::default()
        };
        assert!(matches!(
            MarkerDetector::new(params),
            Err(DetectorError::UnknownDictionary(_))
        ));
    }

    #[test]
    fn params_fill_missing_fields_from_defaults() {
        let p: MarkerDetectorParams =
            serde_json::from_str(r#"{ "min_side_px": 32 }"#).expect("parse");
        assert_eq!(p.min_side_px, 32);
        assert_eq!(p.threshold_offset, 7);
        assert_eq!(p.decode, QuadDecodeConfig::default());
    }
}
