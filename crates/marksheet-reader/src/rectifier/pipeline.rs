use std::collections::HashSet;

use log::{debug, warn};
use marksheet_aruco::MarkerDetector;
use marksheet_core::{
    homography_from_4pt, resize_gray, warp_perspective_gray, GrayImage, GrayImageView,
    Interpolation, Rgb, RgbImage,
};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{FiducialSet, Rectified, RectifierError, RectifierParams, SourceQuad};

/// Maps photos onto a fixed canonical rectangle using four fiducials, and
/// projects canonical masks back onto the photo.
#[derive(Clone, Debug)]
pub struct MarkerRectifier {
    params: RectifierParams,
    detector: MarkerDetector,
}

impl MarkerRectifier {
    pub fn new(params: RectifierParams) -> Result<Self, RectifierError> {
        if params.canonical_width == 0 || params.canonical_height == 0 {
            return Err(RectifierError::EmptyCanonical {
                width: params.canonical_width,
                height: params.canonical_height,
            });
        }
        let mut seen = HashSet::new();
        for &id in &params.preset_ids {
            if !seen.insert(id) {
                return Err(RectifierError::DuplicatePresetId(id));
            }
        }
        if let Some(&c) = params.preset_corners.iter().find(|&&c| c > 3) {
            return Err(RectifierError::CornerOutOfRange(c));
        }

        let detector = MarkerDetector::new(params.detector.clone())?;
        Ok(Self { params, detector })
    }

    #[inline]
    pub fn params(&self) -> &RectifierParams {
        &self.params
    }

    /// `(width, height)` of every rectified image.
    #[inline]
    pub fn canonical_size(&self) -> (usize, usize) {
        (self.params.canonical_width, self.params.canonical_height)
    }

    /// Outer pixel edges of the canonical image, clockwise from top-left.
    pub fn canonical_corners(&self) -> [Point2<f32>; 4] {
        let (w, h) = self.canonical_size();
        let (x1, y1) = (w as f32 - 0.5, h as f32 - 0.5);
        [
            Point2::new(-0.5, -0.5),
            Point2::new(x1, -0.5),
            Point2::new(x1, y1),
            Point2::new(-0.5, y1),
        ]
    }

    /// All decodable markers in `image`.
    pub fn detect_markers(&self, image: &GrayImageView<'_>) -> FiducialSet {
        FiducialSet::from_detections(&self.detector.detect(image))
    }

    /// Pick the preset corner of every preset marker; `None` unless all four
    /// are present.
    pub fn source_quad(&self, fiducials: &FiducialSet) -> Option<SourceQuad> {
        let mut corners = [Point2::origin(); 4];
        for (k, (&id, &corner)) in self
            .params
            .preset_ids
            .iter()
            .zip(&self.params.preset_corners)
            .enumerate()
        {
            corners[k] = fiducials.get(id)?[corner];
        }
        Some(SourceQuad::new(corners))
    }

    /// Detect the fiducials and warp the sheet to the canonical rectangle.
    ///
    /// `None` when any preset marker is missing.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image), fields(w = image.width, h = image.height))
    )]
    pub fn rectify(&self, image: &GrayImageView<'_>) -> Option<Rectified> {
        let fiducials = self.detect_markers(image);
        debug!("found markers {:?}", fiducials.ids().collect::<Vec<_>>());

        let Some(quad) = self.source_quad(&fiducials) else {
            let missing: Vec<u32> = self
                .params
                .preset_ids
                .iter()
                .copied()
                .filter(|&id| fiducials.get(id).is_none())
                .collect();
            warn!("sheet not found, missing markers {missing:?}");
            return None;
        };
        self.rectify_quad(image, &quad)
    }

    /// Warp using an already known quad.
    pub fn rectify_quad(&self, image: &GrayImageView<'_>, quad: &SourceQuad) -> Option<Rectified> {
        let h_img_from_canon = homography_from_4pt(&self.canonical_corners(), &quad.corners)?;
        let (w, h) = self.canonical_size();
        let rectified = warp_perspective_gray(
            image,
            &h_img_from_canon,
            w,
            h,
            self.params.interpolation,
            0,
        );
        Some(Rectified {
            image: rectified,
            quad: *quad,
            h_img_from_canon,
        })
    }

    /// Paint `color` over `base` wherever any canonical mask is non-zero.
    ///
    /// Masks are resized to the canonical size (nearest) when needed, warped
    /// into photo space through `quad`, and OR-ed. `alpha >= 1` overwrites;
    /// smaller values blend `base * (1 - alpha) + color * alpha`. A degenerate
    /// quad leaves the image unchanged.
    pub fn overlay_mask(
        &self,
        base: &RgbImage,
        masks: &[GrayImage],
        quad: &SourceQuad,
        alpha: f32,
        color: Rgb,
    ) -> RgbImage {
        let mut out = base.clone();
        let Some(h_canon_from_img) = homography_from_4pt(&quad.corners, &self.canonical_corners())
        else {
            warn!("degenerate source quad, overlay skipped");
            return out;
        };

        let (cw, ch) = self.canonical_size();
        let mut coverage = vec![false; base.width * base.height];
        for mask in masks {
            let sized;
            let mask = if (mask.width, mask.height) == (cw, ch) {
                mask
            } else {
                sized = resize_gray(&mask.view(), cw, ch, Interpolation::Nearest);
                &sized
            };
            let warped = warp_perspective_gray(
                &mask.view(),
                &h_canon_from_img,
                base.width,
                base.height,
                Interpolation::Nearest,
                self.params.mask_border,
            );
            for (c, &v) in coverage.iter_mut().zip(&warped.data) {
                *c |= v != 0;
            }
        }

        let alpha = alpha.clamp(0.0, 1.0);
        for (px, _) in out
            .data
            .chunks_exact_mut(3)
            .zip(&coverage)
            .filter(|(_, covered)| **covered)
        {
            if alpha >= 1.0 {
                px.copy_from_slice(&color);
            } else {
                for (b, &c) in px.iter_mut().zip(&color) {
                    *b = (*b as f32 * (1.0 - alpha) + c as f32 * alpha) as u8;
                }
            }
        }
        out
    }
}
