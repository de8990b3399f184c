use std::collections::BTreeMap;

use marksheet_aruco::MarkerDetection;
use marksheet_core::{GrayImage, Homography};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Detected markers of one frame: id → corners (TL, TR, BR, BL as printed).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FiducialSet {
    markers: BTreeMap<u32, [Point2<f32>; 4]>,
}

impl FiducialSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the last corners given for an id.
    pub fn from_detections(detections: &[MarkerDetection]) -> Self {
        let mut set = Self::new();
        for d in detections {
            set.insert(d.id, d.corners);
        }
        set
    }

    pub fn insert(&mut self, id: u32, corners: [Point2<f32>; 4]) {
        self.markers.insert(id, corners);
    }

    #[inline]
    pub fn get(&self, id: u32) -> Option<&[Point2<f32>; 4]> {
        self.markers.get(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.markers.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[Point2<f32>; 4])> + '_ {
        self.markers.iter().map(|(&id, c)| (id, c))
    }
}

/// Photo-space corners of the canonical sheet, clockwise from top-left.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceQuad {
    pub corners: [Point2<f32>; 4],
}

impl SourceQuad {
    pub fn new(corners: [Point2<f32>; 4]) -> Self {
        Self { corners }
    }
}

/// Output of a successful rectification.
#[derive(Clone, Debug)]
pub struct Rectified {
    /// Canonical-size grayscale sheet.
    pub image: GrayImage,
    pub quad: SourceQuad,
    /// Maps canonical pixel coordinates into the photo.
    pub h_img_from_canon: Homography,
}
