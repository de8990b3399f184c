use marksheet_aruco::MarkerDetectorParams;
use marksheet_core::Interpolation;
use serde::{Deserialize, Serialize};

/// Configuration for [`super::MarkerRectifier`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifierParams {
    /// Width of the rectified sheet, in pixels.
    pub canonical_width: usize,
    /// Height of the rectified sheet, in pixels.
    pub canonical_height: usize,
    /// Marker ids placed at the sheet's TL, TR, BR, BL (clockwise).
    pub preset_ids: [u32; 4],
    /// Which corner (0 = TL … 3 = BL, in the marker's own frame) each preset
    /// marker contributes to the source quad.
    pub preset_corners: [usize; 4],
    /// Interpolation for the forward warp.
    pub interpolation: Interpolation,
    /// Mask value assumed outside the canonical rectangle when overlaying.
    pub mask_border: u8,
    pub detector: MarkerDetectorParams,
}

impl Default for RectifierParams {
    fn default() -> Self {
        Self {
            canonical_width: 1000,
            canonical_height: 900,
            preset_ids: [0, 1, 3, 2],
            // Inner corners: each marker's corner facing the sheet centre.
            preset_corners: [2, 3, 0, 1],
            interpolation: Interpolation::Bilinear,
            mask_border: 0,
            detector: MarkerDetectorParams::default(),
        }
    }
}

impl RectifierParams {
    /// Canonical size and ids, default corners and detector.
    pub fn new(canonical_width: usize, canonical_height: usize, preset_ids: [u32; 4]) -> Self {
        Self {
            canonical_width,
            canonical_height,
            preset_ids,
            ..Self::default()
        }
    }
}
