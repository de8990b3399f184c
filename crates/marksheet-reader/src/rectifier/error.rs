use marksheet_aruco::DetectorError;

/// Configuration errors raised when building a [`super::MarkerRectifier`].
#[derive(thiserror::Error, Debug)]
pub enum RectifierError {
    #[error("canonical rectangle must be non-empty (got {width}x{height})")]
    EmptyCanonical { width: usize, height: usize },
    #[error("preset marker id {0} is listed more than once")]
    DuplicatePresetId(u32),
    #[error("preset corner index {0} is out of range 0..=3")]
    CornerOutOfRange(usize),
    #[error(transparent)]
    Detector(#[from] DetectorError),
}
