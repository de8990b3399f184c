//! Fiducial-based perspective rectification and its inverse overlay.

mod error;
mod params;
mod pipeline;
mod result;

pub use error::RectifierError;
pub use params::RectifierParams;
pub use pipeline::MarkerRectifier;
pub use result::{FiducialSet, Rectified, SourceQuad};
