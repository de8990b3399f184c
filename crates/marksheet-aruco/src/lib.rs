//! ArUco fiducial markers for answer sheets.
//!
//! This crate covers:
//! - an embedded `DICT_4X4_50` dictionary (OpenCV-compatible bit layout),
//! - matching observed codes against it under all four rotations,
//! - decoding a marker from an image quadrilateral,
//! - finding marker quadrilaterals in a full grayscale photo,
//! - rendering printable markers.
//!
//! Bits are packed row-major with **black = 1**.

pub mod builtins;
mod detect;
mod dictionary;
mod draw;
mod matcher;
mod quads;
mod scan;

pub use detect::{DetectorError, MarkerDetector, MarkerDetectorParams};
pub use dictionary::Dictionary;
pub use draw::draw_marker;
pub use matcher::{rotate_code_u64, Match, Matcher};
pub use scan::{decode_marker_in_quad, MarkerDetection, QuadDecodeConfig};
