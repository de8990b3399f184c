//! High-level facade crate for the `marksheet-*` workspace.
//!
//! This crate provides:
//! - stable re-exports of the underlying crates
//! - the length-prefixed frame codec used by capture devices ([`frame`])
//! - (feature `image`) conversions from `image` buffers and end-to-end
//!   helpers that read a decoded photo in one call.
//!
//! ## Quickstart
//!
//! ```no_run
//! use marksheet::{detect, SheetConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("sheet.jpg")?;
//! let sheet = SheetConfig::ssq().build()?;
//!
//! match detect::read_sheet(&img, &sheet) {
//!     Some(answers) => println!("{:?}", answers.single_choice()),
//!     None => println!("sheet not found"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `marksheet::core`: image buffers, homographies, warps, thresholds, logger.
//! - `marksheet::aruco`: ArUco dictionary, marker detection and rendering.
//! - `marksheet::reader`: rectifier, grid reader, answer sheets, JSON config.
//! - `marksheet::frame`: 4-byte little-endian length framing.
//! - `marksheet::convert` / `marksheet::detect` (feature `image`).

pub use marksheet_aruco as aruco;
pub use marksheet_core as core;
pub use marksheet_reader as reader;

pub use marksheet_reader::{
    AnswerSheet, GridReader, Margin, MarkerRectifier, RectifierParams, SheetAnswers, SheetConfig,
    SheetReport,
};

pub mod frame;

#[cfg(feature = "image")]
pub mod convert;
#[cfg(feature = "image")]
pub mod detect;
