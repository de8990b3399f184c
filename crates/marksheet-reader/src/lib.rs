//! Answer sheet reading on top of fiducial rectification.
//!
//! Two building blocks:
//! - [`MarkerRectifier`] finds four configured ArUco markers, warps the photo
//!   onto a fixed canonical rectangle and projects masks back;
//! - [`GridReader`] owns the cell layout of one answer block, binarizes each
//!   cell with its own Otsu threshold and marks cells that stand out from
//!   their row.
//!
//! [`AnswerSheet`] combines one rectifier with several named blocks, and
//! [`SheetConfig`] loads the whole setup from JSON.
//!
//! ```no_run
//! use marksheet_core::GrayImage;
//! use marksheet_reader::SheetConfig;
//!
//! let sheet = SheetConfig::ssq().build().unwrap();
//! let photo = GrayImage::filled(1600, 1200, 255);
//! if let Some(answers) = sheet.read(&photo.view()) {
//!     println!("{:?}", answers.single_choice());
//! }
//! ```

mod geometry;
mod grid;
mod io;
mod margin;
mod rectifier;
mod sheet;

pub use geometry::{GeometryError, GridGeometry};
pub use grid::{Answers, GridReader, DEFAULT_MARK_RATIO};
pub use io::{SectionConfig, SheetConfig, SheetIoError, SheetReport};
pub use margin::Margin;
pub use rectifier::{
    FiducialSet, MarkerRectifier, Rectified, RectifierError, RectifierParams, SourceQuad,
};
pub use sheet::{AnswerSheet, SectionAnswers, SheetAnswers, SheetConfigError, SheetSection};
