//! Grid layout over the canonical sheet.

use marksheet_core::PixelRect;
use serde::{Deserialize, Serialize};

use crate::Margin;

/// Rejected grid layouts.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("grid needs at least one row and one column (got {rows}x{cols})")]
    EmptyGrid { rows: usize, cols: usize },
    #[error("cell size must be non-zero (got {width}x{height})")]
    EmptyCell { width: usize, height: usize },
}

/// Rows × columns of equal cells placed inside a rect margin.
///
/// Each cell pitch is `cell_margin.left + cell_width + cell_margin.right` wide
/// and `cell_margin.top + cell_height + cell_margin.bottom` tall; the mark
/// itself is the `cell_width × cell_height` rectangle inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridGeometry {
    #[serde(default)]
    pub rect_margin: Margin,
    pub rows: usize,
    pub cols: usize,
    pub cell_width: usize,
    pub cell_height: usize,
    #[serde(default)]
    pub cell_margin: Margin,
}

impl GridGeometry {
    pub fn new(
        rect_margin: Margin,
        rows: usize,
        cols: usize,
        cell_width: usize,
        cell_height: usize,
        cell_margin: Margin,
    ) -> Result<Self, GeometryError> {
        let g = Self {
            rect_margin,
            rows,
            cols,
            cell_width,
            cell_height,
            cell_margin,
        };
        g.validate()?;
        Ok(g)
    }

    /// Check a deserialized layout.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GeometryError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.cell_width == 0 || self.cell_height == 0 {
            return Err(GeometryError::EmptyCell {
                width: self.cell_width,
                height: self.cell_height,
            });
        }
        Ok(())
    }

    /// Cell pitch `(width, height)`, margins included.
    #[inline]
    pub fn cell_size(&self) -> (usize, usize) {
        (
            self.cell_margin.horizontal() + self.cell_width,
            self.cell_margin.vertical() + self.cell_height,
        )
    }

    /// Size every input is resized to before reading.
    pub fn canvas_size(&self) -> (usize, usize) {
        let (pw, ph) = self.cell_size();
        (
            self.rect_margin.horizontal() + self.cols * pw,
            self.rect_margin.vertical() + self.rows * ph,
        )
    }

    /// The rows × cols area of the canvas, rect margin excluded.
    pub fn region_rect(&self) -> PixelRect {
        let (pw, ph) = self.cell_size();
        PixelRect::new(
            self.rect_margin.left,
            self.rect_margin.top,
            self.cols * pw,
            self.rows * ph,
        )
    }

    /// Full pitch of cell `(row, col)`, relative to the region.
    pub fn cell_pitch_box(&self, row: usize, col: usize) -> PixelRect {
        let (pw, ph) = self.cell_size();
        PixelRect::new(col * pw, row * ph, pw, ph)
    }

    /// Mark rectangle of cell `(row, col)`, relative to the region.
    pub fn region_cell_box(&self, row: usize, col: usize) -> PixelRect {
        let pitch = self.cell_pitch_box(row, col);
        PixelRect::new(
            pitch.x + self.cell_margin.left,
            pitch.y + self.cell_margin.top,
            self.cell_width,
            self.cell_height,
        )
    }

    /// Mark rectangle of cell `(row, col)` in canvas coordinates.
    ///
    /// Indices past the grid are not checked; the box simply extrapolates.
    pub fn cell_bounding_box(&self, row: usize, col: usize) -> PixelRect {
        self.region_cell_box(row, col)
            .offset(self.rect_margin.left, self.rect_margin.top)
    }

    #[inline]
    pub fn contains_cell(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }
}
