//! Per-cell binarization and mark classification.

use std::collections::BTreeSet;

use log::debug;
use marksheet_core::{
    otsu_level, resize_gray, GrayImage, GrayImageView, Interpolation, PixelRect,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{GeometryError, GridGeometry, Margin};

/// A cell is marked when its binary mean exceeds the row average by this factor.
pub const DEFAULT_MARK_RATIO: f64 = 1.4;

/// Outline width used by [`GridReader::highlight_all_cells`].
const OUTLINE_PX: usize = 2;

/// Ink value for debug drawings.
const DEBUG_INK: u8 = 0;

/// Column indices marked in each row, top to bottom.
pub type Answers = Vec<BTreeSet<usize>>;

/// Reads one rectangular block of answer cells from a canonical sheet image.
///
/// Stateless between calls; share freely across threads.
#[derive(Clone, Debug, PartialEq)]
pub struct GridReader {
    geometry: GridGeometry,
    mark_ratio: f64,
}

impl GridReader {
    pub fn new(
        rect_margin: Margin,
        rows: usize,
        cols: usize,
        cell_width: usize,
        cell_height: usize,
        cell_margin: Margin,
    ) -> Result<Self, GeometryError> {
        GridGeometry::new(rect_margin, rows, cols, cell_width, cell_height, cell_margin)
            .map(Self::from_valid)
    }

    pub fn from_geometry(geometry: GridGeometry) -> Result<Self, GeometryError> {
        geometry.validate()?;
        Ok(Self::from_valid(geometry))
    }

    fn from_valid(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            mark_ratio: DEFAULT_MARK_RATIO,
        }
    }

    /// Replace the row-relative mark ratio.
    pub fn with_mark_ratio(mut self, ratio: f64) -> Self {
        self.mark_ratio = ratio;
        self
    }

    #[inline]
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    #[inline]
    pub fn mark_ratio(&self) -> f64 {
        self.mark_ratio
    }

    #[inline]
    pub fn canvas_size(&self) -> (usize, usize) {
        self.geometry.canvas_size()
    }

    #[inline]
    pub fn cell_bounding_box(&self, row: usize, col: usize) -> PixelRect {
        self.geometry.cell_bounding_box(row, col)
    }

    /// Scale `image` to exactly the canvas size.
    pub fn resize(&self, image: &GrayImageView<'_>) -> GrayImage {
        let (w, h) = self.canvas_size();
        resize_gray(image, w, h, Interpolation::Bilinear)
    }

    /// Crop the cell area out of a canvas-sized image.
    pub fn extract_region(&self, resized: &GrayImageView<'_>) -> GrayImage {
        resized.crop(self.geometry.region_rect())
    }

    /// Inverted Otsu per cell: dark pixels become 255, the rest 0.
    ///
    /// Every cell gets its own threshold; pixels outside cell boxes stay 0. A
    /// single-valued cell uses threshold 0, so only pure black counts as ink.
    pub fn binarize(&self, region: &GrayImageView<'_>) -> GrayImage {
        let mut out = GrayImage::new(region.width, region.height);
        for row in 0..self.geometry.rows {
            for col in 0..self.geometry.cols {
                let rect = self.geometry.region_cell_box(row, col);
                let mut cell = region.crop(rect);
                let t = otsu_level(&cell.data).unwrap_or(0);
                for v in cell.data.iter_mut() {
                    *v = if *v <= t { 255 } else { 0 };
                }
                out.paste(&cell, rect.x, rect.y);
            }
        }
        out
    }

    /// Marked columns of `row` in a binarized region.
    pub fn analyze_row(&self, binary: &GrayImageView<'_>, row: usize) -> BTreeSet<usize> {
        let means: Vec<f64> = (0..self.geometry.cols)
            .map(|col| binary.mean_in(self.geometry.region_cell_box(row, col)))
            .collect();
        let row_threshold = means.iter().sum::<f64>() / means.len().max(1) as f64;

        means
            .iter()
            .enumerate()
            .filter(|&(_, &mean)| self.is_marked(mean, row_threshold))
            .map(|(col, _)| col)
            .collect()
    }

    /// Strictly above `row_threshold * mark_ratio`; equality is not a mark.
    #[inline]
    pub fn is_marked(&self, mean: f64, row_threshold: f64) -> bool {
        mean > row_threshold * self.mark_ratio
    }

    /// Resize, crop, binarize and classify every row.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, image), fields(w = image.width, h = image.height))
    )]
    pub fn read(&self, image: &GrayImageView<'_>) -> Answers {
        let resized = self.resize(image);
        let region = self.extract_region(&resized.view());
        let binary = self.binarize(&region.view());
        let answers: Answers = (0..self.geometry.rows)
            .map(|row| self.analyze_row(&binary.view(), row))
            .collect();

        let ambiguous = answers.iter().filter(|r| r.len() > 1).count();
        if ambiguous > 0 {
            debug!("{ambiguous} row(s) with more than one mark");
        }
        answers
    }

    /// Canvas-sized mask: 1 inside each marked cell box, 0 elsewhere.
    ///
    /// Rows or columns outside the grid are ignored.
    pub fn create_mask(&self, marked: &[BTreeSet<usize>]) -> GrayImage {
        let (w, h) = self.canvas_size();
        let mut mask = GrayImage::new(w, h);
        for (row, cols) in marked.iter().enumerate() {
            for &col in cols {
                if self.geometry.contains_cell(row, col) {
                    mask.fill_rect(self.cell_bounding_box(row, col), 1);
                }
            }
        }
        mask
    }

    /// Outline every cell box; returned at the input's size.
    pub fn highlight_all_cells(&self, image: &GrayImageView<'_>) -> GrayImage {
        self.draw_cells(image, |canvas, row, col| {
            canvas.draw_rect_outline(self.cell_bounding_box(row, col), OUTLINE_PX, DEBUG_INK);
        })
    }

    /// Fill the boxes of the marked cells; returned at the input's size.
    pub fn fill_marked_cells(
        &self,
        image: &GrayImageView<'_>,
        marked: &[BTreeSet<usize>],
    ) -> GrayImage {
        self.draw_cells(image, |canvas, row, col| {
            let hit = marked.get(row).is_some_and(|cols| cols.contains(&col));
            if hit {
                canvas.fill_rect(self.cell_bounding_box(row, col), DEBUG_INK);
            }
        })
    }

    fn draw_cells(
        &self,
        image: &GrayImageView<'_>,
        mut draw: impl FnMut(&mut GrayImage, usize, usize),
    ) -> GrayImage {
        let mut canvas = self.resize(image);
        for row in 0..self.geometry.rows {
            for col in 0..self.geometry.cols {
                draw(&mut canvas, row, col);
            }
        }
        resize_gray(&canvas.view(), image.width, image.height, Interpolation::Bilinear)
    }
}
