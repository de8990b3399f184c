//! Several answer blocks on one fiducial-framed sheet.

use std::collections::{BTreeSet, HashSet};

use marksheet_core::{GrayImage, GrayImageView, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::{Answers, GeometryError, GridReader, MarkerRectifier, RectifierError, SourceQuad};

#[derive(thiserror::Error, Debug)]
pub enum SheetConfigError {
    #[error("sheet has no answer sections")]
    NoSections,
    #[error("section name `{0}` is used twice")]
    DuplicateSection(String),
    #[error("section `{name}`: {source}")]
    Geometry {
        name: String,
        #[source]
        source: GeometryError,
    },
    #[error("section `{name}`: mark ratio must be finite and positive (got {ratio})")]
    MarkRatio { name: String, ratio: f64 },
    #[error(transparent)]
    Rectifier(#[from] RectifierError),
}

/// One named block of cells.
#[derive(Clone, Debug)]
pub struct SheetSection {
    pub name: String,
    pub reader: GridReader,
}

impl SheetSection {
    pub fn new(name: impl Into<String>, reader: GridReader) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }
}

/// Answers of one section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionAnswers {
    pub name: String,
    pub rows: Answers,
}

impl SectionAnswers {
    /// `Some(col)` for rows with exactly one mark, `None` for blank or
    /// multi-marked rows.
    pub fn single_choice(&self) -> Vec<Option<usize>> {
        self.rows.iter().map(single).collect()
    }
}

fn single(row: &BTreeSet<usize>) -> Option<usize> {
    match (row.len(), row.first()) {
        (1, Some(&c)) => Some(c),
        _ => None,
    }
}

/// Result of reading a whole sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheetAnswers {
    pub quad: SourceQuad,
    pub sections: Vec<SectionAnswers>,
}

impl SheetAnswers {
    /// All rows of all sections, in section order.
    pub fn concatenated(&self) -> Answers {
        self.sections
            .iter()
            .flat_map(|s| s.rows.iter().cloned())
            .collect()
    }

    pub fn single_choice(&self) -> Vec<Option<usize>> {
        self.sections
            .iter()
            .flat_map(|s| s.rows.iter().map(single))
            .collect()
    }

    pub fn section(&self, name: &str) -> Option<&SectionAnswers> {
        self.sections.iter().find(|s| s.name == name)
    }
}

/// A rectifier plus the answer blocks printed on its canonical sheet.
#[derive(Clone, Debug)]
pub struct AnswerSheet {
    rectifier: MarkerRectifier,
    sections: Vec<SheetSection>,
}

impl AnswerSheet {
    pub fn new(
        rectifier: MarkerRectifier,
        sections: Vec<SheetSection>,
    ) -> Result<Self, SheetConfigError> {
        if sections.is_empty() {
            return Err(SheetConfigError::NoSections);
        }
        let mut names = HashSet::new();
        for s in &sections {
            if !names.insert(s.name.as_str()) {
                return Err(SheetConfigError::DuplicateSection(s.name.clone()));
            }
        }
        Ok(Self {
            rectifier,
            sections,
        })
    }

    #[inline]
    pub fn rectifier(&self) -> &MarkerRectifier {
        &self.rectifier
    }

    #[inline]
    pub fn sections(&self) -> &[SheetSection] {
        &self.sections
    }

    /// Rectify the photo and read every section; `None` if the sheet is not
    /// found.
    pub fn read(&self, image: &GrayImageView<'_>) -> Option<SheetAnswers> {
        let rectified = self.rectifier.rectify(image)?;
        Some(SheetAnswers {
            quad: rectified.quad,
            sections: self.read_rectified(&rectified.image.view()),
        })
    }

    /// Read every section from an already rectified sheet.
    pub fn read_rectified(&self, canonical: &GrayImageView<'_>) -> Vec<SectionAnswers> {
        self.sections
            .iter()
            .map(|s| SectionAnswers {
                name: s.name.clone(),
                rows: s.reader.read(canonical),
            })
            .collect()
    }

    /// One mask per section, matched to `answers` by name.
    pub fn masks(&self, answers: &[SectionAnswers]) -> Vec<GrayImage> {
        self.sections
            .iter()
            .filter_map(|s| {
                let a = answers.iter().find(|a| a.name == s.name)?;
                Some(s.reader.create_mask(&a.rows))
            })
            .collect()
    }

    /// Paint every marked cell of every section back onto the photo.
    pub fn overlay(
        &self,
        base: &RgbImage,
        answers: &SheetAnswers,
        alpha: f32,
        color: Rgb,
    ) -> RgbImage {
        let masks = self.masks(&answers.sections);
        self.rectifier
            .overlay_mask(base, &masks, &answers.quad, alpha, color)
    }
}
