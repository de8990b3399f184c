//! JSON sheet configuration and read reports.

use std::fs;
use std::path::Path;

use marksheet_core::GrayImageView;
use serde::{Deserialize, Serialize};

use crate::{
    AnswerSheet, FiducialSet, GridGeometry, GridReader, Margin, MarkerRectifier,
    RectifierParams, SectionAnswers, SheetAnswers, SheetConfigError, SheetSection, SourceQuad,
    DEFAULT_MARK_RATIO,
};

#[derive(thiserror::Error, Debug)]
pub enum SheetIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn default_mark_ratio() -> f64 {
    DEFAULT_MARK_RATIO
}

/// One answer block in a [`SheetConfig`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub name: String,
    pub grid: GridGeometry,
    #[serde(default = "default_mark_ratio")]
    pub mark_ratio: f64,
}

/// Everything needed to build an [`AnswerSheet`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheetConfig {
    #[serde(default)]
    pub rectifier: RectifierParams,
    pub sections: Vec<SectionConfig>,
}

impl SheetConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SheetIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SheetIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Validate and assemble the sheet.
    pub fn build(&self) -> Result<AnswerSheet, SheetConfigError> {
        let rectifier = MarkerRectifier::new(self.rectifier.clone())?;
        let sections = self
            .sections
            .iter()
            .map(|s| {
                if !s.mark_ratio.is_finite() || s.mark_ratio <= 0.0 {
                    return Err(SheetConfigError::MarkRatio {
                        name: s.name.clone(),
                        ratio: s.mark_ratio,
                    });
                }
                let reader = GridReader::from_geometry(s.grid)
                    .map_err(|source| SheetConfigError::Geometry {
                        name: s.name.clone(),
                        source,
                    })?
                    .with_mark_ratio(s.mark_ratio);
                Ok(SheetSection::new(s.name.clone(), reader))
            })
            .collect::<Result<Vec<_>, SheetConfigError>>()?;
        AnswerSheet::new(rectifier, sections)
    }

    /// Simulator sickness questionnaire: 16 items × 4 levels on a
    /// 1000 × 900 sheet framed by markers 0, 1, 3, 2.
    pub fn ssq() -> Self {
        let grid = GridGeometry {
            rect_margin: Margin::new(285, 1110, 0, 60),
            rows: 16,
            cols: 4,
            cell_width: 120,
            cell_height: 60,
            cell_margin: Margin::new(15, 75, 75, 15),
        };
        Self {
            rectifier: RectifierParams::new(1000, 900, [0, 1, 3, 2]),
            sections: vec![SectionConfig {
                name: "ssq".to_string(),
                grid,
                mark_ratio: DEFAULT_MARK_RATIO,
            }],
        }
    }

    /// Motion sickness susceptibility questionnaire: two 8 × 5 blocks on a
    /// 1075 × 860 sheet framed by markers 4, 5, 7, 6.
    pub fn mssq() -> Self {
        let block = |name: &str, rect_margin: Margin| SectionConfig {
            name: name.to_string(),
            grid: GridGeometry {
                rect_margin,
                rows: 8,
                cols: 5,
                cell_width: 120,
                cell_height: 60,
                cell_margin: Margin::new(15, 75, 75, 15),
            },
            mark_ratio: DEFAULT_MARK_RATIO,
        };
        Self {
            rectifier: RectifierParams::new(1075, 860, [4, 5, 7, 6]),
            sections: vec![
                block("childhood", Margin::new(280, 1050, 0, 1260)),
                block("last_decade", Margin::new(1440, 1050, 0, 60)),
            ],
        }
    }
}

/// Outcome of reading one photo, as written by the CLI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheetReport {
    #[serde(default)]
    pub image_path: Option<String>,
    pub markers: FiducialSet,
    #[serde(default)]
    pub quad: Option<SourceQuad>,
    #[serde(default)]
    pub sections: Vec<SectionAnswers>,
}

impl SheetReport {
    /// Detect, rectify and read `image`, keeping the detected markers even
    /// when the sheet is not found.
    pub fn inspect(sheet: &AnswerSheet, image: &GrayImageView<'_>) -> Self {
        let rectifier = sheet.rectifier();
        let markers = rectifier.detect_markers(image);
        let rectified = rectifier
            .source_quad(&markers)
            .and_then(|quad| rectifier.rectify_quad(image, &quad));
        let (quad, sections) = match rectified {
            Some(r) => (Some(r.quad), sheet.read_rectified(&r.image.view())),
            None => (None, Vec::new()),
        };
        Self {
            image_path: None,
            markers,
            quad,
            sections,
        }
    }

    pub fn found(&self) -> bool {
        self.quad.is_some()
    }

    pub fn answers(&self) -> Option<SheetAnswers> {
        self.quad.map(|quad| SheetAnswers {
            quad,
            sections: self.sections.clone(),
        })
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SheetIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SheetIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn config_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sheet.json");
        let cfg = SheetConfig::mssq();
        cfg.write_json(&path).expect("write");
        let back = SheetConfig::load_json(&path).expect("load");
        assert_eq!(back, cfg);

        let sheet = back.build().expect("build");
        assert_eq!(sheet.sections().len(), 2);
        assert_eq!(sheet.rectifier().canonical_size(), (1075, 860));
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let raw = r#"{
            "sections": [
                { "name": "q", "grid": { "rows": 3, "cols": 2, "cell_width": 20, "cell_height": 10 } }
            ]
        }"#;
        let cfg: SheetConfig = serde_json::from_str(raw).expect("parse");
        assert_eq!(cfg.rectifier, RectifierParams::default());
        assert_eq!(cfg.sections[0].mark_ratio, DEFAULT_MARK_RATIO);
        assert_eq!(cfg.sections[0].grid.cell_margin, Margin::default());
        assert!(cfg.build().is_ok());
    }

    #[test]
    fn invalid_section_names_the_section() {
        let mut cfg = SheetConfig::ssq();
        cfg.sections[0].grid.cols = 0;
        let err = cfg.build().unwrap_err();
        assert!(err.to_string().starts_with("section `ssq`"), "{err}");
    }

    #[test]
    fn unusable_mark_ratio_is_refused() {
        for ratio in [-1.0, 0.0, f64::NAN, f64::INFINITY] {
            let mut cfg = SheetConfig::ssq();
            cfg.sections[0].mark_ratio = ratio;
            let err = cfg.build().unwrap_err();
            assert!(
                matches!(err, SheetConfigError::MarkRatio { ref name, .. } if name == "ssq"),
                "{ratio}: {err}"
            );
        }

        let raw = r#"{
            "sections": [
                { "name": "q", "mark_ratio": -1.0,
                  "grid": { "rows": 1, "cols": 3, "cell_width": 20, "cell_height": 10 } }
            ]
        }"#;
        let cfg: SheetConfig = serde_json::from_str(raw).expect("parse");
        assert!(cfg.build().is_err());
    }

    #[test]
    fn report_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.json");
        let report = SheetReport {
            image_path: Some("photo.jpg".into()),
            markers: FiducialSet::new(),
            quad: None,
            sections: vec![SectionAnswers {
                name: "ssq".into(),
                rows: vec![BTreeSet::from([1]), BTreeSet::new()],
            }],
        };
        report.write_json(&path).expect("write");
        let back = SheetReport::load_json(&path).expect("load");
        assert_eq!(back, report);
        assert!(!back.found());
    }

    #[test]
    fn blank_photo_reports_nothing_found() {
        let sheet = SheetConfig::ssq().build().expect("build");
        let photo = marksheet_core::GrayImage::filled(400, 300, 230);
        let report = SheetReport::inspect(&sheet, &photo.view());
        assert!(report.markers.is_empty());
        assert!(!report.found());
        assert!(report.sections.is_empty());
        assert!(report.answers().is_none());
    }
}
