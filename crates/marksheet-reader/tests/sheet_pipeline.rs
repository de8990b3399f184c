use std::collections::BTreeSet;

use approx::assert_abs_diff_eq;
use marksheet_aruco::{builtins::DICT_4X4_50, draw_marker};
use marksheet_core::{
    homography_from_4pt, resize_gray, warp_perspective_gray, GrayImage, Interpolation,
    PixelRect, RgbImage,
};
use marksheet_reader::{
    AnswerSheet, GridReader, Margin, MarkerRectifier, RectifierParams, SheetConfig, SheetSection,
};
use nalgebra::Point2;

const PAPER: u8 = 240;
const INK: u8 = 20;
const MARKER_PX: usize = 96;

// 5 × 4 block whose canvas is exactly the 480 × 360 canonical sheet.
fn block_reader() -> GridReader {
    GridReader::new(
        Margin::new(30, 40, 40, 30),
        5,
        4,
        60,
        36,
        Margin::new(12, 20, 20, 12),
    )
    .expect("reader")
}

fn marks() -> Vec<BTreeSet<usize>> {
    vec![
        BTreeSet::from([1]),
        BTreeSet::new(),
        BTreeSet::from([3]),
        BTreeSet::from([0]),
        BTreeSet::from([2]),
    ]
}

/// Flat 720 × 600 printout: markers 0, 1, 3, 2 clockwise from the top-left,
/// with their inner corners framing the canonical area at (120, 120).
fn printed_sheet(reader: &GridReader, marked: &[BTreeSet<usize>]) -> GrayImage {
    let mut sheet = GrayImage::filled(720, 600, PAPER);
    for (id, x, y) in [(0u32, 24, 24), (1, 600, 24), (3, 600, 480), (2, 24, 480)] {
        let m = draw_marker(&DICT_4X4_50, id, MARKER_PX).expect("marker");
        sheet.paste(&m, x, y);
    }
    for (row, cols) in marked.iter().enumerate() {
        for &col in cols {
            let b = reader.cell_bounding_box(row, col).offset(120, 120);
            // Pencil mark a little inside the printed box.
            sheet.fill_rect(PixelRect::new(b.x + 6, b.y + 6, b.width - 12, b.height - 12), INK);
        }
    }
    sheet
}

struct Photo {
    image: GrayImage,
    h_photo_from_sheet: marksheet_core::Homography,
}

fn photograph(sheet: &GrayImage) -> Photo {
    let (w, h) = (sheet.width as f32, sheet.height as f32);
    let src = [
        Point2::new(0.0, 0.0),
        Point2::new(w, 0.0),
        Point2::new(w, h),
        Point2::new(0.0, h),
    ];
    let dst = [
        Point2::new(50.0, 40.0),
        Point2::new(780.0, 70.0),
        Point2::new(760.0, 690.0),
        Point2::new(30.0, 660.0),
    ];
    let h_photo_from_sheet = homography_from_4pt(&src, &dst).expect("homography");
    let h_sheet_from_photo = h_photo_from_sheet.inverse().expect("inverse");
    let image = warp_perspective_gray(
        &sheet.view(),
        &h_sheet_from_photo,
        820,
        720,
        Interpolation::Bilinear,
        PAPER,
    );
    Photo {
        image,
        h_photo_from_sheet,
    }
}

fn rectifier() -> MarkerRectifier {
    MarkerRectifier::new(RectifierParams::new(480, 360, [0, 1, 3, 2])).expect("rectifier")
}

#[test]
fn photo_to_answers_and_back() {
    let reader = block_reader();
    let rectifier = rectifier();
    let photo = photograph(&printed_sheet(&reader, &marks()));

    let rectified = rectifier.rectify(&photo.image.view()).expect("sheet found");
    assert_eq!(
        (rectified.image.width, rectified.image.height),
        rectifier.canonical_size()
    );

    // Inner corner of marker 0 sits at sheet (119.5, 119.5).
    let expected_tl = photo.h_photo_from_sheet.apply(Point2::new(119.5, 119.5));
    assert_abs_diff_eq!(rectified.quad.corners[0].x, expected_tl.x, epsilon = 2.0);
    assert_abs_diff_eq!(rectified.quad.corners[0].y, expected_tl.y, epsilon = 2.0);

    let answers = reader.read(&rectified.image.view());
    assert_eq!(answers, marks());

    let mask = reader.create_mask(&answers);
    let base = RgbImage::from_gray(&photo.image.view());
    let red = [255, 0, 0];
    let out = rectifier.overlay_mask(&base, &[mask], &rectified.quad, 1.0, red);

    let at = |row: usize, col: usize| {
        let b = reader.cell_bounding_box(row, col);
        let c = Point2::new(
            b.x as f32 + b.width as f32 / 2.0,
            b.y as f32 + b.height as f32 / 2.0,
        );
        let p = rectified.h_img_from_canon.apply(c);
        out.get(p.x.round() as usize, p.y.round() as usize)
    };
    assert_eq!(at(0, 1), red);
    assert_eq!(at(4, 2), red);
    assert_ne!(at(1, 1), red);
    assert_ne!(at(0, 0), red);
    assert_eq!(out.get(2, 2), base.get(2, 2));
}

#[test]
fn missing_marker_means_no_sheet() {
    let reader = block_reader();
    let mut sheet = printed_sheet(&reader, &marks());
    // Cover marker 3 (bottom-right).
    sheet.fill_rect(PixelRect::new(590, 470, 120, 120), PAPER);
    let photo = photograph(&sheet);

    let rectifier = rectifier();
    let found = rectifier.detect_markers(&photo.image.view());
    assert_eq!(found.ids().collect::<Vec<_>>(), vec![0, 1, 2]);
    assert!(rectifier.source_quad(&found).is_none());
    assert!(rectifier.rectify(&photo.image.view()).is_none());
}

#[test]
fn answer_sheet_reads_and_overlays_sections() {
    let reader = block_reader();
    let sheet = AnswerSheet::new(rectifier(), vec![SheetSection::new("block", reader.clone())])
        .expect("sheet");
    let photo = photograph(&printed_sheet(&reader, &marks()));

    let answers = sheet.read(&photo.image.view()).expect("sheet found");
    assert_eq!(
        answers.single_choice(),
        vec![Some(1), None, Some(3), Some(0), Some(2)]
    );

    let base = RgbImage::from_gray(&photo.image.view());
    let out = sheet.overlay(&base, &answers, 0.5, [0, 0, 255]);
    assert_ne!(out, base);
    assert_eq!(out.get(2, 2), base.get(2, 2));
}

fn questionnaire_reader() -> GridReader {
    let cfg = SheetConfig::ssq();
    GridReader::from_geometry(cfg.sections[0].grid).expect("reader")
}

#[test]
fn questionnaire_single_dark_cell() {
    let reader = questionnaire_reader();
    let (w, h) = reader.canvas_size();
    let mut img = GrayImage::filled(w, h, 200);
    img.fill_rect(reader.cell_bounding_box(5, 2), 0);

    for input in [
        img.clone(),
        resize_gray(&img.view(), w / 2, h / 2, Interpolation::Bilinear),
    ] {
        let answers = reader.read(&input.view());
        assert_eq!(answers.len(), 16);
        for (row, cols) in answers.iter().enumerate() {
            if row == 5 {
                assert_eq!(cols, &BTreeSet::from([2]));
            } else {
                assert!(cols.is_empty(), "row {row}: {cols:?}");
            }
        }
    }
}

#[test]
fn mask_of_read_answers_matches_cell_boxes() {
    let reader = block_reader();
    let (w, h) = reader.canvas_size();
    let mut img = GrayImage::filled(w, h, 128);
    for (row, cols) in marks().iter().enumerate() {
        for &col in cols {
            img.fill_rect(reader.cell_bounding_box(row, col), 0);
        }
    }

    let rectifier = rectifier();
    let quad = marksheet_reader::SourceQuad::new(rectifier.canonical_corners());
    let mask = reader.create_mask(&reader.read(&img.view()));
    let out = rectifier.overlay_mask(
        &RgbImage::filled(w, h, [0, 0, 0]),
        &[mask],
        &quad,
        1.0,
        [255, 255, 255],
    );
    assert_eq!(out.to_gray(), {
        let mut expected = GrayImage::new(w, h);
        for (row, cols) in marks().iter().enumerate() {
            for &col in cols {
                expected.fill_rect(reader.cell_bounding_box(row, col), 255);
            }
        }
        expected
    });
}
