#![cfg(feature = "cli")]

use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::Path;

use assert_cmd::Command;
use marksheet::aruco::{builtins::DICT_4X4_50, draw_marker};
use marksheet::core::{GrayImage, PixelRect};
use marksheet::frame::{write_frame, write_message, Message, IMAGE_DATA};
use marksheet::reader::{GridGeometry, SectionConfig};
use marksheet::{convert, Margin, RectifierParams, SheetConfig, SheetReport};
use predicates::prelude::*;

fn cli() -> Command {
    Command::cargo_bin("marksheet").expect("binary")
}

fn block_config() -> SheetConfig {
    SheetConfig {
        rectifier: RectifierParams::new(480, 360, [0, 1, 3, 2]),
        sections: vec![SectionConfig {
            name: "block".to_string(),
            grid: GridGeometry {
                rect_margin: Margin::new(30, 40, 40, 30),
                rows: 3,
                cols: 4,
                cell_width: 60,
                cell_height: 60,
                cell_margin: Margin::new(20, 20, 20, 20),
            },
            mark_ratio: 1.4,
        }],
    }
}

// Flat scan: markers framing the 480 × 360 canonical area at (120, 120).
fn scan(cfg: &SheetConfig, marks: &[BTreeSet<usize>]) -> image::GrayImage {
    let mut sheet = GrayImage::filled(720, 600, 235);
    for (id, x, y) in [(0u32, 24, 24), (1, 600, 24), (3, 600, 480), (2, 24, 480)] {
        sheet.paste(&draw_marker(&DICT_4X4_50, id, 96).expect("marker"), x, y);
    }
    let grid = cfg.sections[0].grid;
    for (row, cols) in marks.iter().enumerate() {
        for &col in cols {
            let b = grid.cell_bounding_box(row, col).offset(120, 120);
            sheet.fill_rect(PixelRect::new(b.x + 8, b.y + 8, b.width - 16, b.height - 16), 30);
        }
    }
    convert::gray_to_image(&sheet).expect("fits")
}

fn write_scan(path: &Path, cfg: &SheetConfig, marks: &[BTreeSet<usize>]) {
    scan(cfg, marks).save(path).expect("save scan");
}

fn scan_png(cfg: &SheetConfig, marks: &[BTreeSet<usize>]) -> Vec<u8> {
    let mut png = Vec::new();
    scan(cfg, marks)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .expect("encode");
    png
}

fn is_red(img: &image::RgbImage, x: u32, y: u32) -> bool {
    let px = img.get_pixel(x, y).0;
    px[0] > px[1] && px[0] > px[2]
}

#[test]
fn draw_marker_writes_bordered_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("m7.png");
    cli()
        .args(["draw-marker", "--id", "7", "--out"])
        .arg(&out)
        .assert()
        .success();

    let img = image::open(&out).expect("png").to_luma8();
    assert_eq!(img.dimensions(), (150, 150));
    assert_eq!(img.get_pixel(0, 0).0, [0]);
    assert_eq!(img.get_pixel(149, 75).0, [0]);
}

#[test]
fn draw_marker_rejects_unknown_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    cli()
        .args(["draw-marker", "--id", "50", "--out"])
        .arg(dir.path().join("x.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot draw id 50"));
}

#[test]
fn preset_prints_both_blocks() {
    cli()
        .args(["preset", "mssq"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"childhood\"")
                .and(predicate::str::contains("\"last_decade\"")),
        );
}

#[test]
fn read_blank_photo_reports_no_sheet() {
    let dir = tempfile::tempdir().expect("tempdir");
    let photo = dir.path().join("blank.png");
    image::GrayImage::from_pixel(300, 200, image::Luma([240]))
        .save(&photo)
        .expect("save");

    cli()
        .args(["--log-level", "error", "read", "--image"])
        .arg(&photo)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"quad\": null"));
}

#[test]
fn read_scan_writes_report_and_overlay() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = block_config();
    let cfg_path = dir.path().join("sheet.json");
    cfg.write_json(&cfg_path).expect("config");

    let marks = vec![BTreeSet::from([2]), BTreeSet::new(), BTreeSet::from([0])];
    let scan = dir.path().join("scan.png");
    write_scan(&scan, &cfg, &marks);

    let report_path = dir.path().join("report.json");
    let overlay_path = dir.path().join("overlay.png");
    cli()
        .arg("read")
        .arg("--config")
        .arg(&cfg_path)
        .arg("--image")
        .arg(&scan)
        .arg("--report")
        .arg(&report_path)
        .arg("--overlay")
        .arg(&overlay_path)
        .assert()
        .success();

    let report = SheetReport::load_json(&report_path).expect("report");
    assert!(report.found());
    assert_eq!(report.markers.len(), 4);
    assert_eq!(report.sections[0].name, "block");
    assert_eq!(report.sections[0].rows, marks);

    let overlay = image::open(&overlay_path).expect("overlay").to_rgb8();
    assert_eq!(overlay.dimensions(), (720, 600));
    // Centre of marked cell (0, 2): canvas (290, 80) + (120, 120).
    assert!(is_red(&overlay, 410, 200), "{:?}", overlay.get_pixel(410, 200));
}

#[test]
fn read_framed_capture_reports_every_photo() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = block_config();
    let cfg_path = dir.path().join("sheet.json");
    cfg.write_json(&cfg_path).expect("config");

    let first = vec![BTreeSet::from([2]), BTreeSet::new(), BTreeSet::from([0])];
    let second = vec![BTreeSet::new(), BTreeSet::from([3]), BTreeSet::new()];
    let mut capture = Vec::new();
    for message in [
        Message::Text("camera ready".into()),
        Message::Image(scan_png(&cfg, &first)),
        Message::Image(scan_png(&cfg, &second)),
    ] {
        write_message(&mut capture, &message).expect("frame");
    }
    let capture_path = dir.path().join("capture.bin");
    std::fs::write(&capture_path, capture).expect("capture");

    let report_path = dir.path().join("report.json");
    cli()
        .arg("read")
        .arg("--framed")
        .arg("--config")
        .arg(&cfg_path)
        .arg("--image")
        .arg(&capture_path)
        .arg("--report")
        .arg(&report_path)
        .arg("--overlay")
        .arg(dir.path().join("overlay.png"))
        .assert()
        .success();

    let raw = std::fs::read_to_string(&report_path).expect("report");
    let reports: Vec<SheetReport> = serde_json::from_str(&raw).expect("report array");
    assert_eq!(reports.len(), 2);
    for (i, (report, marks)) in reports.iter().zip([&first, &second]).enumerate() {
        assert!(report.found(), "photo {i}");
        assert_eq!(&report.sections[0].rows, marks);
        let path = report.image_path.as_deref().expect("image path");
        assert!(path.ends_with(&format!("capture.bin#{i}")), "{path}");
    }

    assert!(!dir.path().join("overlay.png").exists());
    let first_overlay = image::open(dir.path().join("overlay_0.png")).expect("overlay 0");
    let second_overlay = image::open(dir.path().join("overlay_1.png")).expect("overlay 1");
    let (first_overlay, second_overlay) = (first_overlay.to_rgb8(), second_overlay.to_rgb8());
    // Cell (0, 2) is marked only on the first sheet, cell (1, 3) only on the second.
    assert!(is_red(&first_overlay, 410, 200));
    assert!(!is_red(&second_overlay, 410, 200));
    assert!(is_red(&second_overlay, 510, 300));
    assert!(!is_red(&first_overlay, 510, 300));
}

#[test]
fn read_truncated_capture_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = block_config();
    let cfg_path = dir.path().join("sheet.json");
    cfg.write_json(&cfg_path).expect("config");

    let png = scan_png(&cfg, &[BTreeSet::new(), BTreeSet::new(), BTreeSet::new()]);
    let mut capture = Vec::new();
    write_message(&mut capture, &Message::Image(png.clone())).expect("frame");
    // Second message: full type frame, payload header for `png.len()` bytes, half the bytes.
    write_frame(&mut capture, IMAGE_DATA.as_bytes()).expect("type");
    capture.extend_from_slice(&(png.len() as u32).to_le_bytes());
    capture.extend_from_slice(&png[..png.len() / 2]);
    let capture_path = dir.path().join("capture.bin");
    std::fs::write(&capture_path, capture).expect("capture");

    cli()
        .arg("read")
        .arg("--framed")
        .arg("--config")
        .arg(&cfg_path)
        .arg("--image")
        .arg(&capture_path)
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("capture.bin after 1 image(s)")
                .and(predicate::str::contains("stream ends inside a message")),
        );
}
