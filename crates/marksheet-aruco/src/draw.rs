use marksheet_core::GrayImage;

use crate::Dictionary;

/// Render marker `id` as a `side_px × side_px` image: black (0) one-cell
/// border, inner bits black or white (255), no quiet zone.
///
/// When `side_px` is not a multiple of the cell count, cell edges are spread
/// evenly. `None` for an unknown id or a side shorter than one pixel per cell.
pub fn draw_marker(dict: &Dictionary, id: u32, side_px: usize) -> Option<GrayImage> {
    let code = dict.code(id)?;
    let bits = dict.marker_size;
    let cells = bits + 2;
    if side_px < cells {
        return None;
    }

    let mut img = GrayImage::filled(side_px, side_px, 255);
    for y in 0..side_px {
        let cy = y * cells / side_px;
        for x in 0..side_px {
            let cx = x * cells / side_px;
            let border = cx == 0 || cy == 0 || cx + 1 == cells || cy + 1 == cells;
            let black = border || ((code >> ((cy - 1) * bits + (cx - 1))) & 1) == 1;
            if black {
                img.set(x, y, 0);
            }
        }
    }
    Some(img)
}
