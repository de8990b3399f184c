use serde::{Deserialize, Serialize};

/// Offsets on the four sides of a rectangle, in canonical pixels.
///
/// Used both for the grid's offset inside the canonical sheet (rect margin)
/// and for the blank band around each mark inside one cell pitch (cell margin).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Margin {
    pub top: usize,
    pub left: usize,
    pub right: usize,
    pub bottom: usize,
}

impl Margin {
    /// Argument order follows the printed-form convention: top, left, right, bottom.
    pub const fn new(top: usize, left: usize, right: usize, bottom: usize) -> Self {
        Self {
            top,
            left,
            right,
            bottom,
        }
    }

    pub const fn uniform(v: usize) -> Self {
        Self::new(v, v, v, v)
    }

    #[inline]
    pub const fn horizontal(&self) -> usize {
        self.left + self.right
    }

    #[inline]
    pub const fn vertical(&self) -> usize {
        self.top + self.bottom
    }
}
