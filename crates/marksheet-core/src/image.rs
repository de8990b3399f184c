use serde::{Deserialize, Serialize};

/// RGB triple, `[r, g, b]`.
pub type Rgb = [u8; 3];

/// Axis-aligned pixel rectangle: `x..x + width` × `y..y + height`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelRect {
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(&self) -> usize {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(&self) -> usize {
        self.y + self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }

    /// Intersection with `0..width × 0..height`.
    pub fn clamped(&self, width: usize, height: usize) -> Self {
        let x0 = self.x.min(width);
        let y0 = self.y.min(height);
        let x1 = self.right().min(width);
        let y1 = self.bottom().min(height);
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Same rectangle shifted by `(dx, dy)`.
    #[inline]
    pub fn offset(&self, dx: usize, dy: usize) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

impl GrayImageView<'_> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Pixel value, or `border` outside the image.
    #[inline]
    pub fn get_or(&self, x: i32, y: i32, border: u8) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return border;
        }
        self.data[y as usize * self.width + x as usize]
    }

    /// Copy out the part of `rect` that lies inside the image.
    pub fn crop(&self, rect: PixelRect) -> GrayImage {
        let r = rect.clamped(self.width, self.height);
        let mut data = Vec::with_capacity(r.width * r.height);
        for y in r.y..r.bottom() {
            let row = y * self.width;
            data.extend_from_slice(&self.data[row + r.x..row + r.right()]);
        }
        GrayImage {
            width: r.width,
            height: r.height,
            data,
        }
    }

    /// Mean intensity over the part of `rect` inside the image; `0.0` if empty.
    pub fn mean_in(&self, rect: PixelRect) -> f64 {
        let r = rect.clamped(self.width, self.height);
        if r.is_empty() {
            return 0.0;
        }
        let mut sum = 0u64;
        for y in r.y..r.bottom() {
            let row = y * self.width;
            sum += self.data[row + r.x..row + r.right()]
                .iter()
                .map(|&v| v as u64)
                .sum::<u64>();
        }
        sum as f64 / (r.width * r.height) as f64
    }

    pub fn to_image(&self) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self.data.to_vec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    /// Black image.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wrap an existing buffer; `None` if its length is not `width * height`.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        (width.checked_mul(height)? == data.len()).then_some(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }

    pub fn crop(&self, rect: PixelRect) -> GrayImage {
        self.view().crop(rect)
    }

    pub fn mean_in(&self, rect: PixelRect) -> f64 {
        self.view().mean_in(rect)
    }

    /// Copy `src` with its top-left at `(x, y)`; pixels falling outside are dropped.
    pub fn paste(&mut self, src: &GrayImage, x: usize, y: usize) {
        let r = PixelRect::new(x, y, src.width, src.height).clamped(self.width, self.height);
        for yy in 0..r.height {
            let s = yy * src.width;
            let d = (r.y + yy) * self.width + r.x;
            self.data[d..d + r.width].copy_from_slice(&src.data[s..s + r.width]);
        }
    }

    pub fn fill_rect(&mut self, rect: PixelRect, value: u8) {
        let r = rect.clamped(self.width, self.height);
        for y in r.y..r.bottom() {
            let row = y * self.width;
            self.data[row + r.x..row + r.right()].fill(value);
        }
    }

    /// Draw the border of `rect`, `thickness` pixels wide, inside the rectangle.
    pub fn draw_rect_outline(&mut self, rect: PixelRect, thickness: usize, value: u8) {
        let t = thickness.max(1);
        if t * 2 >= rect.width || t * 2 >= rect.height {
            self.fill_rect(rect, value);
            return;
        }
        self.fill_rect(PixelRect::new(rect.x, rect.y, rect.width, t), value);
        self.fill_rect(
            PixelRect::new(rect.x, rect.bottom() - t, rect.width, t),
            value,
        );
        self.fill_rect(PixelRect::new(rect.x, rect.y, t, rect.height), value);
        self.fill_rect(
            PixelRect::new(rect.right() - t, rect.y, t, rect.height),
            value,
        );
    }
}

/// Interleaved 8-bit RGB image, row-major, `len = 3 * w * h`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RgbImage {
    pub fn filled(width: usize, height: usize, color: Rgb) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            data.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        (width.checked_mul(height)?.checked_mul(3)? == data.len()).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Replicate a grayscale image into all three channels.
    pub fn from_gray(src: &GrayImageView<'_>) -> Self {
        let mut data = Vec::with_capacity(src.data.len() * 3);
        for &v in src.data {
            data.extend_from_slice(&[v, v, v]);
        }
        Self {
            width: src.width,
            height: src.height,
            data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Rgb {
        let i = 3 * (y * self.width + x);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, color: Rgb) {
        let i = 3 * (y * self.width + x);
        self.data[i..i + 3].copy_from_slice(&color);
    }

    /// ITU-R BT.601 luma, `0.299 R + 0.587 G + 0.114 B`, rounded.
    pub fn to_gray(&self) -> GrayImage {
        let data = self
            .data
            .chunks_exact(3)
            .map(|p| {
                let y = 0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32;
                y.round().clamp(0.0, 255.0) as u8
            })
            .collect();
        GrayImage {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

/// Bilinear sample at `(x, y)`; neighbours outside the image read as `border`.
#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32, border: u8) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = src.get_or(x0, y0, border) as f32;
    let p10 = src.get_or(x0 + 1, y0, border) as f32;
    let p01 = src.get_or(x0, y0 + 1, border) as f32;
    let p11 = src.get_or(x0 + 1, y0 + 1, border) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

/// Nearest-neighbour sample at `(x, y)`, or `border` outside the image.
#[inline]
pub fn sample_nearest(src: &GrayImageView<'_>, x: f32, y: f32, border: u8) -> u8 {
    src.get_or(x.round() as i32, y.round() as i32, border)
}
