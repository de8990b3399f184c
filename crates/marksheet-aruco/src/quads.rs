//! Quadrilateral candidates from a binary image.
//!
//! Dark blobs are grouped into 8-connected components, filtered by their
//! bounding box, and each survivor's convex outline is reduced to its four
//! extreme corners.

use std::collections::VecDeque;

use marksheet_core::GrayImage;
use nalgebra::{Point2, Vector2};

/// Component filters, all in pixels or ratios.
#[derive(Clone, Copy, Debug)]
pub(crate) struct QuadLimits {
    pub min_side: usize,
    pub max_side: usize,
    pub max_aspect: f32,
    pub min_fill: f32,
    pub max_fill: f32,
    pub min_quad_fill: f32,
}

struct Component {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
    pixels: Vec<(usize, usize)>,
}

impl Component {
    fn width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    fn height(&self) -> usize {
        self.max_y - self.min_y + 1
    }

    fn touches_border(&self, w: usize, h: usize) -> bool {
        self.min_x == 0 || self.min_y == 0 || self.max_x + 1 == w || self.max_y + 1 == h
    }

    // Outer pixel-edge corners of every row run, centres on integers.
    fn row_extent_points(&self) -> Vec<Point2<f32>> {
        let rows = self.height();
        let mut extents = vec![(usize::MAX, 0usize); rows];
        for &(x, y) in &self.pixels {
            let e = &mut extents[y - self.min_y];
            e.0 = e.0.min(x);
            e.1 = e.1.max(x);
        }

        let mut pts = Vec::with_capacity(rows * 4);
        for (dy, &(x0, x1)) in extents.iter().enumerate() {
            if x0 == usize::MAX {
                continue;
            }
            let y = (self.min_y + dy) as f32;
            let (l, r) = (x0 as f32 - 0.5, x1 as f32 + 0.5);
            pts.extend([
                Point2::new(l, y - 0.5),
                Point2::new(r, y - 0.5),
                Point2::new(l, y + 0.5),
                Point2::new(r, y + 0.5),
            ]);
        }
        pts
    }
}

/// Clockwise quads around dark (non-zero) components of `binary`.
pub(crate) fn find_quads(binary: &GrayImage, limits: &QuadLimits) -> Vec<[Point2<f32>; 4]> {
    let (w, h) = (binary.width, binary.height);
    let mut visited = vec![false; w * h];
    let mut out = Vec::new();

    for y0 in 0..h {
        for x0 in 0..w {
            let idx0 = y0 * w + x0;
            if visited[idx0] || binary.data[idx0] == 0 {
                continue;
            }
            let comp = flood(binary, &mut visited, x0, y0);
            if !accept(&comp, w, h, limits) {
                continue;
            }
            let hull = convex_hull(comp.row_extent_points());
            if let Some(quad) = fit_quad(&hull, limits.min_quad_fill) {
                out.push(quad);
            }
        }
    }
    out
}

fn flood(binary: &GrayImage, visited: &mut [bool], x0: usize, y0: usize) -> Component {
    let (w, h) = (binary.width, binary.height);
    let mut comp = Component {
        min_x: x0,
        min_y: y0,
        max_x: x0,
        max_y: y0,
        pixels: Vec::new(),
    };

    let mut q = VecDeque::new();
    visited[y0 * w + x0] = true;
    q.push_back((x0, y0));

    while let Some((x, y)) = q.pop_front() {
        comp.min_x = comp.min_x.min(x);
        comp.min_y = comp.min_y.min(y);
        comp.max_x = comp.max_x.max(x);
        comp.max_y = comp.max_y.max(y);
        comp.pixels.push((x, y));

        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                let nidx = ny * w + nx;
                if visited[nidx] || binary.data[nidx] == 0 {
                    continue;
                }
                visited[nidx] = true;
                q.push_back((nx, ny));
            }
        }
    }
    comp
}

fn accept(comp: &Component, w: usize, h: usize, limits: &QuadLimits) -> bool {
    if comp.touches_border(w, h) {
        return false;
    }
    let (bw, bh) = (comp.width(), comp.height());
    if bw.min(bh) < limits.min_side || bw.max(bh) > limits.max_side {
        return false;
    }
    let aspect = bw.max(bh) as f32 / bw.min(bh) as f32;
    if aspect > limits.max_aspect {
        return false;
    }
    let fill = comp.pixels.len() as f32 / (bw * bh) as f32;
    (limits.min_fill..=limits.max_fill).contains(&fill)
}

fn cross(o: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f32 {
    let (u, v): (Vector2<f32>, Vector2<f32>) = (a - o, b - o);
    u.x * v.y - u.y * v.x
}

/// Andrew's monotone chain; collinear points are dropped.
fn convex_hull(mut pts: Vec<Point2<f32>>) -> Vec<Point2<f32>> {
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<Point2<f32>> = Vec::with_capacity(pts.len() * 2);
    for pass in 0..2 {
        let start = hull.len();
        let iter: Box<dyn Iterator<Item = &Point2<f32>>> = if pass == 0 {
            Box::new(pts.iter())
        } else {
            Box::new(pts.iter().rev())
        };
        for &p in iter {
            while hull.len() >= start + 2
                && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
            {
                hull.pop();
            }
            hull.push(p);
        }
        hull.pop();
    }
    hull
}

/// Shoelace sum; positive for clockwise order with y pointing down.
fn signed_area(poly: &[Point2<f32>]) -> f32 {
    let n = poly.len();
    (0..n)
        .map(|i| {
            let (a, b) = (poly[i], poly[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f32>()
        * 0.5
}

fn fit_quad(hull: &[Point2<f32>], min_quad_fill: f32) -> Option<[Point2<f32>; 4]> {
    if hull.len() < 4 {
        return None;
    }
    let hull_area = signed_area(hull).abs();
    if hull_area <= f32::EPSILON {
        return None;
    }

    let n = hull.len() as f32;
    let c = Point2::new(
        hull.iter().map(|p| p.x).sum::<f32>() / n,
        hull.iter().map(|p| p.y).sum::<f32>() / n,
    );
    let farthest = |from: Point2<f32>| {
        hull.iter()
            .copied()
            .max_by(|a, b| (a - from).norm_squared().total_cmp(&(b - from).norm_squared()))
    };
    let p0 = farthest(c)?;
    let p2 = farthest(p0)?;

    let mut side_a = (0.0f32, p0);
    let mut side_b = (0.0f32, p0);
    for &p in hull {
        let d = cross(p0, p2, p);
        if d > side_a.0 {
            side_a = (d, p);
        }
        if d < side_b.0 {
            side_b = (d, p);
        }
    }
    if side_a.0 <= f32::EPSILON || side_b.0 >= -f32::EPSILON {
        return None;
    }

    let mut quad = [p0, side_a.1, p2, side_b.1];
    if signed_area(&quad) < 0.0 {
        quad.swap(1, 3);
    }
    (signed_area(&quad) / hull_area >= min_quad_fill).then_some(quad)
}
