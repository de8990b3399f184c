use nalgebra::{Matrix3, Point2, Vector3};

/// Plane projective transform, `dst ~ H * src` in homogeneous coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.h[(0, 0)], self.h[(0, 1)], self.h[(0, 2)]],
            [self.h[(1, 0)], self.h[(1, 1)], self.h[(1, 2)]],
            [self.h[(2, 0)], self.h[(2, 1)], self.h[(2, 2)]],
        ]
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        Point2::new((v[0] / v[2]) as f32, (v[1] / v[2]) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

// Relative area below which three corners count as collinear.
const COLLINEAR_EPS: f64 = 1e-9;

fn to_f64(q: &[Point2<f32>; 4]) -> [(f64, f64); 4] {
    q.map(|p| (p.x as f64, p.y as f64))
}

// Every corner triple must span a real triangle.
fn is_degenerate(q: &[(f64, f64); 4]) -> bool {
    let longest_sq = (0..4)
        .map(|i| {
            let (a, b) = (q[i], q[(i + 1) % 4]);
            (b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)
        })
        .fold(0.0, f64::max);
    if !longest_sq.is_finite() || longest_sq == 0.0 {
        return true;
    }
    (0..4).any(|i| {
        let (a, b, c) = (q[i], q[(i + 1) % 4], q[(i + 2) % 4]);
        let cross = (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0);
        cross.abs() <= COLLINEAR_EPS * longest_sq
    })
}

// Closed-form map of the unit square (0,0), (1,0), (1,1), (0,1) onto `q`.
fn unit_square_to(q: &[(f64, f64); 4]) -> Matrix3<f64> {
    let [p0, p1, p2, p3] = *q;
    let sx = p0.0 - p1.0 + p2.0 - p3.0;
    let sy = p0.1 - p1.1 + p2.1 - p3.1;
    let (dx1, dy1) = (p1.0 - p2.0, p1.1 - p2.1);
    let (dx2, dy2) = (p3.0 - p2.0, p3.1 - p2.1);

    // Non-zero once `is_degenerate` has passed: it is the (p1, p2, p3) triangle.
    let den = dx1 * dy2 - dx2 * dy1;
    let g = (sx * dy2 - dx2 * sy) / den;
    let h = (dx1 * sy - sx * dy1) / den;

    Matrix3::new(
        p1.0 - p0.0 + g * p1.0,
        p3.0 - p0.0 + h * p3.0,
        p0.0,
        p1.1 - p0.1 + g * p1.1,
        p3.1 - p0.1 + h * p3.1,
        p0.1,
        g,
        h,
        1.0,
    )
}

/// Compute H such that `dst ~ H * src` from 4 point correspondences.
///
/// Both quads go through the unit square, `H = S_dst * S_src⁻¹`. Corner order
/// must be consistent between `src` and `dst`. Returns `None` when three
/// corners of either quad are collinear or two coincide.
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    let (src, dst) = (to_f64(src), to_f64(dst));
    if is_degenerate(&src) || is_degenerate(&dst) {
        return None;
    }

    let h = unit_square_to(&dst) * unit_square_to(&src).try_inverse()?;
    let s = h[(2, 2)];
    if s.abs() < 1e-12 || h.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(Homography::new(h / s))
}
