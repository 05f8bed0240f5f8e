//! # Cubic Bezier evaluation
//!
//! Two consumers with very different shapes: the renderer fits a smooth
//! spline through every point of a fixed-width stroke, and the perspective
//! stencil samples reference curves densely for nearest-point queries.

use crate::geom::Point;

/// How densely [`ReferenceCurve`] samples its cubic. Nearest-point queries
/// walk this table instead of solving for the curve parameter.
pub const REFERENCE_SAMPLES: usize = 1000;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SplineError {
    #[error("at least two knot points required, got {0}")]
    TooFewKnots(usize),
}

/// Evaluate the cubic Bezier `a..d` at parameter `t`, per axis.
///
/// `t` is not validated; callers step it through `0..=1`.
#[must_use]
pub fn bezier_point(a: Point, b: Point, c: Point, d: Point, t: f64) -> Point {
    let u = 1.0 - t;
    let eval = |a: f64, b: f64, c: f64, d: f64| {
        u * u * u * a + 3.0 * t * u * u * b + 3.0 * u * t * t * c + t * t * t * d
    };
    Point {
        x: eval(a.x, b.x, c.x, d.x),
        y: eval(a.y, b.y, c.y, d.y),
    }
}

/// Fit an open cubic-Bezier spline through `knots`, producing the first and
/// second control point of each of the `knots.len() - 1` segments.
///
/// Consecutive segments share first-derivative continuity at interior knots.
/// The two-knot case degenerates to a straight segment, `3*P1 = 2*P0 + P3`.
pub fn curve_control_points(knots: &[Point]) -> Result<(Vec<Point>, Vec<Point>), SplineError> {
    let n = match knots.len().checked_sub(1) {
        Some(n) if n >= 1 => n,
        _ => return Err(SplineError::TooFewKnots(knots.len())),
    };
    if n == 1 {
        // 3P1 = 2P0 + P3
        let first = Point {
            x: (2.0 * knots[0].x + knots[1].x) / 3.0,
            y: (2.0 * knots[0].y + knots[1].y) / 3.0,
        };
        // P2 = 2P1 - P0
        let second = Point {
            x: 2.0 * first.x - knots[0].x,
            y: 2.0 * first.y - knots[0].y,
        };
        return Ok((vec![first], vec![second]));
    }

    let mut rhs = vec![0.0; n];
    let axis = |rhs: &mut [f64], get: &dyn Fn(&Point) -> f64| {
        for i in 1..n - 1 {
            rhs[i] = 4.0 * get(&knots[i]) + 2.0 * get(&knots[i + 1]);
        }
        rhs[0] = get(&knots[0]) + 2.0 * get(&knots[1]);
        rhs[n - 1] = (8.0 * get(&knots[n - 1]) + get(&knots[n])) / 2.0;
        solve_tridiagonal(rhs)
    };
    let xs = axis(&mut rhs, &|p| p.x);
    let ys = axis(&mut rhs, &|p| p.y);

    let mut first = Vec::with_capacity(n);
    let mut second = Vec::with_capacity(n);
    for i in 0..n {
        first.push(Point { x: xs[i], y: ys[i] });
        if i < n - 1 {
            second.push(Point {
                x: 2.0 * knots[i + 1].x - xs[i + 1],
                y: 2.0 * knots[i + 1].y - ys[i + 1],
            });
        } else {
            second.push(Point {
                x: (knots[n].x + xs[n - 1]) / 2.0,
                y: (knots[n].y + ys[n - 1]) / 2.0,
            });
        }
    }
    Ok((first, second))
}

/// Thomas-algorithm solve of the spline's tridiagonal system for one axis.
fn solve_tridiagonal(rhs: &[f64]) -> Vec<f64> {
    let n = rhs.len();
    let mut x = vec![0.0; n];
    let mut tmp = vec![0.0; n];

    let mut b = 2.0;
    x[0] = rhs[0] / b;
    // Decomposition and forward substitution.
    for i in 1..n {
        tmp[i] = 1.0 / b;
        b = (if i < n - 1 { 4.0 } else { 3.5 }) - tmp[i];
        x[i] = (rhs[i] - x[i - 1]) / b;
    }
    // Back substitution.
    for i in 1..n {
        x[n - i - 1] -= tmp[n - i] * x[n - i];
    }
    x
}

/// One curve of the perspective stencil's reference table: four control
/// points plus a dense forward sample of the cubic between them.
///
/// Immutable once built; the stencil rebuilds the table only when the canvas
/// height changes.
#[derive(Clone, Debug)]
pub struct ReferenceCurve {
    pub p0: Point,
    pub p1: Point,
    pub p2: Point,
    pub p3: Point,
    curve_points: Vec<Point>,
}

impl ReferenceCurve {
    #[must_use]
    pub fn new(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        let curve_points = (0..=REFERENCE_SAMPLES)
            .map(|i| bezier_point(p0, p1, p2, p3, i as f64 / REFERENCE_SAMPLES as f64))
            .collect();
        Self {
            p0,
            p1,
            p2,
            p3,
            curve_points,
        }
    }

    #[must_use]
    pub fn curve_points(&self) -> &[Point] {
        &self.curve_points
    }

    /// The sampled point nearest to `target`.
    #[must_use]
    pub fn nearest_point(&self, target: Point) -> Point {
        // curve_points is never empty - the constructor always samples.
        *self
            .curve_points
            .iter()
            .min_by(|a, b| {
                a.distance(target)
                    .partial_cmp(&b.distance(target))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .expect("reference curve sampled at construction")
    }

    /// Height of the curve at horizontal position `x`, from the sample
    /// nearest in x. The reference curves are monotonic in x, so this is the
    /// curve's y "column" value.
    #[must_use]
    pub fn y_at(&self, x: f64) -> f64 {
        self.curve_points
            .iter()
            .min_by(|a, b| {
                (a.x - x)
                    .abs()
                    .partial_cmp(&(b.x - x).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .expect("reference curve sampled at construction")
            .y
    }
}
