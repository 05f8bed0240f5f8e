//! Second-generation snapping: a table of nine perspective reference curves.
//!
//! Instead of projecting every point onto one exact great circle, this
//! strategy works in a normalized curve space anchored at the active
//! vanishing column. At stroke start it finds the two reference curves
//! straddling the touch point and latches the interpolation fraction
//! between them; every later point is re-projected by interpolating the
//! bracketing curves at that fixed fraction. The result is a continuous
//! family of "personal perspective" curves rather than nine discrete snap
//! targets.
//!
//! Curve space: x is the distance from the vanishing column, y the distance
//! from the horizon, both scaled so the quadrant spans `[0, 100]`. Points in
//! the lower canvas half mirror into the same space; points left of the
//! column flip. The table itself is height-independent, so unlike the
//! original it never needs rebuilding when the canvas is resized.

use sketch360_ink::curve::ReferenceCurve;
use sketch360_ink::geom::Point;

/// Quadrant extent of the normalized curve space.
const SPAN: f64 = 100.0;
/// Number of reference curves. Curve index 0 is the horizon itself.
pub const CURVE_COUNT: usize = 9;

/// The ordered reference-curve table.
pub struct CurveTable {
    curves: Vec<ReferenceCurve>,
}

impl CurveTable {
    /// Build the nine bundled curves. Curve `k` follows the geodesic through
    /// the vanishing point whose apex elevation is `k * 10` degrees, fitted
    /// as a single cubic: both endpoints exact, the start tangent matching
    /// the geodesic's `tan(elevation)` slope, the apex tangent flat.
    #[must_use]
    pub fn new() -> Self {
        let curves = (1..=CURVE_COUNT)
            .map(|k| {
                let apex_elevation = k as f64 * std::f64::consts::PI / 18.0;
                let apex_y = apex_elevation * 2.0 / std::f64::consts::PI * SPAN;
                let slope = apex_elevation.tan();
                // Pull length 1/3 of the run, the standard cubic Hermite
                // conversion; capped so steep start tangents stay sane.
                let pull = SPAN / 3.0;
                let p0 = Point::new(0.0, 0.0);
                let p1 = Point::new(pull, (pull * slope).min(apex_y));
                let p2 = Point::new(SPAN - pull, apex_y);
                let p3 = Point::new(SPAN, apex_y);
                ReferenceCurve::new(p0, p1, p2, p3)
            })
            .collect();
        Self { curves }
    }

    #[must_use]
    pub fn curves(&self) -> &[ReferenceCurve] {
        &self.curves
    }

    /// Height of table entry `index` at curve-space `x`. Index 0 is the
    /// horizon (flat zero); `1..=CURVE_COUNT` are the bundled curves.
    #[must_use]
    fn height_at(&self, index: usize, x: f64) -> f64 {
        if index == 0 {
            return 0.0;
        }
        self.curves[index - 1].y_at(x.clamp(0.0, SPAN))
    }
}

impl Default for CurveTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-stroke latched state: which curves bracket the first touch and where
/// between them it sits.
#[derive(Copy, Clone, Debug)]
pub struct Grip {
    /// Canvas x of the vanishing column the stroke anchored to.
    vanish_x: f64,
    /// Touch was in the lower canvas half; curve space mirrors vertically.
    mirrored: bool,
    /// Index of the bracketing curve below the touch (0 = horizon).
    below: usize,
    /// Interpolation fraction toward the curve above.
    fraction: f64,
}

/// Canvas point mapped into curve space relative to one vanishing column.
fn normalize(point: Point, vanish_x: f64, canvas_height: f64) -> (f64, f64, bool) {
    let scale = canvas_height / (2.0 * SPAN);
    let x = (point.x - vanish_x).abs() / scale;
    let mirrored = point.y > canvas_height / 2.0;
    let y = (canvas_height / 2.0 - point.y).abs() / scale;
    (x, y, mirrored)
}

impl Grip {
    /// Latch onto the curves bracketing `point`. `None` when the point is
    /// too close to the vanishing point for a bracket to exist - the
    /// caller cancels the stroke, the same degenerate-anchor treatment the
    /// geodesic strategy applies.
    #[must_use]
    pub fn latch(
        table: &CurveTable,
        point: Point,
        vanish_x: f64,
        canvas_height: f64,
    ) -> Option<Self> {
        let (x, y, mirrored) = normalize(point, vanish_x, canvas_height);
        if x < f64::EPSILON && y < f64::EPSILON {
            // Every curve passes through the vanishing point; no bracket.
            return None;
        }

        // Walk the ordered table for the straddling pair.
        for below in (0..=CURVE_COUNT - 1).rev() {
            let floor = table.height_at(below, x);
            if y >= floor {
                let ceiling = table.height_at(below + 1, x);
                let span = ceiling - floor;
                let fraction = if span <= f64::EPSILON {
                    // Degenerate column (x == 0): keep the lower curve.
                    0.0
                } else {
                    ((y - floor) / span).clamp(0.0, 1.0)
                };
                return Some(Self {
                    vanish_x,
                    mirrored,
                    below,
                    fraction,
                });
            }
        }
        None
    }

    #[must_use]
    pub fn curve_below(&self) -> usize {
        self.below
    }
    #[must_use]
    pub fn fraction(&self) -> f64 {
        self.fraction
    }
    #[must_use]
    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    /// Re-project a wet point onto the latched personal curve: x is kept,
    /// y comes from interpolating the bracketing curves at this grip's
    /// fraction.
    #[must_use]
    pub fn apply(&self, table: &CurveTable, point: Point, canvas_height: f64) -> Point {
        let scale = canvas_height / (2.0 * SPAN);
        let x = (point.x - self.vanish_x).abs() / scale;

        let floor = table.height_at(self.below, x);
        let ceiling = table.height_at(self.below + 1, x);
        let y = floor + (ceiling - floor) * self.fraction;

        let canvas_y = if self.mirrored {
            canvas_height / 2.0 + y * scale
        } else {
            canvas_height / 2.0 - y * scale
        };
        Point::new(point.x, canvas_y)
    }
}
