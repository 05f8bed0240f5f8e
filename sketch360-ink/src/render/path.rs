//! Path construction for dry strokes.
//!
//! Two shapes come out of here: a closed variable-width outline polygon for
//! pressure-sensitive strokes (filled), and a spline-smoothed center line
//! for fixed-width strokes (stroked).

use crate::curve::curve_control_points;
use crate::geom::Point;
use crate::stroke::{InkPoint, InkStroke};

/// Build the closed outline polygon approximating variable pen width.
///
/// For each sample the local direction is the angle to the next point (the
/// last sample reuses the previous angle); edge points sit `width/2` to
/// either side, scaled by pressure unless the stroke ignores it. The result
/// holds `2n + 2` points: the mitred start cap, the left edge walked
/// forward, the mitred end cap, then the right edge walked backward.
///
/// Returns `None` for fewer than two samples - those render as a dot.
#[must_use]
pub fn create_path_points(stroke: &InkStroke) -> Option<Vec<Point>> {
    let ink_points = stroke.points();
    if ink_points.len() < 2 {
        return None;
    }
    let point_count = ink_points.len() * 2 + 2;
    let mut all_points = vec![Point::default(); point_count];

    let mut angle = 0.0_f64;
    for (i, point) in ink_points.iter().enumerate() {
        if i < ink_points.len() - 1 {
            let next = &ink_points[i + 1];
            let x = next.position.x - point.position.x;
            let y = next.position.y - point.position.y;
            angle = y.atan2(x) - std::f64::consts::FRAC_PI_2;
        }

        let h = half_width(stroke, point);
        let (sin, cos) = angle.sin_cos();
        all_points[i + 1] = Point {
            x: point.position.x + cos * h,
            y: point.position.y + sin * h,
        };
        all_points[point_count - i - 1] = Point {
            x: point.position.x - cos * h,
            y: point.position.y - sin * h,
        };
    }

    all_points[0] = modified_first_point(stroke, ink_points);
    all_points[ink_points.len() + 1] = modified_last_point(stroke, ink_points);

    Some(all_points)
}

fn half_width(stroke: &InkStroke, point: &InkPoint) -> f64 {
    let mut h = f64::from(stroke.attributes().size) * 0.5;
    if !stroke.attributes().ignore_pressure {
        h *= f64::from(point.pressure);
    }
    h
}

/// Start cap: the first segment's direction reversed, offset from point 0.
fn modified_first_point(stroke: &InkStroke, ink_points: &[InkPoint]) -> Point {
    let first = &ink_points[0];
    let second = &ink_points[1];
    let angle = (second.position.y - first.position.y)
        .atan2(second.position.x - first.position.x)
        + std::f64::consts::PI;
    let h = half_width(stroke, first);
    Point {
        x: first.position.x + angle.cos() * h,
        y: first.position.y + angle.sin() * h,
    }
}

/// End cap: the last segment's direction, offset past the final point.
fn modified_last_point(stroke: &InkStroke, ink_points: &[InkPoint]) -> Point {
    let last = &ink_points[ink_points.len() - 1];
    let second_last = &ink_points[ink_points.len() - 2];
    let angle = (last.position.y - second_last.position.y)
        .atan2(last.position.x - second_last.position.x);
    let h = half_width(stroke, last);
    Point {
        x: last.position.x + angle.cos() * h,
        y: last.position.y + angle.sin() * h,
    }
}

/// The filled outline as a drawable path.
#[must_use]
pub fn create_outline_path(stroke: &InkStroke) -> Option<tiny_skia::Path> {
    let points = create_path_points(stroke)?;
    let mut builder = tiny_skia::PathBuilder::new();
    builder.move_to(points[0].x as f32, points[0].y as f32);
    for point in &points[1..] {
        builder.line_to(point.x as f32, point.y as f32);
    }
    builder.close();
    builder.finish()
}

/// The spline-smoothed center line through every sample, for fixed-width
/// strokes. `None` for fewer than two samples.
#[must_use]
pub fn create_spline_path(stroke: &InkStroke) -> Option<tiny_skia::Path> {
    let knots: Vec<Point> = stroke.points().iter().map(|p| p.position).collect();
    if knots.len() < 2 {
        return None;
    }
    // Unwrap would be fine (len checked), but geometry never panics here.
    let (first, second) = curve_control_points(&knots).ok()?;

    let mut builder = tiny_skia::PathBuilder::new();
    builder.move_to(knots[0].x as f32, knots[0].y as f32);
    for i in 1..knots.len() {
        builder.cubic_to(
            first[i - 1].x as f32,
            first[i - 1].y as f32,
            second[i - 1].x as f32,
            second[i - 1].y as f32,
            knots[i].x as f32,
            knots[i].y as f32,
        );
    }
    builder.finish()
}

#[cfg(test)]
mod test {
    use super::{create_outline_path, create_path_points, create_spline_path};
    use crate::geom::Point;
    use crate::stroke::{DrawingAttributes, InkPoint, InkStroke};

    fn stroke_of(points: &[(f64, f64, f32)], size: f32, ignore_pressure: bool) -> InkStroke {
        let mut stroke = InkStroke::new(DrawingAttributes {
            size,
            ignore_pressure,
            ..DrawingAttributes::default()
        });
        for &(x, y, pressure) in points {
            stroke.add(InkPoint::new(Point::new(x, y), pressure, 0.0, 0.0, 0));
        }
        stroke
    }

    #[test]
    fn outline_count_and_none_for_degenerate() {
        let stroke = stroke_of(&[(0.0, 0.0, 1.0), (10.0, 0.0, 1.0), (20.0, 0.0, 1.0)], 4.0, false);
        let points = create_path_points(&stroke).unwrap();
        assert_eq!(points.len(), 3 * 2 + 2);

        let dot = stroke_of(&[(0.0, 0.0, 1.0)], 4.0, false);
        assert!(create_path_points(&dot).is_none());
        assert!(create_outline_path(&dot).is_none());
        assert!(create_spline_path(&dot).is_none());
    }

    #[test]
    fn outline_offsets_by_half_width_times_pressure() {
        // Horizontal segment: edges must sit exactly width/2 * pressure
        // above and below each interior sample.
        let stroke = stroke_of(&[(0.0, 10.0, 0.5), (10.0, 10.0, 0.5)], 8.0, false);
        let points = create_path_points(&stroke).unwrap();
        // points[1] is the left edge of sample 0, points[5] its right edge.
        let expected = 8.0 * 0.5 * 0.5; // size/2 * pressure
        assert!((points[1].y - (10.0 + expected)).abs() < 1e-9 || (points[1].y - (10.0 - expected)).abs() < 1e-9);
        let spread = (points[1].y - points[5].y).abs();
        assert!((spread - 2.0 * expected).abs() < 1e-9);
        assert!((points[1].x - 0.0).abs() < 1e-9);
    }

    #[test]
    fn ignore_pressure_uses_full_width() {
        let stroke = stroke_of(&[(0.0, 0.0, 0.1), (10.0, 0.0, 0.1)], 6.0, true);
        let points = create_path_points(&stroke).unwrap();
        let spread = (points[1].y - points[5].y).abs();
        assert!((spread - 6.0).abs() < 1e-9);
    }

    #[test]
    fn caps_extend_beyond_endpoints() {
        let stroke = stroke_of(&[(0.0, 0.0, 1.0), (10.0, 0.0, 1.0)], 4.0, false);
        let points = create_path_points(&stroke).unwrap();
        // Start cap behind x=0, end cap past x=10.
        assert!(points[0].x < 0.0);
        assert!(points[3].x > 10.0);
    }

    #[test]
    fn spline_path_builds_for_many_points() {
        let stroke = stroke_of(
            &[(0.0, 0.0, 1.0), (50.0, 40.0, 1.0), (100.0, 0.0, 1.0), (150.0, -40.0, 1.0)],
            4.0,
            true,
        );
        assert!(create_spline_path(&stroke).is_some());
    }
}
