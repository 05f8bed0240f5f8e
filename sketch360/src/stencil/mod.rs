//! # Stencils
//!
//! A stencil constrains wet ink: every batch of pointer points is rewritten
//! onto a reference curve family before it dries. The engine is a
//! [`WetStrokeHandler`]; feed it through a
//! [`sketch360_ink::wet::WetStrokeSource`] and the whole lifecycle becomes a
//! deterministic function from input points to the committed stroke.
//!
//! Two snapping strategies exist, selected by [`SnapGeneration`]: the pure
//! geodesic snapper (project onto one great circle, the canonical behavior)
//! and the perspective-curve-table snapper in [`perspective`]. Vertical and
//! two-point modes behave identically under both.

pub mod perspective;
pub mod two_point;

use sketch360_ink::geom::Point;
use sketch360_ink::wet::{Disposition, WetStrokeHandler, WetStrokeUpdate};

use crate::equirect::{self, Vertex};

/// Which curve family wet strokes snap onto. Exactly one mode is active at
/// a time.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum StencilMode {
    /// Pass input through unchanged.
    #[default]
    None,
    /// Constrain the stroke to the vertical line through its first point.
    VerticalLines,
    /// Geodesics anchored at the front/back vanishing point.
    FrontBackLines,
    /// Geodesics anchored at the left/right vanishing point.
    LeftRightLines,
    /// The geodesic defined by the two user-movable anchor points.
    TwoPoint,
}

/// Strategy selection for the curve-anchored modes.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum SnapGeneration {
    /// Project onto the exact great circle through the anchor and the first
    /// touch.
    #[default]
    Geodesic,
    /// Interpolate between the two bracketing curves of the perspective
    /// reference table.
    Perspective,
}

/// State carried across one wet stroke, established at Starting and dropped
/// at Completed/Canceled. Between strokes the engine keeps only its mode,
/// strategy, and the externally supplied two-point apex.
#[derive(Copy, Clone)]
enum StrokeState {
    Idle,
    Passthrough,
    Vertical { x: f64 },
    Geodesic { apex: Vertex },
    Perspective { grip: perspective::Grip },
}

pub struct StencilEngine {
    mode: StencilMode,
    generation: SnapGeneration,
    canvas_height: f64,
    curves: perspective::CurveTable,
    /// Apex supplied by the two-point input handler; `None` until the two
    /// anchors have produced a valid geodesic.
    two_point_apex: Option<Vertex>,
    state: StrokeState,
}

impl StencilEngine {
    #[must_use]
    pub fn new(canvas_height: f64) -> Self {
        Self {
            mode: StencilMode::None,
            generation: SnapGeneration::default(),
            canvas_height,
            curves: perspective::CurveTable::new(),
            two_point_apex: None,
            state: StrokeState::Idle,
        }
    }

    #[must_use]
    pub fn mode(&self) -> StencilMode {
        self.mode
    }
    pub fn set_mode(&mut self, mode: StencilMode) {
        self.mode = mode;
        self.state = StrokeState::Idle;
    }
    #[must_use]
    pub fn generation(&self) -> SnapGeneration {
        self.generation
    }
    pub fn set_generation(&mut self, generation: SnapGeneration) {
        self.generation = generation;
    }
    #[must_use]
    pub fn canvas_height(&self) -> f64 {
        self.canvas_height
    }
    pub fn set_canvas_height(&mut self, canvas_height: f64) {
        self.canvas_height = canvas_height;
    }
    #[must_use]
    pub fn two_point_apex(&self) -> Option<Vertex> {
        self.two_point_apex
    }
    /// Install the apex derived from the two-point stencil anchors.
    pub fn set_two_point_apex(&mut self, apex: Vertex) {
        self.two_point_apex = Some(apex);
    }

    /// The fixed anchor screen point of the curve-anchored modes, or `None`
    /// for modes without one.
    #[must_use]
    pub fn anchor_point(&self) -> Option<Point> {
        let h = self.canvas_height;
        match self.mode {
            StencilMode::FrontBackLines => Some(Point::new(h, h / 2.0)),
            StencilMode::LeftRightLines => Some(Point::new(h / 2.0, h / 2.0)),
            _ => None,
        }
    }

    /// The vanishing columns (canvas x) the perspective strategy may anchor
    /// to in the current mode.
    fn vanishing_columns(&self) -> &'static [f64] {
        // As multiples of the canvas height: front at x == h, back at the
        // seam columns, left/right halfway between.
        const FRONT_BACK: [f64; 3] = [0.0, 1.0, 2.0];
        const LEFT_RIGHT: [f64; 2] = [0.5, 1.5];
        match self.mode {
            StencilMode::FrontBackLines => &FRONT_BACK,
            StencilMode::LeftRightLines => &LEFT_RIGHT,
            _ => &[],
        }
    }

    fn nearest_column(&self, x: f64) -> f64 {
        let h = self.canvas_height;
        self.vanishing_columns()
            .iter()
            .map(|&c| c * h)
            .min_by(|a, b| {
                (a - x)
                    .abs()
                    .partial_cmp(&(b - x).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(h)
    }

    /// Project every pending point onto the geodesic with the given apex,
    /// preserving each point's azimuth. Empty input finalizes the stroke.
    fn snap_to_apex(&self, apex: Vertex, update: &mut WetStrokeUpdate) {
        if update.new_points.is_empty() {
            update.disposition = Disposition::Completed;
            return;
        }
        for point in &mut update.new_points {
            let vertex = Vertex::from_point(point.position, self.canvas_height);
            let snapped = equirect::elevation_at(apex, vertex.azimuth).and_then(|elevation| {
                Vertex::new(vertex.azimuth, elevation).to_point(self.canvas_height)
            });
            match snapped {
                Ok(position) => point.position = position,
                // Expected only for degenerate apexes; the point inks
                // unconstrained rather than erroring out of a gesture.
                Err(err) => log::debug!("point left unsnapped: {err}"),
            }
        }
        update.disposition = Disposition::Inking;
    }

    fn snap_to_grip(&self, grip: perspective::Grip, update: &mut WetStrokeUpdate) {
        if update.new_points.is_empty() {
            update.disposition = Disposition::Completed;
            return;
        }
        for point in &mut update.new_points {
            point.position = grip.apply(&self.curves, point.position, self.canvas_height);
        }
        update.disposition = Disposition::Inking;
    }

    fn snap(&mut self, update: &mut WetStrokeUpdate) {
        match self.state {
            // No stroke was latched; leave the disposition as the previous
            // phase set it.
            StrokeState::Idle => {}
            StrokeState::Passthrough => {
                update.disposition = Disposition::Inking;
            }
            StrokeState::Vertical { x } => {
                for point in &mut update.new_points {
                    point.position.x = x;
                }
                update.disposition = Disposition::Inking;
            }
            StrokeState::Geodesic { apex } => self.snap_to_apex(apex, update),
            StrokeState::Perspective { grip } => self.snap_to_grip(grip, update),
        }
    }

    fn start_curve_mode(&mut self, update: &mut WetStrokeUpdate) {
        // Unwrap is fine by construction; only curve modes call this.
        let anchor = self.anchor_point().expect("curve mode has an anchor");

        // The first point must not be coincident with the anchor.
        let Some(first) = update
            .new_points
            .iter()
            .find(|p| p.position != anchor)
            .copied()
        else {
            update.disposition = Disposition::Canceled;
            return;
        };

        match self.generation {
            SnapGeneration::Geodesic => {
                let anchor_vertex = Vertex::from_point(anchor, self.canvas_height);
                let first_vertex = Vertex::from_point(first.position, self.canvas_height);
                match equirect::apex_of(anchor_vertex, first_vertex) {
                    Ok(apex) => {
                        self.state = StrokeState::Geodesic { apex };
                        self.snap_to_apex(apex, update);
                    }
                    Err(err) => {
                        log::debug!("stencil anchor degenerate, canceling stroke: {err}");
                        update.disposition = Disposition::Canceled;
                    }
                }
            }
            SnapGeneration::Perspective => {
                let column = self.nearest_column(first.position.x);
                match perspective::Grip::latch(
                    &self.curves,
                    first.position,
                    column,
                    self.canvas_height,
                ) {
                    Some(grip) => {
                        self.state = StrokeState::Perspective { grip };
                        self.snap_to_grip(grip, update);
                    }
                    None => {
                        log::debug!("touch at the vanishing point, canceling stroke");
                        update.disposition = Disposition::Canceled;
                    }
                }
            }
        }
    }

    /// Guide polylines for the active mode, for overlay rendering.
    #[must_use]
    pub fn guide_polylines(&self) -> Vec<Vec<Point>> {
        let h = self.canvas_height;
        match self.mode {
            StencilMode::None => Vec::new(),
            StencilMode::VerticalLines => {
                let step = (h * 2.0) / 36.0;
                let mut lines = Vec::new();
                let mut x = 0.0;
                while x <= h * 2.0 {
                    lines.push(vec![Point::new(x, 0.0), Point::new(x, h)]);
                    x += step;
                }
                lines
            }
            StencilMode::FrontBackLines | StencilMode::LeftRightLines => {
                let scale = h / 200.0;
                let mut lines = Vec::new();
                for &column in self.vanishing_columns() {
                    let vx = column * h;
                    for curve in self.curves.curves() {
                        for (flip, mirror) in
                            [(1.0, 1.0), (-1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)]
                        {
                            let line: Vec<Point> = curve
                                .curve_points()
                                .iter()
                                .step_by(50)
                                .map(|p| {
                                    Point::new(
                                        vx + flip * p.x * scale,
                                        h / 2.0 - mirror * p.y * scale,
                                    )
                                })
                                .filter(|p| (0.0..=h * 2.0).contains(&p.x))
                                .collect();
                            if line.len() > 1 {
                                lines.push(line);
                            }
                        }
                    }
                }
                lines
            }
            StencilMode::TwoPoint => match self.two_point_apex {
                Some(apex) => {
                    match equirect::geodesic_points(apex, h, equirect::DEFAULT_INCREMENT) {
                        Ok(points) => vec![points],
                        Err(err) => {
                            log::warn!("two-point guide curve failed: {err}");
                            Vec::new()
                        }
                    }
                }
                None => Vec::new(),
            },
        }
    }
}

impl WetStrokeHandler for StencilEngine {
    fn starting(&mut self, update: &mut WetStrokeUpdate) {
        self.state = StrokeState::Idle;
        let Some(first) = update.new_points.first().copied() else {
            update.disposition = Disposition::Completed;
            return;
        };

        match self.mode {
            StencilMode::None => {
                self.state = StrokeState::Passthrough;
                update.disposition = Disposition::Inking;
            }
            StencilMode::VerticalLines => {
                self.state = StrokeState::Vertical {
                    x: first.position.x,
                };
                update.disposition = Disposition::Inking;
            }
            StencilMode::FrontBackLines | StencilMode::LeftRightLines => {
                self.start_curve_mode(update);
            }
            StencilMode::TwoPoint => match self.two_point_apex {
                Some(apex) => {
                    self.state = StrokeState::Geodesic { apex };
                    self.snap_to_apex(apex, update);
                }
                None => {
                    // No geodesic defined yet; ink freely.
                    log::debug!("two-point stencil active without an apex");
                    self.state = StrokeState::Passthrough;
                    update.disposition = Disposition::Inking;
                }
            },
        }
    }

    fn continuing(&mut self, update: &mut WetStrokeUpdate) {
        self.snap(update);
    }

    fn stopping(&mut self, update: &mut WetStrokeUpdate) {
        self.snap(update);
        match self.state {
            StrokeState::Geodesic { .. } | StrokeState::Perspective { .. } => {
                update.disposition = Disposition::Completed;
            }
            _ => {}
        }
    }

    fn completed(&mut self, update: &mut WetStrokeUpdate) {
        self.snap(update);
        update.disposition = Disposition::Completed;
        self.state = StrokeState::Idle;
    }

    fn canceled(&mut self, _update: &mut WetStrokeUpdate) {
        self.state = StrokeState::Idle;
    }
}

#[cfg(test)]
mod test {
    use super::{SnapGeneration, StencilEngine, StencilMode};
    use crate::equirect::{self, Vertex};
    use sketch360_ink::geom::Point;
    use sketch360_ink::stroke::{DrawingAttributes, InkPoint};
    use sketch360_ink::wet::{Disposition, WetStrokeSource};

    const H: f64 = 1000.0;

    fn pt(x: f64, y: f64) -> InkPoint {
        InkPoint::new(Point::new(x, y), 1.0, 0.0, 0.0, 0)
    }

    fn engine(mode: StencilMode) -> WetStrokeSource<StencilEngine> {
        let mut engine = StencilEngine::new(H);
        engine.set_mode(mode);
        WetStrokeSource::new(engine)
    }

    #[test]
    fn none_mode_passes_through() {
        let mut source = engine(StencilMode::None);
        source.pressed(vec![pt(10.0, 20.0)], 0, DrawingAttributes::default());
        source.moved(vec![pt(30.0, 40.0)], 0);
        source.released(vec![pt(50.0, 60.0)], 0);
        let stroke = source.take_completed().unwrap();
        let positions: Vec<_> = stroke.points().iter().map(|p| p.position).collect();
        assert_eq!(
            positions,
            vec![
                Point::new(10.0, 20.0),
                Point::new(30.0, 40.0),
                Point::new(50.0, 60.0)
            ]
        );
    }

    #[test]
    fn vertical_lines_latch_first_x() {
        let mut source = engine(StencilMode::VerticalLines);
        source.pressed(vec![pt(100.0, 50.0)], 0, DrawingAttributes::default());
        source.moved(vec![pt(150.0, 80.0)], 0);
        source.released(vec![pt(200.0, 90.0)], 0);
        let stroke = source.take_completed().unwrap();
        assert_eq!(stroke.points().len(), 3);
        for point in stroke.points() {
            assert_eq!(point.position.x, 100.0);
        }
        assert_eq!(stroke.points()[2].position.y, 90.0);
    }

    #[test]
    fn front_back_cancels_on_anchor_touch() {
        let mut source = engine(StencilMode::FrontBackLines);
        let disposition = source.pressed(
            vec![pt(H, H / 2.0)],
            0,
            DrawingAttributes::default(),
        );
        assert_eq!(disposition, Disposition::Canceled);
        assert!(source.take_completed().is_none());
    }

    #[test]
    fn front_back_snaps_onto_one_geodesic() {
        let mut source = engine(StencilMode::FrontBackLines);
        source.pressed(vec![pt(1200.0, 300.0)], 0, DrawingAttributes::default());
        source.moved(vec![pt(1300.0, 500.0), pt(1400.0, 200.0)], 0);
        source.released(vec![pt(1500.0, 420.0)], 0);
        let stroke = source.take_completed().unwrap();

        // Recover the apex the engine used: it is the geodesic through the
        // anchor and the first (snapped) point.
        let anchor = Vertex::from_point(Point::new(H, H / 2.0), H);
        let first = Vertex::from_point(stroke.points()[0].position, H);
        let apex = equirect::apex_of(anchor, first).unwrap();

        for point in stroke.points() {
            let vertex = Vertex::from_point(point.position, H);
            let expected = equirect::elevation_at(apex, vertex.azimuth).unwrap();
            assert!((vertex.elevation - expected).abs() < 1e-6);
        }
        // Azimuth (x) of each input is preserved.
        assert_eq!(stroke.points()[1].position.x, 1300.0);
    }

    #[test]
    fn left_right_anchor_differs() {
        let mut source = engine(StencilMode::LeftRightLines);
        // The front anchor is not the left/right anchor; a touch there is
        // a normal stroke.
        let disposition = source.pressed(vec![pt(H, H / 2.0)], 0, DrawingAttributes::default());
        assert_eq!(disposition, Disposition::Inking);
        // But the left/right anchor cancels.
        let mut source = engine(StencilMode::LeftRightLines);
        let disposition = source.pressed(
            vec![pt(H / 2.0, H / 2.0)],
            0,
            DrawingAttributes::default(),
        );
        assert_eq!(disposition, Disposition::Canceled);
    }

    #[test]
    fn two_point_uses_external_apex() {
        let mut source = engine(StencilMode::TwoPoint);
        let apex = Vertex::new(0.4, 0.9);
        source.handler_mut().set_two_point_apex(apex);

        source.pressed(vec![pt(800.0, 300.0)], 0, DrawingAttributes::default());
        source.released(vec![pt(900.0, 450.0)], 0);
        let stroke = source.take_completed().unwrap();
        for point in stroke.points() {
            let vertex = Vertex::from_point(point.position, H);
            let expected = equirect::elevation_at(apex, vertex.azimuth).unwrap();
            assert!((vertex.elevation - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn two_point_without_apex_inks_freely() {
        let mut source = engine(StencilMode::TwoPoint);
        source.pressed(vec![pt(800.0, 300.0)], 0, DrawingAttributes::default());
        source.released(vec![pt(900.0, 450.0)], 0);
        let stroke = source.take_completed().unwrap();
        assert_eq!(stroke.points()[0].position, Point::new(800.0, 300.0));
    }

    #[test]
    fn perspective_generation_latches_and_cancels() {
        let mut engine = StencilEngine::new(H);
        engine.set_mode(StencilMode::FrontBackLines);
        engine.set_generation(SnapGeneration::Perspective);
        let mut source = WetStrokeSource::new(engine);

        // Touch at the front vanishing point cancels, same as geodesic.
        assert_eq!(
            source.pressed(vec![pt(H, H / 2.0)], 0, DrawingAttributes::default()),
            Disposition::Canceled
        );

        // A normal stroke stays between its bracketing curves and keeps x.
        source.pressed(vec![pt(1200.0, 350.0)], 0, DrawingAttributes::default());
        source.moved(vec![pt(1350.0, 250.0)], 0);
        source.released(vec![pt(1500.0, 400.0)], 0);
        let stroke = source.take_completed().unwrap();
        assert_eq!(stroke.points().len(), 3);
        assert_eq!(stroke.points()[1].position.x, 1350.0);
        // Upper-half stroke stays in the upper half.
        for point in stroke.points() {
            assert!(point.position.y <= H / 2.0);
        }
    }

    #[test]
    fn guides_exist_for_each_mode() {
        let mut engine = StencilEngine::new(H);
        assert!(engine.guide_polylines().is_empty());

        engine.set_mode(StencilMode::VerticalLines);
        let vertical = engine.guide_polylines();
        // 36 steps across the canvas; the float accumulation may or may not
        // land the closing line exactly on the right edge.
        assert!((36..=37).contains(&vertical.len()));

        engine.set_mode(StencilMode::FrontBackLines);
        assert!(!engine.guide_polylines().is_empty());

        engine.set_mode(StencilMode::TwoPoint);
        assert!(engine.guide_polylines().is_empty());
        engine.set_two_point_apex(Vertex::new(0.0, 0.5));
        assert_eq!(engine.guide_polylines().len(), 1);
    }

    #[test]
    fn mode_round_trips_through_strings() {
        use std::str::FromStr;
        assert_eq!(StencilMode::VerticalLines.to_string(), "VerticalLines");
        assert_eq!(
            StencilMode::from_str("TwoPoint").unwrap(),
            StencilMode::TwoPoint
        );
        assert!(StencilMode::from_str("Sideways").is_err());
    }
}
