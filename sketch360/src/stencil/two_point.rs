//! Two-point stencil input: two draggable anchor points defining an
//! arbitrary geodesic.
//!
//! The handler owns the anchor positions and the drag state; it feeds the
//! recomputed apex into the [`StencilEngine`](super::StencilEngine) whenever
//! an anchor moves. Hit testing divides a fixed screen radius by the zoom
//! factor so the touch target stays constant in canvas units.

use sketch360_ink::geom::Point;

use crate::equirect::{self, GeometryError, Vertex};

use super::{StencilEngine, StencilMode};

/// On-screen hit radius, divided by the current zoom factor.
pub const HIT_RADIUS: f64 = 60.0;

/// Which anchor a touch grabbed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TouchTarget {
    #[default]
    None,
    First,
    Second,
}

/// Pointer phase, as delivered by the canvas view.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    Pressed,
    Moved,
    Released,
}

pub struct TwoPointStencil {
    point1: Point,
    point2: Point,
    touching: TouchTarget,
    start: Point,
}

impl Default for TwoPointStencil {
    fn default() -> Self {
        Self {
            point1: Point::new(100.0, 100.0),
            point2: Point::new(335.0, 284.0),
            touching: TouchTarget::None,
            start: Point::default(),
        }
    }
}

impl TwoPointStencil {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn point1(&self) -> Point {
        self.point1
    }
    #[must_use]
    pub fn point2(&self) -> Point {
        self.point2
    }

    /// The spherical vertex of one anchor.
    pub fn vertex(&self, canvas_height: f64, first: bool) -> Result<Vertex, GeometryError> {
        if canvas_height <= 0.0 {
            return Err(GeometryError::NonPositiveHeight(canvas_height));
        }
        let point = if first { self.point1 } else { self.point2 };
        Ok(Vertex::from_point(point, canvas_height))
    }

    /// The apex of the geodesic through both anchors.
    pub fn apex(&self, canvas_height: f64) -> Result<Vertex, GeometryError> {
        equirect::apex_of(
            self.vertex(canvas_height, true)?,
            self.vertex(canvas_height, false)?,
        )
    }

    /// Which anchor, if any, a touch at `location` grabs at the given zoom.
    #[must_use]
    pub fn hit_test(&self, location: Point, zoom_factor: f64) -> TouchTarget {
        if zoom_factor <= 0.0 {
            return TouchTarget::None;
        }
        let radius = HIT_RADIUS / zoom_factor;
        if location.distance(self.point1) < radius {
            TouchTarget::First
        } else if location.distance(self.point2) < radius {
            TouchTarget::Second
        } else {
            TouchTarget::None
        }
    }

    /// Process a touch event in canvas coordinates. Returns `true` when the
    /// event was consumed (and the caller should redraw).
    ///
    /// Only active while the engine is in two-point mode. Dragging an anchor
    /// recomputes the apex and installs it on the engine; a drag that makes
    /// the anchors coincident leaves the previous apex untouched, since no
    /// geodesic exists through a single point.
    pub fn touch(
        &mut self,
        engine: &mut StencilEngine,
        phase: TouchPhase,
        location: Point,
        zoom_factor: f64,
    ) -> bool {
        if engine.mode() != StencilMode::TwoPoint {
            return false;
        }
        if zoom_factor <= 0.0 {
            log::warn!("ignoring two-point touch with zoom factor {zoom_factor}");
            return false;
        }

        let delta_x = location.x - self.start.x;
        let delta_y = location.y - self.start.y;

        match phase {
            TouchPhase::Pressed => {
                self.touching = self.hit_test(location, zoom_factor);
                if self.touching == TouchTarget::None {
                    return false;
                }
                self.start = location;
                true
            }
            TouchPhase::Moved => {
                let handled = self.drag(engine, delta_x, delta_y);
                self.start = location;
                handled
            }
            TouchPhase::Released => {
                let handled = self.drag(engine, delta_x, delta_y);
                self.touching = TouchTarget::None;
                handled
            }
        }
    }

    fn drag(&mut self, engine: &mut StencilEngine, delta_x: f64, delta_y: f64) -> bool {
        match self.touching {
            TouchTarget::None => false,
            TouchTarget::First => {
                self.point1 = self.point1.offset(delta_x, delta_y);
                self.update_apex(engine);
                true
            }
            TouchTarget::Second => {
                self.point2 = self.point2.offset(delta_x, delta_y);
                self.update_apex(engine);
                true
            }
        }
    }

    fn update_apex(&self, engine: &mut StencilEngine) {
        // Coincident anchors define no geodesic; skip rather than divide by
        // zero inside the apex derivation.
        if self.point1 == self.point2 {
            return;
        }
        match self.apex(engine.canvas_height()) {
            Ok(apex) => engine.set_two_point_apex(apex),
            Err(err) => log::debug!("two-point apex not updated: {err}"),
        }
    }

    /// The two guide discs to overlay, as (center, radius) in canvas units.
    #[must_use]
    pub fn guide_discs(&self, zoom_factor: f64) -> [(Point, f64); 2] {
        let radius = HIT_RADIUS / zoom_factor.max(f64::MIN_POSITIVE);
        [(self.point1, radius), (self.point2, radius)]
    }
}
