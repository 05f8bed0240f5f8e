//! # Ink strokes
//!
//! A stroke is the persisted record of one pen gesture: ordered pressure/tilt
//! samples plus the drawing attributes they were captured under. Render
//! state (compiled paths, paints) lives in [`crate::render::RenderCache`],
//! keyed by the stroke's id and revision - never on the stroke itself.

use crate::color::Color;
use crate::geom::{Point, Rect};

/// One pointer sample of a stroke.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InkPoint {
    pub position: Point,
    pub pressure: f32,
    #[serde(default)]
    pub tilt_x: f32,
    #[serde(default)]
    pub tilt_y: f32,
    /// Capture time, milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: u64,
}

impl InkPoint {
    #[must_use]
    pub fn new(position: Point, pressure: f32, tilt_x: f32, tilt_y: f32, timestamp: u64) -> Self {
        Self {
            position,
            pressure,
            tilt_x,
            tilt_y,
            timestamp,
        }
    }
    /// A sample stamped with the current wall-clock time.
    #[must_use]
    pub fn now(position: Point, pressure: f32) -> Self {
        let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
        Self::new(position, pressure, 0.0, 0.0, millis)
    }
}

/// Shape of the pen tip, selects the stroke cap for fixed-width rendering.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PenTip {
    #[default]
    Circle,
    Rectangle,
}

/// Pen lays down flat color; pencil composites a graphite noise texture.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum InkKind {
    #[default]
    Pen,
    Pencil,
}

#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DrawingAttributes {
    pub color: Color,
    /// Pen width in canvas pixels.
    pub size: f32,
    pub pen_tip: PenTip,
    pub kind: InkKind,
    /// When set, pressure is ignored and the stroke renders at uniform width.
    pub ignore_pressure: bool,
}

impl Default for DrawingAttributes {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            size: 4.0,
            pen_tip: PenTip::Circle,
            kind: InkKind::Pen,
            ignore_pressure: false,
        }
    }
}

/// An ordered, mutable sequence of ink points with cached bounds.
///
/// The bounding rect is always the union of each point's square footprint of
/// side [`DrawingAttributes::size`]; it grows incrementally on append and is
/// rebuilt on wholesale changes. Every mutation bumps `revision`, which is
/// what invalidates any cached render path downstream.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct InkStroke {
    #[serde(default = "new_stroke_id")]
    id: String,
    points: Vec<InkPoint>,
    #[serde(default)]
    attributes: DrawingAttributes,
    #[serde(skip)]
    bounds: Rect,
    #[serde(skip)]
    revision: u64,
}

fn new_stroke_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl InkStroke {
    #[must_use]
    pub fn new(attributes: DrawingAttributes) -> Self {
        Self {
            id: new_stroke_id(),
            points: Vec::new(),
            attributes,
            bounds: Rect::ZERO,
            revision: 0,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
    #[must_use]
    pub fn points(&self) -> &[InkPoint] {
        &self.points
    }
    #[must_use]
    pub fn attributes(&self) -> &DrawingAttributes {
        &self.attributes
    }
    /// Union of all point footprints. [`Rect::ZERO`] while the stroke is
    /// empty.
    #[must_use]
    pub fn bounding_rect(&self) -> Rect {
        self.bounds
    }
    /// Monotonic mutation counter. Render caches compare against this.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }
    /// Earliest point timestamp, `None` for an empty stroke.
    #[must_use]
    pub fn start_time(&self) -> Option<u64> {
        self.points.iter().map(|p| p.timestamp).min()
    }

    /// Append a sample. A point at the last point's exact position only
    /// refreshes that point's pressure - digitizers repeat coordinates while
    /// pressure ramps up and duplicate positions break outline mitering.
    pub fn add(&mut self, point: InkPoint) {
        if let Some(last) = self.points.last_mut() {
            if last.position == point.position {
                last.pressure = point.pressure;
                self.revision += 1;
                return;
            }
        }
        let footprint = Rect::centered_square(point.position, f64::from(self.attributes.size));
        self.bounds = if self.points.is_empty() {
            footprint
        } else {
            self.bounds.union(footprint)
        };
        self.points.push(point);
        self.revision += 1;
    }

    /// Replace the whole point sequence and rebuild bounds.
    pub fn set_points(&mut self, points: impl IntoIterator<Item = InkPoint>) {
        self.points = points.into_iter().collect();
        self.revision += 1;
        self.update_bounds();
    }

    /// Swap the drawing attributes. Bounds depend on pen size, so they are
    /// rebuilt too.
    pub fn set_attributes(&mut self, attributes: DrawingAttributes) {
        self.attributes = attributes;
        self.revision += 1;
        self.update_bounds();
    }

    /// Recompute bounds from scratch. Called after deserialization, where
    /// the cached rect is skipped on the wire.
    pub fn update_bounds(&mut self) {
        let size = f64::from(self.attributes.size);
        self.bounds = self
            .points
            .iter()
            .map(|p| Rect::centered_square(p.position, size))
            .reduce(Rect::union)
            .unwrap_or(Rect::ZERO);
    }

    /// Repair pass for documents written by older builds: a stroke color
    /// serialized with zero alpha was meant to be opaque.
    pub fn repair_loaded(&mut self) {
        if self.attributes.color.a == 0 {
            self.attributes.color = self.attributes.color.with_alpha(0xFF);
        }
        self.update_bounds();
    }
}
