//! # Wet strokes
//!
//! A stroke is "wet" while the pointer is still down: every batch of new
//! input points passes through a [`WetStrokeHandler`] which may rewrite them
//! (stencil snapping) or end the stroke early. Once committed it is "dry"
//! and lives in the [`crate::container::StrokeContainer`].
//!
//! The lifecycle is an explicit state machine rather than event wiring: one
//! entry point per pointer transition, each returning the resulting
//! [`Disposition`]. Phases always run in the order
//! starting -> continuing* -> stopping -> completed, with canceled possible
//! at any step. That makes the whole pipeline drivable from a unit test
//! with a canned list of points.

use crate::stroke::{DrawingAttributes, InkPoint, InkStroke};

/// Outcome of one wet-stroke phase.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Disposition {
    /// Keep inking.
    #[default]
    Inking,
    /// Finalize the stroke.
    Completed,
    /// Discard the stroke entirely.
    Canceled,
}

/// One batch of pointer input, mutable by the handler in flight.
#[derive(Clone, Debug, Default)]
pub struct WetStrokeUpdate {
    pub new_points: Vec<InkPoint>,
    pub disposition: Disposition,
    pub pointer_id: u32,
}

impl WetStrokeUpdate {
    #[must_use]
    pub fn new(new_points: Vec<InkPoint>, pointer_id: u32) -> Self {
        Self {
            new_points,
            disposition: Disposition::Inking,
            pointer_id,
        }
    }
}

/// A consumer of wet-stroke phases. Implementations rewrite
/// [`WetStrokeUpdate::new_points`] in place and set the disposition.
pub trait WetStrokeHandler {
    fn starting(&mut self, update: &mut WetStrokeUpdate);
    fn continuing(&mut self, update: &mut WetStrokeUpdate);
    fn stopping(&mut self, update: &mut WetStrokeUpdate);
    fn completed(&mut self, update: &mut WetStrokeUpdate);
    fn canceled(&mut self, update: &mut WetStrokeUpdate);
}

/// Pass-through handler: no constraint, every point inks as given.
#[derive(Default)]
pub struct Unconstrained;

impl WetStrokeHandler for Unconstrained {
    fn starting(&mut self, _: &mut WetStrokeUpdate) {}
    fn continuing(&mut self, _: &mut WetStrokeUpdate) {}
    fn stopping(&mut self, _: &mut WetStrokeUpdate) {}
    fn completed(&mut self, _: &mut WetStrokeUpdate) {}
    fn canceled(&mut self, _: &mut WetStrokeUpdate) {}
}

struct WetStroke {
    stroke: InkStroke,
    pointer_id: u32,
}

/// Drives the wet-stroke lifecycle over a handler, accumulating the dry
/// stroke as it goes. Only one stroke is in flight at a time; pointer events
/// for any other pointer id are dropped while one is wet.
pub struct WetStrokeSource<H> {
    handler: H,
    wet: Option<WetStroke>,
    finished: Option<InkStroke>,
}

impl<H: WetStrokeHandler> WetStrokeSource<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            wet: None,
            finished: None,
        }
    }

    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }
    #[must_use]
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }
    /// Is a stroke currently in flight?
    #[must_use]
    pub fn is_wet(&self) -> bool {
        self.wet.is_some()
    }

    /// Pointer down: fires `starting`, then `continuing` on the same batch.
    pub fn pressed(
        &mut self,
        points: Vec<InkPoint>,
        pointer_id: u32,
        attributes: DrawingAttributes,
    ) -> Disposition {
        if self.wet.is_some() {
            // Strictly serial per stroke: a second contact cannot start
            // until the first is released or canceled.
            log::debug!("pressed for pointer {pointer_id} while a stroke is wet, dropping");
            return Disposition::Canceled;
        }
        let mut update = WetStrokeUpdate::new(points, pointer_id);
        self.handler.starting(&mut update);
        if update.disposition == Disposition::Canceled {
            self.handler.canceled(&mut update);
            return Disposition::Canceled;
        }
        self.handler.continuing(&mut update);
        if update.disposition == Disposition::Completed {
            self.handler.completed(&mut update);
        }

        let mut stroke = InkStroke::new(attributes);
        for point in update.new_points.drain(..) {
            stroke.add(point);
        }
        match update.disposition {
            Disposition::Canceled => Disposition::Canceled,
            Disposition::Completed => {
                self.finish(stroke);
                Disposition::Completed
            }
            Disposition::Inking => {
                self.wet = Some(WetStroke { stroke, pointer_id });
                Disposition::Inking
            }
        }
    }

    /// Pointer moved while down: fires `continuing`, and `completed` if the
    /// handler finalizes early.
    pub fn moved(&mut self, points: Vec<InkPoint>, pointer_id: u32) -> Disposition {
        let Some(wet) = self.wet.as_mut() else {
            return Disposition::Canceled;
        };
        if wet.pointer_id != pointer_id {
            log::debug!("moved for pointer {pointer_id} does not match the wet stroke, dropping");
            return Disposition::Canceled;
        }
        let mut update = WetStrokeUpdate::new(points, pointer_id);
        self.handler.continuing(&mut update);
        if update.disposition == Disposition::Completed {
            self.handler.completed(&mut update);
        }
        self.absorb(update)
    }

    /// Pointer up: fires `stopping`, then `completed` unless canceled.
    pub fn released(&mut self, points: Vec<InkPoint>, pointer_id: u32) -> Disposition {
        let Some(wet) = self.wet.as_mut() else {
            return Disposition::Canceled;
        };
        if wet.pointer_id != pointer_id {
            log::debug!("released for pointer {pointer_id} does not match the wet stroke, dropping");
            return Disposition::Canceled;
        }
        let mut update = WetStrokeUpdate::new(points, pointer_id);
        self.handler.stopping(&mut update);
        if update.disposition == Disposition::Canceled {
            self.handler.canceled(&mut update);
            self.wet = None;
            return Disposition::Canceled;
        }
        // Release always terminates the stroke.
        update.disposition = Disposition::Completed;
        self.handler.completed(&mut update);
        self.absorb(update)
    }

    /// Input cancellation (palm rejection, focus loss). The wet stroke is
    /// discarded without ever drying.
    pub fn cancel(&mut self) -> Disposition {
        if let Some(wet) = self.wet.take() {
            let mut update = WetStrokeUpdate::new(Vec::new(), wet.pointer_id);
            update.disposition = Disposition::Canceled;
            self.handler.canceled(&mut update);
        }
        Disposition::Canceled
    }

    /// Take the most recently completed dry stroke, if any.
    pub fn take_completed(&mut self) -> Option<InkStroke> {
        self.finished.take()
    }

    fn absorb(&mut self, mut update: WetStrokeUpdate) -> Disposition {
        // Wet is always Some here, checked by callers.
        let wet = self.wet.as_mut().expect("absorb with no wet stroke");
        for point in update.new_points.drain(..) {
            wet.stroke.add(point);
        }
        match update.disposition {
            Disposition::Canceled => {
                self.wet = None;
                Disposition::Canceled
            }
            Disposition::Completed => {
                let wet = self.wet.take().expect("checked above");
                self.finish(wet.stroke);
                Disposition::Completed
            }
            Disposition::Inking => Disposition::Inking,
        }
    }

    fn finish(&mut self, stroke: InkStroke) {
        // An empty completed stroke carries no ink; nothing to dry.
        if stroke.points().is_empty() {
            return;
        }
        self.finished = Some(stroke);
    }
}

#[cfg(test)]
mod test {
    use super::{Disposition, Unconstrained, WetStrokeHandler, WetStrokeSource, WetStrokeUpdate};
    use crate::geom::Point;
    use crate::stroke::{DrawingAttributes, InkPoint};

    fn pt(x: f64, y: f64) -> InkPoint {
        InkPoint::new(Point::new(x, y), 1.0, 0.0, 0.0, 0)
    }

    #[test]
    fn passthrough_lifecycle() {
        let mut source = WetStrokeSource::new(Unconstrained);
        assert_eq!(
            source.pressed(vec![pt(1.0, 1.0)], 7, DrawingAttributes::default()),
            Disposition::Inking
        );
        assert!(source.is_wet());
        assert_eq!(source.moved(vec![pt(2.0, 2.0)], 7), Disposition::Inking);
        assert_eq!(source.released(vec![pt(3.0, 3.0)], 7), Disposition::Completed);
        let stroke = source.take_completed().unwrap();
        assert_eq!(stroke.points().len(), 3);
        assert!(!source.is_wet());
    }

    #[test]
    fn cancel_discards() {
        let mut source = WetStrokeSource::new(Unconstrained);
        source.pressed(vec![pt(1.0, 1.0)], 0, DrawingAttributes::default());
        assert_eq!(source.cancel(), Disposition::Canceled);
        assert!(source.take_completed().is_none());
        assert!(!source.is_wet());
    }

    #[test]
    fn second_pointer_dropped_while_wet() {
        let mut source = WetStrokeSource::new(Unconstrained);
        source.pressed(vec![pt(1.0, 1.0)], 0, DrawingAttributes::default());
        assert_eq!(
            source.pressed(vec![pt(9.0, 9.0)], 1, DrawingAttributes::default()),
            Disposition::Canceled
        );
        assert_eq!(source.moved(vec![pt(8.0, 8.0)], 1), Disposition::Canceled);
        // The original stroke is unaffected.
        assert_eq!(source.released(vec![pt(2.0, 2.0)], 0), Disposition::Completed);
        assert_eq!(source.take_completed().unwrap().points().len(), 2);
    }

    /// A handler that cancels every stroke at starting.
    struct CancelAll;
    impl WetStrokeHandler for CancelAll {
        fn starting(&mut self, update: &mut WetStrokeUpdate) {
            update.disposition = Disposition::Canceled;
        }
        fn continuing(&mut self, _: &mut WetStrokeUpdate) {}
        fn stopping(&mut self, _: &mut WetStrokeUpdate) {}
        fn completed(&mut self, _: &mut WetStrokeUpdate) {}
        fn canceled(&mut self, _: &mut WetStrokeUpdate) {}
    }

    #[test]
    fn cancel_at_starting_never_goes_wet() {
        let mut source = WetStrokeSource::new(CancelAll);
        assert_eq!(
            source.pressed(vec![pt(1.0, 1.0)], 0, DrawingAttributes::default()),
            Disposition::Canceled
        );
        assert!(!source.is_wet());
        assert!(source.take_completed().is_none());
    }

    #[test]
    fn empty_completed_stroke_is_dropped() {
        let mut source = WetStrokeSource::new(Unconstrained);
        source.pressed(Vec::new(), 0, DrawingAttributes::default());
        source.released(Vec::new(), 0);
        assert!(source.take_completed().is_none());
    }
}
