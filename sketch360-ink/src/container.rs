//! # Stroke container
//!
//! The single synchronized home of a document's dry strokes. The UI thread
//! appends committed strokes while a background save takes a snapshot; one
//! mutex around the vector is all the coordination either side needs.
//! Callers never reach the vector directly - add/remove/replace/snapshot is
//! the whole surface.

use parking_lot::Mutex;

use crate::stroke::InkStroke;

#[derive(Default)]
pub struct StrokeContainer {
    strokes: Mutex<Vec<InkStroke>>,
}

impl StrokeContainer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A consistent copy of every stroke, in insertion (render) order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<InkStroke> {
        self.strokes.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strokes.lock().len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strokes.lock().is_empty()
    }

    pub fn add(&self, stroke: InkStroke) {
        self.strokes.lock().push(stroke);
    }

    pub fn add_all(&self, strokes: impl IntoIterator<Item = InkStroke>) {
        self.strokes.lock().extend(strokes);
    }

    /// Remove a stroke by id. Returns the removed stroke so erase flows can
    /// keep it around (the caller decides whether it is resurrectable).
    pub fn remove(&self, id: &str) -> Option<InkStroke> {
        let mut strokes = self.strokes.lock();
        let index = strokes.iter().position(|s| s.id() == id)?;
        Some(strokes.remove(index))
    }

    /// Drop everything, returning the erased strokes.
    pub fn clear(&self) -> Vec<InkStroke> {
        std::mem::take(&mut *self.strokes.lock())
    }

    /// Replace the whole collection in one locked step.
    pub fn replace_all(&self, strokes: impl IntoIterator<Item = InkStroke>) {
        let mut new: Vec<InkStroke> = strokes.into_iter().collect();
        std::mem::swap(&mut *self.strokes.lock(), &mut new);
    }

    /// Run `f` over the strokes without cloning. The lock is held for the
    /// duration - keep `f` short and never reenter the container from it.
    pub fn with_strokes<R>(&self, f: impl FnOnce(&[InkStroke]) -> R) -> R {
        f(&self.strokes.lock())
    }
}
