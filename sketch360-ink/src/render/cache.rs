//! Arena-owned render caches.
//!
//! Compiled paths and pencil tiles are expensive enough to keep, but they
//! must never ride on the persisted stroke data. The cache owns them,
//! keyed by stroke id, and validates against the stroke's revision counter
//! on every lookup - a mutated stroke rebuilds its entry on next draw.

use std::collections::HashMap;
use std::sync::Arc;

use crate::stroke::{InkKind, InkStroke};

use super::{background, path};

pub(super) struct CacheEntry {
    revision: u64,
    /// `None` when the stroke is degenerate (0 or 1 points) and renders as
    /// a dot instead of a path.
    pub path: Option<tiny_skia::Path>,
    /// Pencil strokes carry their graphite tile; pen strokes paint flat.
    pub tile: Option<Arc<tiny_skia::Pixmap>>,
}

#[derive(Default)]
pub struct RenderCache {
    entries: HashMap<String, CacheEntry>,
}

impl RenderCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the entry for `stroke`, rebuilding it if missing or stale.
    pub(super) fn entry(&mut self, stroke: &InkStroke) -> &CacheEntry {
        let entry = self
            .entries
            .entry(stroke.id().to_owned())
            .or_insert_with(|| CacheEntry {
                // Force a build on first sight.
                revision: u64::MAX,
                path: None,
                tile: None,
            });
        if entry.revision != stroke.revision() {
            entry.path = build_path(stroke);
            entry.tile = build_tile(stroke);
            entry.revision = stroke.revision();
        }
        entry
    }

    /// Drop one stroke's compiled state (erase, point mutation without a
    /// revision bump cannot happen, but erased ids should not linger).
    pub fn invalidate(&mut self, stroke_id: &str) {
        self.entries.remove(stroke_id);
    }

    /// Keep only entries whose id passes the filter. Called with the live
    /// document ids after bulk operations.
    pub fn retain(&mut self, mut live: impl FnMut(&str) -> bool) {
        self.entries.retain(|id, _| live(id));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(super) fn build_path(stroke: &InkStroke) -> Option<tiny_skia::Path> {
    if stroke.attributes().ignore_pressure {
        path::create_spline_path(stroke)
    } else {
        path::create_outline_path(stroke)
    }
}

pub(super) fn build_tile(stroke: &InkStroke) -> Option<Arc<tiny_skia::Pixmap>> {
    match stroke.attributes().kind {
        InkKind::Pencil => Some(Arc::new(background::pencil_tile(stroke.attributes().color))),
        InkKind::Pen => None,
    }
}

#[cfg(test)]
mod test {
    use super::RenderCache;
    use crate::geom::Point;
    use crate::stroke::{DrawingAttributes, InkPoint, InkStroke};

    fn pt(x: f64, y: f64) -> InkPoint {
        InkPoint::new(Point::new(x, y), 1.0, 0.0, 0.0, 0)
    }

    #[test]
    fn rebuilds_on_revision_change() {
        let mut cache = RenderCache::new();
        let mut stroke = InkStroke::new(DrawingAttributes::default());
        stroke.add(pt(0.0, 0.0));

        // One point: degenerate, no path.
        assert!(cache.entry(&stroke).path.is_none());

        stroke.add(pt(10.0, 10.0));
        // Same id, new revision: path appears.
        assert!(cache.entry(&stroke).path.is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_and_retain() {
        let mut cache = RenderCache::new();
        let mut a = InkStroke::new(DrawingAttributes::default());
        a.add(pt(0.0, 0.0));
        a.add(pt(1.0, 1.0));
        let mut b = InkStroke::new(DrawingAttributes::default());
        b.add(pt(2.0, 2.0));
        b.add(pt(3.0, 3.0));

        cache.entry(&a);
        cache.entry(&b);
        assert_eq!(cache.len(), 2);

        cache.invalidate(a.id());
        assert_eq!(cache.len(), 1);

        cache.retain(|_| false);
        assert!(cache.is_empty());
    }
}
