//! # Sketch document
//!
//! [`SketchData`] is the top-level document: canvas dimensions, background,
//! name, start time, and the stroke collection. One session owns exactly one
//! of these; the scalar fields sit behind their own lock so a background
//! save can snapshot a consistent document while the UI thread keeps
//! appending strokes to the container.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use sketch360_ink::color::Color;
use sketch360_ink::container::StrokeContainer;
use sketch360_ink::stroke::InkStroke;

/// Tail added to the last stroke's start when reporting a duration, so a
/// single-stroke sketch never reads as zero seconds.
const DURATION_TAIL_MS: i64 = 250;

/// The scalar document fields, cloned out as one consistent unit.
#[derive(Clone, Debug, PartialEq)]
pub struct SketchInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub background_color: Color,
    pub start: DateTime<Utc>,
}

impl Default for SketchInfo {
    fn default() -> Self {
        Self {
            name: "Sketch".to_owned(),
            // 2:1, the equirectangular convention.
            width: 2000,
            height: 1000,
            background_color: Color::BEIGE,
            start: Utc::now(),
        }
    }
}

pub struct SketchData {
    info: Mutex<SketchInfo>,
    strokes: StrokeContainer,
}

impl Default for SketchData {
    fn default() -> Self {
        Self::new()
    }
}

impl SketchData {
    #[must_use]
    pub fn new() -> Self {
        Self {
            info: Mutex::new(SketchInfo::default()),
            strokes: StrokeContainer::new(),
        }
    }

    #[must_use]
    pub fn with_info(info: SketchInfo) -> Self {
        Self {
            info: Mutex::new(info),
            strokes: StrokeContainer::new(),
        }
    }

    /// A consistent copy of the scalar fields.
    #[must_use]
    pub fn info(&self) -> SketchInfo {
        self.info.lock().clone()
    }

    /// Mutate the scalar fields under the lock.
    pub fn update_info(&self, f: impl FnOnce(&mut SketchInfo)) {
        f(&mut self.info.lock());
    }

    #[must_use]
    pub fn strokes(&self) -> &StrokeContainer {
        &self.strokes
    }

    /// Span from the first stroke's start to the last stroke's start, plus a
    /// short tail. Zero when no stroke carries a timestamp.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        let range = self.strokes.with_strokes(|strokes| {
            let mut times = strokes.iter().filter_map(InkStroke::start_time);
            let first = times.next()?;
            Some(times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
        });
        match range {
            Some((min, max)) => {
                chrono::Duration::milliseconds((max - min) as i64 + DURATION_TAIL_MS)
            }
            None => chrono::Duration::zero(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{SketchData, SketchInfo};
    use sketch360_ink::color::Color;
    use sketch360_ink::geom::Point;
    use sketch360_ink::stroke::{DrawingAttributes, InkPoint, InkStroke};

    fn stroke_at(timestamp: u64) -> InkStroke {
        let mut stroke = InkStroke::new(DrawingAttributes::default());
        stroke.add(InkPoint::new(Point::new(1.0, 1.0), 1.0, 0.0, 0.0, timestamp));
        stroke
    }

    #[test]
    fn defaults_match_canvas_convention() {
        let data = SketchData::new();
        let info = data.info();
        assert_eq!(info.width, 2000);
        assert_eq!(info.height, 1000);
        assert_eq!(info.background_color, Color::BEIGE);
        assert_eq!(info.name, "Sketch");
    }

    #[test]
    fn update_info_is_atomic() {
        let data = SketchData::new();
        data.update_info(|info| {
            info.name = "Harbor".to_owned();
            info.background_color = Color::WHITE;
        });
        let info = data.info();
        assert_eq!(info.name, "Harbor");
        assert_eq!(info.background_color, Color::WHITE);
    }

    #[test]
    fn duration_spans_strokes_with_tail() {
        let data = SketchData::new();
        assert_eq!(data.duration(), chrono::Duration::zero());

        data.strokes().add(stroke_at(1_000));
        data.strokes().add(stroke_at(4_000));
        assert_eq!(data.duration(), chrono::Duration::milliseconds(3_250));
    }

    #[test]
    fn info_overrides() {
        let info = SketchInfo {
            width: 4000,
            height: 2000,
            ..SketchInfo::default()
        };
        let data = SketchData::with_info(info.clone());
        assert_eq!(data.info(), info);
    }
}
