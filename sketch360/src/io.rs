//! # Document format
//!
//! On disk a sketch is a `*.sketch360` zip archive holding `sketch360.json`
//! (the UTF-8 document) and `sketch.jpeg` (a rendered preview that
//! photo-sphere viewers can show without understanding the JSON). The JSON
//! body uses hex-string colors and an invariant `yyyy-MM-dd HH:mm:ssZ`
//! timestamp.

use std::io::{Read, Write};

use chrono::{DateTime, Utc};

use sketch360_ink::render::{self, RenderError};
use sketch360_ink::stroke::InkStroke;
use sketch360_ink::Color;

use crate::data::{SketchData, SketchInfo};

pub const JSON_ENTRY: &str = "sketch360.json";
pub const PREVIEW_ENTRY: &str = "sketch.jpeg";
pub const SKETCH_EXTENSION: &str = "sketch360";

#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("document serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("archive is missing its {0} entry")]
    MissingEntry(&'static str),
    #[error("preview render failed: {0}")]
    Render(#[from] RenderError),
}

/// The wire shape of a document: a plain snapshot, no locks, serde-friendly.
#[derive(serde::Serialize, serde::Deserialize)]
pub struct SketchDocument {
    pub name: String,
    #[serde(with = "universal_time")]
    pub start: DateTime<Utc>,
    pub background_color: Color,
    pub width: u32,
    pub height: u32,
    pub ink_strokes: Vec<InkStroke>,
}

/// The invariant-culture universal format, `2024-03-01 09:30:00Z`.
mod universal_time {
    use chrono::{DateTime, NaiveDateTime, Utc};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%SZ";

    pub fn serialize<S: serde::Serializer>(
        time: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        use serde::Deserialize;
        let text = <std::borrow::Cow<'_, str>>::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

/// Snapshot a live document into its wire shape, under the container lock.
#[must_use]
pub fn snapshot(data: &SketchData) -> SketchDocument {
    let info = data.info();
    SketchDocument {
        name: info.name,
        start: info.start,
        background_color: info.background_color,
        width: info.width,
        height: info.height,
        ink_strokes: data.strokes().snapshot(),
    }
}

/// Rebuild a live document from its wire shape, repairing stroke colors and
/// bounds dropped by serialization.
#[must_use]
pub fn restore(mut document: SketchDocument) -> SketchData {
    for stroke in &mut document.ink_strokes {
        stroke.repair_loaded();
    }
    let data = SketchData::with_info(SketchInfo {
        name: document.name,
        width: document.width,
        height: document.height,
        background_color: document.background_color,
        start: document.start,
    });
    data.strokes().replace_all(document.ink_strokes);
    data
}

pub fn to_json(data: &SketchData) -> Result<String, DocumentError> {
    Ok(serde_json::to_string_pretty(&snapshot(data))?)
}

pub fn from_json(json: &str) -> Result<SketchData, DocumentError> {
    let document: SketchDocument = serde_json::from_str(json)?;
    Ok(restore(document))
}

/// Package the document as a `.sketch360` archive: JSON plus a full-size
/// JPEG preview.
pub fn write_archive(data: &SketchData) -> Result<Vec<u8>, DocumentError> {
    let json = to_json(data)?;
    let info = data.info();
    let preview = render::render_image(
        info.width,
        info.height,
        info.background_color,
        &data.strokes().snapshot(),
        info.width,
    )?;

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file(JSON_ENTRY, options)?;
        writer.write_all(json.as_bytes())?;
        writer.start_file(PREVIEW_ENTRY, options)?;
        writer.write_all(&preview)?;
        writer.finish()?;
    }
    Ok(cursor.into_inner())
}

/// Open a `.sketch360` archive. Only the JSON entry matters; the preview is
/// derived data.
pub fn read_archive(bytes: &[u8]) -> Result<SketchData, DocumentError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))?;
    let mut json = String::new();
    archive
        .by_name(JSON_ENTRY)
        .map_err(|_| DocumentError::MissingEntry(JSON_ENTRY))?
        .read_to_string(&mut json)?;
    from_json(&json)
}

/// Export file name for a sketch: invalid filename characters replaced,
/// empty names falling back to the default.
#[must_use]
pub fn export_file_name(name: &str) -> String {
    let base = if name.trim().is_empty() { "Sketch" } else { name };
    let cleaned: String = base
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{cleaned}.{SKETCH_EXTENSION}")
}

#[cfg(test)]
mod test {
    use super::{export_file_name, from_json, read_archive, to_json, write_archive};
    use crate::data::SketchData;
    use sketch360_ink::geom::Point;
    use sketch360_ink::stroke::{DrawingAttributes, InkPoint, InkStroke};
    use sketch360_ink::Color;

    fn sample_document() -> SketchData {
        let data = SketchData::new();
        data.update_info(|info| {
            info.name = "Rooftops".to_owned();
            info.background_color = Color::BEIGE;
        });
        let mut stroke = InkStroke::new(DrawingAttributes::default());
        stroke.add(InkPoint::new(Point::new(100.0, 100.0), 1.0, 0.0, 0.0, 10));
        stroke.add(InkPoint::new(Point::new(150.0, 120.0), 1.0, 0.0, 0.0, 20));
        data.strokes().add(stroke);
        data
    }

    #[test]
    fn json_roundtrip_preserves_document() {
        let data = sample_document();
        let json = to_json(&data).unwrap();

        // Wire format spot checks: hex color and universal timestamp.
        assert!(json.contains("\"#F5F5DCFF\""));
        let start_text = json
            .lines()
            .find(|l| l.contains("\"start\""))
            .unwrap()
            .to_owned();
        assert!(start_text.ends_with("Z\",") || start_text.ends_with("Z\""));

        let back = from_json(&json).unwrap();
        let info = back.info();
        assert_eq!(info.name, "Rooftops");
        assert_eq!(info.width, 2000);
        assert_eq!(back.strokes().len(), 1);
        let strokes = back.strokes().snapshot();
        assert_eq!(strokes[0].points().len(), 2);
        // Bounds were rebuilt by the repair pass.
        assert!(!strokes[0].bounding_rect().is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(from_json("{ not json").is_err());
        assert!(from_json("{}").is_err());
    }

    #[test]
    fn archive_roundtrip() {
        let data = sample_document();
        let bytes = write_archive(&data).unwrap();

        // It is a real zip with both entries.
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(&bytes[..])).unwrap();
        assert!(archive.by_name(super::JSON_ENTRY).is_ok());
        assert!(archive.by_name(super::PREVIEW_ENTRY).is_ok());
        drop(archive);

        let back = read_archive(&bytes).unwrap();
        assert_eq!(back.info().name, "Rooftops");
        assert_eq!(back.strokes().len(), 1);
    }

    #[test]
    fn archive_without_json_entry_fails() {
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            use std::io::Write;
            let mut writer = zip::ZipWriter::new(&mut cursor);
            writer
                .start_file("other.txt", zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"hello").unwrap();
            writer.finish().unwrap();
        }
        assert!(matches!(
            read_archive(&cursor.into_inner()),
            Err(super::DocumentError::MissingEntry(_))
        ));
    }

    #[test]
    fn export_names_are_sanitized() {
        assert_eq!(export_file_name("Harbor"), "Harbor.sketch360");
        assert_eq!(export_file_name("a/b:c?"), "a_b_c_.sketch360");
        assert_eq!(export_file_name("   "), "Sketch.sketch360");
    }
}
