//! # Stroke rasterizer
//!
//! Turns dry strokes into pixels: variable-width outlines are filled,
//! fixed-width strokes get a spline center line and a stroked paint,
//! single-sample strokes draw as a dot of radius `width/4`. Everything
//! composites over a noise-textured background and encodes to JPEG for
//! persistence and the 3D preview.

pub mod background;
mod cache;
pub mod path;

pub use cache::RenderCache;
pub use path::{create_outline_path, create_path_points, create_spline_path};

use base64::Engine;

use crate::color::Color;
use crate::geom::{Point, Rect};
use crate::stroke::{DrawingAttributes, InkStroke, PenTip};

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("cannot allocate a {width}x{height} surface")]
    Allocation { width: u32, height: u32 },
    #[error("jpeg encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

fn to_skia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

/// Solid paint, or a repeating-tile paint when `tile` is given.
fn paint_for<'a>(
    color: Color,
    tile: Option<&'a tiny_skia::Pixmap>,
) -> tiny_skia::Paint<'a> {
    let mut paint = tiny_skia::Paint {
        anti_alias: true,
        ..tiny_skia::Paint::default()
    };
    match tile {
        Some(tile) => {
            paint.shader = tiny_skia::Pattern::new(
                tile.as_ref(),
                tiny_skia::SpreadMode::Repeat,
                tiny_skia::FilterQuality::Nearest,
                1.0,
                tiny_skia::Transform::identity(),
            );
        }
        None => paint.set_color(to_skia_color(color)),
    }
    paint
}

fn stroke_style(attributes: &DrawingAttributes) -> tiny_skia::Stroke {
    tiny_skia::Stroke {
        width: attributes.size,
        line_cap: match attributes.pen_tip {
            PenTip::Circle => tiny_skia::LineCap::Round,
            PenTip::Rectangle => tiny_skia::LineCap::Butt,
        },
        line_join: tiny_skia::LineJoin::Round,
        ..tiny_skia::Stroke::default()
    }
}

fn draw_parts(
    pixmap: &mut tiny_skia::Pixmap,
    stroke: &InkStroke,
    compiled: Option<&tiny_skia::Path>,
    tile: Option<&tiny_skia::Pixmap>,
    transform: tiny_skia::Transform,
) {
    let attributes = stroke.attributes();
    let paint = paint_for(attributes.color, tile);

    match compiled {
        None => {
            // Degenerate stroke: a dot of radius width/4 at the only sample.
            let Some(point) = stroke.points().first() else {
                return;
            };
            let radius = attributes.size / 4.0;
            if radius <= 0.0 {
                return;
            }
            let mut builder = tiny_skia::PathBuilder::new();
            builder.push_circle(point.position.x as f32, point.position.y as f32, radius);
            let Some(dot) = builder.finish() else {
                log::warn!("dot path construction failed for stroke {}", stroke.id());
                return;
            };
            pixmap.fill_path(&dot, &paint, tiny_skia::FillRule::Winding, transform, None);
        }
        Some(path) => {
            if attributes.ignore_pressure {
                pixmap.stroke_path(path, &paint, &stroke_style(attributes), transform, None);
            } else {
                pixmap.fill_path(path, &paint, tiny_skia::FillRule::Winding, transform, None);
            }
        }
    }
}

/// Draw one stroke without any caching; path and paint are built and
/// dropped inside the call.
pub fn draw_stroke(
    pixmap: &mut tiny_skia::Pixmap,
    stroke: &InkStroke,
    transform: tiny_skia::Transform,
) {
    let compiled = cache::build_path(stroke);
    let tile = cache::build_tile(stroke);
    draw_parts(pixmap, stroke, compiled.as_ref(), tile.as_deref(), transform);
}

/// Draw strokes in order, reusing compiled paths from `cache`.
pub fn draw_strokes(
    pixmap: &mut tiny_skia::Pixmap,
    strokes: &[InkStroke],
    cache: &mut RenderCache,
    transform: tiny_skia::Transform,
) {
    for stroke in strokes {
        let entry = cache.entry(stroke);
        draw_parts(pixmap, stroke, entry.path.as_ref(), entry.tile.as_deref(), transform);
    }
}

/// Bounds-filtered draw: strokes whose bounding box misses `bounds` are
/// skipped entirely. The cheap rect test pays for itself on large documents.
pub fn draw_strokes_within(
    pixmap: &mut tiny_skia::Pixmap,
    strokes: &[InkStroke],
    bounds: Rect,
    cache: &mut RenderCache,
    transform: tiny_skia::Transform,
) {
    for stroke in strokes {
        if !bounds.intersects(&stroke.bounding_rect()) {
            continue;
        }
        let entry = cache.entry(stroke);
        draw_parts(pixmap, stroke, entry.path.as_ref(), entry.tile.as_deref(), transform);
    }
}

/// Stroke an open polyline - guide overlays, not ink.
pub fn draw_polyline(
    pixmap: &mut tiny_skia::Pixmap,
    points: &[Point],
    color: Color,
    width: f32,
    transform: tiny_skia::Transform,
) {
    if points.len() < 2 {
        return;
    }
    let mut builder = tiny_skia::PathBuilder::new();
    builder.move_to(points[0].x as f32, points[0].y as f32);
    for point in &points[1..] {
        builder.line_to(point.x as f32, point.y as f32);
    }
    let Some(path) = builder.finish() else {
        return;
    };
    let paint = paint_for(color, None);
    let style = tiny_skia::Stroke {
        width,
        ..tiny_skia::Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &style, transform, None);
}

/// Fill the whole surface with the repeating noise tile for `color`.
pub fn draw_background(pixmap: &mut tiny_skia::Pixmap, color: Color) {
    let tile = background::shared_background_tile(color);
    let paint = paint_for(color, Some(&*tile));
    let Some(rect) =
        tiny_skia::Rect::from_xywh(0.0, 0.0, pixmap.width() as f32, pixmap.height() as f32)
    else {
        return;
    };
    pixmap.fill_rect(rect, &paint, tiny_skia::Transform::identity(), None);
}

/// Compose background and strokes at `scaled_width` output width and encode
/// to JPEG (quality 100).
///
/// The output keeps the canvas aspect: height scales by
/// `scaled_width / width`.
pub fn render_image(
    width: u32,
    height: u32,
    background_color: Color,
    strokes: &[InkStroke],
    scaled_width: u32,
) -> Result<Vec<u8>, RenderError> {
    let scale = f64::from(scaled_width) / f64::from(width.max(1));
    let bitmap_width = scaled_width;
    let bitmap_height = (f64::from(height) * scale).round() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(bitmap_width, bitmap_height).ok_or(
        RenderError::Allocation {
            width: bitmap_width,
            height: bitmap_height,
        },
    )?;
    draw_background(&mut pixmap, background_color);

    let transform = tiny_skia::Transform::from_scale(scale as f32, scale as f32);
    for stroke in strokes {
        draw_stroke(&mut pixmap, stroke, transform);
    }

    encode_jpeg(&pixmap)
}

/// [`render_image`], base64-encoded for the preview wire format.
pub fn render_image_base64(
    width: u32,
    height: u32,
    background_color: Color,
    strokes: &[InkStroke],
    scaled_width: u32,
) -> Result<String, RenderError> {
    let bytes = render_image(width, height, background_color, strokes, scaled_width)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

fn encode_jpeg(pixmap: &tiny_skia::Pixmap) -> Result<Vec<u8>, RenderError> {
    // JPEG has no alpha: demultiply and drop the channel. The background
    // fill means every pixel is opaque anyway.
    let mut rgb = Vec::with_capacity(pixmap.pixels().len() * 3);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgb.extend_from_slice(&[c.red(), c.green(), c.blue()]);
    }

    let mut bytes = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(std::io::Cursor::new(&mut bytes), 100);
    encoder.encode(
        &rgb,
        pixmap.width(),
        pixmap.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}

#[cfg(test)]
mod test {
    use super::{render_image, render_image_base64, RenderCache};
    use crate::color::Color;
    use crate::geom::{Point, Rect};
    use crate::stroke::{DrawingAttributes, InkPoint, InkStroke};

    fn stroke_through(points: &[(f64, f64)], size: f32) -> InkStroke {
        let mut stroke = InkStroke::new(DrawingAttributes {
            size,
            ..DrawingAttributes::default()
        });
        for &(x, y) in points {
            stroke.add(InkPoint::new(Point::new(x, y), 1.0, 0.0, 0.0, 0));
        }
        stroke
    }

    #[test]
    fn renders_beige_document_with_one_stroke() {
        let stroke = stroke_through(&[(100.0, 100.0), (150.0, 120.0), (200.0, 90.0)], 4.0);
        let jpeg = render_image(2000, 1000, Color::BEIGE, &[stroke], 2000).unwrap();

        let decoded = image::load_from_memory(&jpeg).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (2000, 1000));

        // Far corner: textured beige, nowhere near black ink.
        let corner = decoded.get_pixel(1900, 900);
        assert!(i16::from(corner[0]).abs_diff(0xF5) < 48);
        assert!(i16::from(corner[2]).abs_diff(0xDC) < 48);

        // On the path: dark ink.
        let on_stroke = decoded.get_pixel(150, 120);
        assert!(on_stroke[0] < 96 && on_stroke[1] < 96 && on_stroke[2] < 96);
    }

    #[test]
    fn scaled_render_keeps_aspect() {
        let jpeg = render_image(2000, 1000, Color::WHITE, &[], 500).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 500);
        assert_eq!(decoded.height(), 250);
    }

    #[test]
    fn base64_roundtrip() {
        use base64::Engine;
        let text = render_image_base64(200, 100, Color::WHITE, &[], 200).unwrap();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(text)
            .unwrap();
        // JPEG SOI marker.
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn bounds_filter_skips_offscreen_strokes() {
        let mut pixmap = tiny_skia::Pixmap::new(100, 100).unwrap();
        let mut cache = RenderCache::new();
        let visible = stroke_through(&[(10.0, 10.0), (20.0, 20.0)], 4.0);
        let offscreen = stroke_through(&[(500.0, 500.0), (600.0, 600.0)], 4.0);

        super::draw_strokes_within(
            &mut pixmap,
            &[visible, offscreen],
            Rect::new(0.0, 0.0, 100.0, 100.0),
            &mut cache,
            tiny_skia::Transform::identity(),
        );
        // Only the visible stroke was compiled.
        assert_eq!(cache.len(), 1);
    }
}
