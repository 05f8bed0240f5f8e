//! # 3D preview bridge
//!
//! The spherical preview is an external renderer the core only talks to in
//! opaque values: base64 JPEG frames go out, camera position and zoom come
//! back. The wire format is the JSON `{alpha, beta}` pair and a numeric
//! zoom multiplier in `0..=2`.

/// Camera angles of the spherical view, radians. `alpha` is yaw around the
/// vertical axis, `beta` pitch from the horizon.
#[derive(Copy, Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraPosition {
    pub alpha: f64,
    pub beta: f64,
}

/// Preview zoom multiplier, clamped to the `0..=2` range the scene accepts.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ZoomLevel(f64);

impl ZoomLevel {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 2.0;

    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }
    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for ZoomLevel {
    fn default() -> Self {
        Self(1.0)
    }
}

/// The surface the core pushes rendered frames and camera angles to.
/// Implemented by the embedding shell (a WebGL scene in the shipped app);
/// tests use an in-memory double.
pub trait PreviewSurface {
    /// Present a new base64-encoded JPEG frame of the canvas.
    fn show_frame(&mut self, jpeg_base64: &str);
    /// Point the camera.
    fn set_camera(&mut self, position: CameraPosition);
    /// Current camera position, as reported by the scene.
    fn camera(&self) -> CameraPosition;
    /// Current zoom, as reported by the scene.
    fn zoom(&self) -> ZoomLevel;
}

/// Derive the camera position that centers the preview on a canvas point.
/// The x axis maps to yaw, y to pitch, the same linear mapping as
/// [`crate::equirect::Vertex::from_point`].
#[must_use]
pub fn camera_toward(point: sketch360_ink::geom::Point, canvas_height: f64) -> CameraPosition {
    let vertex = crate::equirect::Vertex::from_point(point, canvas_height);
    CameraPosition {
        alpha: vertex.azimuth,
        beta: vertex.elevation,
    }
}

#[cfg(test)]
mod test {
    use super::{camera_toward, CameraPosition, ZoomLevel};
    use sketch360_ink::geom::Point;

    #[test]
    fn camera_wire_format() {
        let json = serde_json::to_string(&CameraPosition {
            alpha: 1.5,
            beta: -0.25,
        })
        .unwrap();
        assert_eq!(json, r#"{"alpha":1.5,"beta":-0.25}"#);
        let back: CameraPosition = serde_json::from_str(&json).unwrap();
        assert_eq!(back.alpha, 1.5);
    }

    #[test]
    fn zoom_clamps() {
        assert_eq!(ZoomLevel::new(5.0).get(), 2.0);
        assert_eq!(ZoomLevel::new(-1.0).get(), 0.0);
        assert_eq!(ZoomLevel::new(0.5).get(), 0.5);
        let json = serde_json::to_string(&ZoomLevel::new(1.25)).unwrap();
        assert_eq!(json, "1.25");
    }

    #[test]
    fn camera_toward_canvas_center_is_origin() {
        let camera = camera_toward(Point::new(1000.0, 500.0), 1000.0);
        assert!(camera.alpha.abs() < 1e-9);
        assert!(camera.beta.abs() < 1e-9);
    }
}
