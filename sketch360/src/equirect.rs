//! # Equirectangular geometry
//!
//! The canvas is a 2:1 equirectangular projection of the unit sphere: x maps
//! linearly to azimuth, y to elevation. Geodesics (great circles) appear as
//! sinusoid-like curves; each has a single apex, and the whole curve is
//! recoverable from that apex alone. Formulas after the spherical-geodesy
//! construction in Araujo's equirectangular perspective work.
//!
//! Pixel-space clamping happens only in [`Vertex::from_point`]; everything
//! else treats an out-of-range vertex as a caller error and fails loudly.

use sketch360_ink::geom::Point;

/// One degree, the default geodesic sampling increment.
pub const DEFAULT_INCREMENT: f64 = std::f64::consts::PI / 180.0;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("vertex out of range: azimuth {azimuth}, elevation {elevation}")]
    InvalidVertex { azimuth: f64, elevation: f64 },
    #[error("the two vertices are equal")]
    CoincidentVertices,
    #[error("pixel height must be positive, got {0}")]
    NonPositiveHeight(f64),
    #[error("azimuth {0} outside [-pi, pi]")]
    AzimuthOutOfRange(f64),
}

/// A point on the unit sphere: azimuth in `[-pi, pi]` (x), elevation in
/// `[-pi/2, pi/2]` (y), both radians.
#[derive(Copy, Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vertex {
    pub azimuth: f64,
    pub elevation: f64,
}

impl Vertex {
    #[must_use]
    pub const fn new(azimuth: f64, elevation: f64) -> Self {
        Self { azimuth, elevation }
    }

    /// Both components finite and in range. Invalid vertices are an
    /// observable condition the geometry routines refuse, not a state that
    /// gets silently clamped.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.azimuth.is_finite()
            && self.elevation.is_finite()
            && (-std::f64::consts::PI..=std::f64::consts::PI).contains(&self.azimuth)
            && (-std::f64::consts::FRAC_PI_2..=std::f64::consts::FRAC_PI_2)
                .contains(&self.elevation)
    }

    /// Map a canvas point to the sphere. The point is clamped to the canvas
    /// (`[0, 2h] x [0, h]`) first - pointer input routinely lands a pixel
    /// outside during fast swipes and this is the one place that forgives it.
    #[must_use]
    pub fn from_point(point: Point, pixel_height: f64) -> Self {
        let x = point.x.clamp(0.0, pixel_height * 2.0);
        let y = point.y.clamp(0.0, pixel_height);
        Self {
            elevation: std::f64::consts::FRAC_PI_2 - (y / pixel_height) * std::f64::consts::PI,
            azimuth: std::f64::consts::TAU * (x / (pixel_height * 2.0)) - std::f64::consts::PI,
        }
    }

    /// Map back to canvas pixels. The result lies in `[0, 2h] x [0, h]`.
    pub fn to_point(&self, pixel_height: f64) -> Result<Point, GeometryError> {
        if pixel_height <= 0.0 {
            return Err(GeometryError::NonPositiveHeight(pixel_height));
        }
        let x = pixel_height * self.azimuth / std::f64::consts::PI + pixel_height;
        let y = pixel_height * (-self.elevation + std::f64::consts::FRAC_PI_2)
            / std::f64::consts::PI;
        Ok(Point { x, y })
    }

    fn validated(&self) -> Result<Self, GeometryError> {
        if self.is_valid() {
            Ok(*self)
        } else {
            Err(GeometryError::InvalidVertex {
                azimuth: self.azimuth,
                elevation: self.elevation,
            })
        }
    }
}

/// The apex (highest point) of the great circle through two distinct
/// vertices.
///
/// The plane of the geodesic is derived first; apex azimuth comes from
/// `atan2` over the plane normal, elevation from the normal magnitude
/// ratio. The `sign(c)` factors pick the correct hemisphere - without them
/// `atan2` lands the apex on the wrong side for half the point pairs.
pub fn apex_of(vertex1: Vertex, vertex2: Vertex) -> Result<Vertex, GeometryError> {
    let vertex1 = vertex1.validated()?;
    let vertex2 = vertex2.validated()?;
    if vertex1 == vertex2 {
        return Err(GeometryError::CoincidentVertices);
    }

    let l1 = vertex1.azimuth;
    let l2 = vertex2.azimuth;
    let p1 = vertex1.elevation;
    let p2 = vertex2.elevation;

    // Plane of the geodesic.
    let a = -p2.cos() * l2.sin() * p1.sin() + p1.cos() * l1.sin() * p2.sin();
    let b = -p1.cos() * l1.cos() * p2.sin() + p2.cos() * l2.cos() * p1.sin();
    let c = p1.cos() * p2.cos() * (l2 - l1).sin();

    // Apex on that plane.
    let sign_c = if c < 0.0 { -1.0 } else { 1.0 };
    let azimuth = (-sign_c * b).atan2(-sign_c * a);
    let elevation = ((a * a + b * b).sqrt() / c.abs()).atan();

    Ok(Vertex { azimuth, elevation })
}

/// Elevation of the geodesic with the given apex at `azimuth`.
pub fn elevation_at(apex: Vertex, azimuth: f64) -> Result<f64, GeometryError> {
    let apex = apex.validated()?;
    if !(-std::f64::consts::PI..=std::f64::consts::PI).contains(&azimuth) || azimuth.is_nan() {
        return Err(GeometryError::AzimuthOutOfRange(azimuth));
    }
    Ok((apex.elevation.tan() * (azimuth - apex.azimuth).cos()).atan())
}

/// Sample the full geodesic from azimuth `-pi` to `pi` as canvas points,
/// for guide-curve rendering.
pub fn geodesic_points(
    apex: Vertex,
    pixel_height: f64,
    increment: f64,
) -> Result<Vec<Point>, GeometryError> {
    let apex = apex.validated()?;
    if pixel_height <= 0.0 {
        return Err(GeometryError::NonPositiveHeight(pixel_height));
    }

    let mut points = Vec::new();
    let mut azimuth = -std::f64::consts::PI;
    while azimuth <= std::f64::consts::PI {
        let elevation = elevation_at(apex, azimuth)?;
        let vertex = Vertex { azimuth, elevation };
        debug_assert!(vertex.is_valid());
        points.push(vertex.to_point(pixel_height)?);
        azimuth += increment;
    }
    Ok(points)
}
