//! Metric buffering of geographic boundaries.
//!
//! Buffer distances are in meters, so the geometry is moved into a planar
//! metric system first. A sinusoidal projection centred on the geometry's
//! central meridian keeps local east-west and north-south distances true,
//! which is sufficient for growing a boundary by a few kilometers.

use geo::{BoundingRect, Buffer, Coord, MapCoords, MultiPolygon};

const EARTH_RADIUS_M: f64 = 6_371_008.8;
const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

#[derive(Debug, Clone, Copy)]
struct SinusoidalProjection {
    central_meridian: f64,
}

impl SinusoidalProjection {
    fn forward(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (c.x - self.central_meridian) * METERS_PER_DEGREE * c.y.to_radians().cos(),
            y: c.y * METERS_PER_DEGREE,
        }
    }

    fn inverse(&self, c: Coord<f64>) -> Coord<f64> {
        let lat = c.y / METERS_PER_DEGREE;
        let scale = METERS_PER_DEGREE * lat.to_radians().cos();
        Coord {
            x: self.central_meridian + if scale > 0.0 { c.x / scale } else { 0.0 },
            y: lat,
        }
    }
}

/// Grow a WGS84 boundary outward by `distance_km`.
///
/// Non-positive distances and empty geometries are returned unchanged.
pub fn buffer_km(geometry: &MultiPolygon<f64>, distance_km: f64) -> MultiPolygon<f64> {
    if distance_km <= 0.0 {
        return geometry.clone();
    }
    let Some(rect) = geometry.bounding_rect() else {
        return geometry.clone();
    };

    let projection = SinusoidalProjection {
        central_meridian: rect.center().x,
    };

    let planar = geometry.map_coords(move |c| projection.forward(c));
    planar
        .buffer(distance_km * 1000.0)
        .map_coords(move |c| projection.inverse(c))
}
