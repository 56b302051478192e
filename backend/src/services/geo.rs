//! Great-circle distance between two geographic points.

use crate::models::branch::GeoPoint;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters, full floating-point precision.
///
/// The `sqrt` argument is clamped to `[0, 1]` so identical and antipodal
/// points cannot push `asin` out of its domain through rounding.
pub fn haversine_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}
