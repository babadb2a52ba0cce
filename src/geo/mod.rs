//! Great-circle distance helpers for proximity queries.

/// Mean Earth radius in meters.
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Haversine distance in meters between two `(longitude, latitude)` points.
pub fn distance_meters(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lng1, lat1) = (from.0.to_radians(), from.1.to_radians());
    let (lng2, lat2) = (to.0.to_radians(), to.1.to_radians());

    let d_lat = lat2 - lat1;
    let d_lng = lng2 - lng1;

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
}

/// Latitude/longitude box that contains every point within `radius` of `center`.
///
/// Used to narrow candidates in SQL before computing exact distances.
pub fn bounding_box(center: (f64, f64), radius_meters: f64) -> BoundingBox {
    let lat_delta = (radius_meters / EARTH_RADIUS_METERS).to_degrees();
    let cos_lat = center.1.to_radians().cos().abs().max(1e-6);
    let lng_delta = (lat_delta / cos_lat).min(180.0);

    BoundingBox {
        min_lng: center.0 - lng_delta,
        max_lng: center.0 + lng_delta,
        min_lat: (center.1 - lat_delta).max(-90.0),
        max_lat: (center.1 + lat_delta).min(90.0),
    }
}

/// Longitudes may run past ±180 when the box straddles the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub max_lng: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// The longitude span as two inclusive ranges within [-180, 180].
    ///
    /// A box crossing the antimeridian is split at ±180; otherwise both
    /// ranges are the same span.
    pub fn longitude_ranges(&self) -> [(f64, f64); 2] {
        if self.max_lng - self.min_lng >= 360.0 {
            [(-180.0, 180.0), (-180.0, 180.0)]
        } else if self.min_lng < -180.0 {
            [(self.min_lng + 360.0, 180.0), (-180.0, self.max_lng)]
        } else if self.max_lng > 180.0 {
            [(self.min_lng, 180.0), (-180.0, self.max_lng - 360.0)]
        } else {
            [(self.min_lng, self.max_lng), (self.min_lng, self.max_lng)]
        }
    }
}
