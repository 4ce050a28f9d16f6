//! Geospatial helpers: haversine distance, radius bounding boxes and
//! rectangle containment.
//!
//! All angles are in degrees, all distances in meters. Everything here
//! is pure; only [`filter_within_radius`] and
//! [`BoundingBox::split_at_antimeridian`] allocate.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Fractional digits kept for stored coordinates.
pub const COORDINATE_SCALE: f64 = 1e7;

/// Axis-aligned latitude/longitude rectangle with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lon_min: f64,
    pub lat_max: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Build a box from two opposite corners given in any order.
    pub fn from_corners(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Self {
        Self {
            lat_min: lat1.min(lat2),
            lon_min: lon1.min(lon2),
            lat_max: lat1.max(lat2),
            lon_max: lon1.max(lon2),
        }
    }

    /// Rectangle over-approximating the disc of `radius_m` around a point.
    ///
    /// The longitude span is widened by `1 / cos(lat)` to account for
    /// meridian convergence. Latitude is clamped to `[-90, 90]`, and a disc
    /// that reaches a pole covers every longitude. The longitude range may
    /// still cross the antimeridian; see [`BoundingBox::split_at_antimeridian`].
    pub fn around(lat: f64, lon: f64, radius_m: f64) -> Self {
        let lat_delta = (radius_m / EARTH_RADIUS_M).to_degrees();
        let lat_min = (lat - lat_delta).max(-90.0);
        let lat_max = (lat + lat_delta).min(90.0);
        if lat_min <= -90.0 || lat_max >= 90.0 {
            return Self {
                lat_min,
                lon_min: -180.0,
                lat_max,
                lon_max: 180.0,
            };
        }

        let lon_delta = (radius_m / (EARTH_RADIUS_M * lat.to_radians().cos())).to_degrees();
        Self {
            lat_min,
            lon_min: lon - lon_delta,
            lat_max,
            lon_max: lon + lon_delta,
        }
    }

    /// Rewrite the box as one or two boxes inside `[-180, 180]` longitude.
    ///
    /// A range overflowing one end wraps around to the other end. A range
    /// of 360 degrees or more becomes a single full-width box.
    pub fn split_at_antimeridian(&self) -> Vec<Self> {
        if self.lon_max - self.lon_min >= 360.0 {
            return vec![Self {
                lon_min: -180.0,
                lon_max: 180.0,
                ..*self
            }];
        }
        if self.lon_min < -180.0 {
            vec![
                Self {
                    lon_min: -180.0,
                    ..*self
                },
                Self {
                    lon_min: self.lon_min + 360.0,
                    lon_max: 180.0,
                    ..*self
                },
            ]
        } else if self.lon_max > 180.0 {
            vec![
                Self {
                    lon_max: 180.0,
                    ..*self
                },
                Self {
                    lon_min: -180.0,
                    lon_max: self.lon_max - 360.0,
                    ..*self
                },
            ]
        } else {
            vec![*self]
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.lat_min <= lat && lat <= self.lat_max && self.lon_min <= lon && lon <= self.lon_max
    }
}

/// Great-circle distance between two points, haversine formula.
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` marginally above 1 for antipodal points.
    2.0 * EARTH_RADIUS_M * a.min(1.0).sqrt().asin()
}

/// Inclusive point-in-rectangle test; corners may be given in either order.
pub fn contains_point(lat: f64, lon: f64, corner_a: (f64, f64), corner_b: (f64, f64)) -> bool {
    BoundingBox::from_corners(corner_a.0, corner_a.1, corner_b.0, corner_b.1).contains(lat, lon)
}

/// Keep the items whose coordinate lies within `radius_m` of the center.
///
/// Relative input order is preserved.
pub fn filter_within_radius<T, F>(
    items: impl IntoIterator<Item = T>,
    coordinates: F,
    center_lat: f64,
    center_lon: f64,
    radius_m: f64,
) -> Vec<T>
where
    F: Fn(&T) -> (f64, f64),
{
    items
        .into_iter()
        .filter(|item| {
            let (lat, lon) = coordinates(item);
            distance(center_lat, center_lon, lat, lon) <= radius_m
        })
        .collect()
}

/// Round a coordinate to the 7 fractional digits kept in storage.
pub fn round_coordinate(value: f64) -> f64 {
    (value * COORDINATE_SCALE).round() / COORDINATE_SCALE
}
