//! Geodesy - Great-Circle Distance
//!
//! Haversine distance between two GPS fixes. Pure math, no state.
//! Callers validate coordinates first; out-of-range input is treated as
//! "no position" upstream and never reaches the distance formula.

use serde::{Deserialize, Serialize};

/// Mean Earth radius (meters)
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Coordinate range check: lat in [-90, 90], lng in [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Keep only in-range fixes; out-of-range degrades to None
    pub fn validated(self) -> Option<Self> {
        if self.is_valid() {
            Some(self)
        } else {
            None
        }
    }
}

/// Haversine great-circle distance in meters.
///
/// Uses the atan2 form, which stays numerically stable for antipodal
/// points and near the poles where the law-of-cosines form degrades.
pub fn distance_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

// ============================================================================
// TESTS
// ============================================================================
