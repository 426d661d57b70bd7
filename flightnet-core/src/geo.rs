//! Great-circle math and pressure conversion.
//!
//! Coordinates are decimal degrees, longitude first, matching the feed
//! payloads and the directory data.

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// One inch of mercury in millibars (hectopascals).
pub const INHG_TO_MB: f64 = 33.8639;

/// Great-circle distance in kilometers between two points.
///
/// Identical points give exactly 0. Finite inputs always produce a finite,
/// non-negative result; non-finite inputs propagate NaN.
pub fn haversine_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Convert inches of mercury to whole millibars.
///
/// Rounds half away from zero (`f64::round`): 29.92 inHg is 1013 mb.
pub fn inhg_to_millibars(inhg: f64) -> i64 {
    (inhg * INHG_TO_MB).round() as i64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
