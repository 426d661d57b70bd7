//! Flight progress estimation over a constructed route.
//!
//! Nearest-point projection, not along-track projection: near a sharp course
//! reversal the nearest route point can sit on the wrong leg and skew the
//! estimate. Kept this way on purpose; the map front end expects percentages
//! that move like this.

use crate::geo::haversine_km;
use crate::types::Waypoint;

/// Sum of consecutive-leg great-circle distances along a route, km.
pub fn total_distance_km(route: &[Waypoint]) -> f64 {
    route
        .windows(2)
        .map(|pair| leg_km(&pair[0], &pair[1]))
        .sum()
}

/// Percent of the route still to fly from `(lat, lon)`, clamped to
/// `[0, 100]`.
///
/// The remaining distance restarts at the route point nearest the current
/// position (ties to the earliest index): the legs from there to the end,
/// plus the hop from the position to that point when it is not the route
/// start. A zero-length route counts as fully arrived.
pub fn remaining_percent(route: &[Waypoint], lat: f64, lon: f64) -> f64 {
    let total = total_distance_km(route);
    if total == 0.0 {
        return 0.0;
    }

    let mut nearest_idx = 0;
    let mut nearest_km = f64::INFINITY;
    for (i, point) in route.iter().enumerate() {
        let d = haversine_km(lon, lat, point.longitude_deg, point.latitude_deg);
        if d < nearest_km {
            nearest_km = d;
            nearest_idx = i;
        }
    }

    let mut remaining: f64 = route[nearest_idx..]
        .windows(2)
        .map(|pair| leg_km(&pair[0], &pair[1]))
        .sum();
    if nearest_idx > 0 {
        remaining += nearest_km;
    }

    (remaining / total * 100.0).clamp(0.0, 100.0)
}

fn leg_km(a: &Waypoint, b: &Waypoint) -> f64 {
    haversine_km(a.longitude_deg, a.latitude_deg, b.longitude_deg, b.latitude_deg)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
