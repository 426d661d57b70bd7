//! Shared types and error enums for flightnet-core.

use serde::Serialize;
use thiserror::Error;

/// Errors from the fetch/cache layer.
///
/// Upstream unreachable, non-2xx, timeout, and unparseable body all collapse
/// into `Unavailable`; the fetch layer logs the cause before mapping. The
/// cache recovers from this via last-known-good whenever it can, so callers
/// see it only before the first successful fetch for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("upstream unavailable")]
    Unavailable,
}

/// Errors from route construction and progress estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("no flight plan found for this network id")]
    PlanNotFound,
    #[error("pilot not connected to either network")]
    PilotNotFound,
    #[error("departure or arrival airport not found")]
    AirportNotFound,
    #[error("feed error: {0}")]
    Feed(#[from] FetchError),
}

/// Error raised when configuration cannot be written or applied.
#[derive(Debug, Error)]
#[error("config error: {0}")]
pub struct ConfigError(pub String);

// ---------------------------------------------------------------------------
// Networks
// ---------------------------------------------------------------------------

/// Which upstream network a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NetworkSource {
    Vatsim,
    Ivao,
}

impl std::fmt::Display for NetworkSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkSource::Vatsim => write!(f, "VATSIM"),
            NetworkSource::Ivao => write!(f, "IVAO"),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalized pilot data
// ---------------------------------------------------------------------------

/// Live state of one pilot, normalized to a common shape across networks.
///
/// Produced fresh on every successful feed fetch and never mutated after.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PilotSnapshot {
    pub network_id: i64,
    pub network: NetworkSource,
    pub callsign: String,
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub heading: Option<f64>,
    pub altitude_ft: Option<i64>,
    pub ground_speed_kt: Option<i64>,
    pub plan: Option<FlightPlan>,
}

/// Filed flight plan details, normalized across networks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightPlan {
    pub departure: String,
    pub arrival: String,
    pub route: String,
    pub aircraft: Option<String>,
    pub cruise_altitude_ft: Option<i64>,
    pub cruise_speed_kt: Option<i64>,
}

impl FlightPlan {
    /// A plan can anchor a route only when both endpoints are filed.
    pub fn is_usable(&self) -> bool {
        !self.departure.is_empty() && !self.arrival.is_empty()
    }
}

/// A named fix or airport with a fixed position.
///
/// Sourced from the directory. Also the element type of constructed routes:
/// the first element is the departure airport, the last the arrival.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waypoint {
    pub ident: String,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(dep: &str, arr: &str) -> FlightPlan {
        FlightPlan {
            departure: dep.into(),
            arrival: arr.into(),
            route: String::new(),
            aircraft: None,
            cruise_altitude_ft: None,
            cruise_speed_kt: None,
        }
    }

    #[test]
    fn test_plan_usable() {
        assert!(plan("KJFK", "EGLL").is_usable());
        assert!(!plan("", "EGLL").is_usable());
        assert!(!plan("KJFK", "").is_usable());
        assert!(!plan("", "").is_usable());
    }

    #[test]
    fn test_network_source_display() {
        assert_eq!(NetworkSource::Vatsim.to_string(), "VATSIM");
        assert_eq!(NetworkSource::Ivao.to_string(), "IVAO");
    }

    #[test]
    fn test_route_error_from_fetch_error() {
        let err: RouteError = FetchError::Unavailable.into();
        assert_eq!(err, RouteError::Feed(FetchError::Unavailable));
    }
}
