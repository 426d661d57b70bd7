//! IVAO Whazzup payload parsing and normalization.
//!
//! Covers `GET /v2/tracker/whazzup` (`clients.pilots[]`). Same per-record
//! skip contract as the VATSIM side: a pilot without an id or a usable
//! `lastTrack` position drops out, the rest of the snapshot survives.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::convert::{flight_level_to_feet, speed_to_knots};
use crate::types::{FetchError, FlightPlan, NetworkSource, PilotSnapshot};

// ---------------------------------------------------------------------------
// Feed payload types
// ---------------------------------------------------------------------------

/// One pilot record from the Whazzup feed. `lastTrack` is required: a pilot
/// the tracker has no position for cannot be placed on the map.
#[derive(Debug, Clone, Deserialize)]
pub struct IvaoPilot {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(default)]
    pub callsign: String,
    #[serde(rename = "lastTrack")]
    pub last_track: IvaoTrack,
    #[serde(rename = "flightPlan", default)]
    pub flight_plan: Option<IvaoFlightPlan>,
}

/// Live position block.
#[derive(Debug, Clone, Deserialize)]
pub struct IvaoTrack {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub altitude: Option<i64>,
    #[serde(rename = "groundSpeed", default)]
    pub ground_speed: Option<i64>,
}

/// Filed plan block. Cruise level and speed arrive as `F350`/`N0450`
/// strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IvaoFlightPlan {
    #[serde(rename = "departureId", default)]
    pub departure_id: Option<String>,
    #[serde(rename = "arrivalId", default)]
    pub arrival_id: Option<String>,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub speed: Option<String>,
    #[serde(rename = "aircraftId", default)]
    pub aircraft_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Parse a Whazzup body into snapshots keyed by user id.
pub fn parse_snapshot(body: &str) -> Result<HashMap<i64, PilotSnapshot>, FetchError> {
    let root: Value = serde_json::from_str(body).map_err(|_| FetchError::Unavailable)?;
    let pilots = match root
        .get("clients")
        .and_then(|c| c.get("pilots"))
        .and_then(Value::as_array)
    {
        Some(list) => list.as_slice(),
        None => &[],
    };

    let mut out = HashMap::new();
    for value in pilots {
        let pilot: IvaoPilot = match serde_json::from_value(value.clone()) {
            Ok(p) => p,
            Err(_) => continue,
        };
        let snapshot = normalize_pilot(&pilot);
        out.insert(snapshot.network_id, snapshot);
    }
    Ok(out)
}

fn normalize_pilot(pilot: &IvaoPilot) -> PilotSnapshot {
    PilotSnapshot {
        network_id: pilot.user_id,
        network: NetworkSource::Ivao,
        callsign: pilot.callsign.clone(),
        // Whazzup does not carry member names.
        name: None,
        latitude: pilot.last_track.latitude,
        longitude: pilot.last_track.longitude,
        heading: pilot.last_track.heading,
        altitude_ft: pilot.last_track.altitude,
        ground_speed_kt: pilot.last_track.ground_speed,
        plan: pilot.flight_plan.as_ref().map(normalize_plan),
    }
}

fn normalize_plan(plan: &IvaoFlightPlan) -> FlightPlan {
    FlightPlan {
        departure: plan.departure_id.clone().unwrap_or_default(),
        arrival: plan.arrival_id.clone().unwrap_or_default(),
        route: plan.route.clone().unwrap_or_default(),
        aircraft: plan.aircraft_id.clone().filter(|a| !a.is_empty()),
        cruise_altitude_ft: plan.level.as_deref().and_then(flight_level_to_feet),
        cruise_speed_kt: plan.speed.as_deref().and_then(speed_to_knots),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
