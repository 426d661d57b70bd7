//! VATSIM payload parsing and normalization.
//!
//! Covers the v3 live data feed (`pilots[]`) and the members flightplans
//! endpoint. Body-level JSON errors fail the whole parse; individual pilot
//! records that do not fit the schema (missing id, missing position,
//! mistyped sub-objects) are skipped one by one so a few bad records never
//! cost the whole snapshot.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::types::{FetchError, FlightPlan, NetworkSource, PilotSnapshot};

// ---------------------------------------------------------------------------
// Feed payload types
// ---------------------------------------------------------------------------

/// One pilot record from the live feed. Position fields are required so a
/// record without a usable position fails typed deserialization and gets
/// skipped by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct VatsimPilot {
    pub cid: i64,
    #[serde(default)]
    pub callsign: String,
    #[serde(default)]
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub altitude: Option<i64>,
    #[serde(default)]
    pub groundspeed: Option<i64>,
    #[serde(default)]
    pub flight_plan: Option<VatsimFlightPlan>,
}

/// The feed's flight plan sub-object. Numeric-looking fields arrive as
/// strings (`altitude` may be `"35000"` or `"FL350"`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VatsimFlightPlan {
    #[serde(default)]
    pub departure: String,
    #[serde(default)]
    pub arrival: String,
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub aircraft_short: String,
    #[serde(default)]
    pub altitude: String,
    #[serde(default)]
    pub cruise_tas: String,
}

/// One entry from `GET /v2/members/{cid}/flightplans`, most recent first.
#[derive(Debug, Clone, Deserialize)]
pub struct VatsimFiledPlan {
    #[serde(default)]
    pub dep: String,
    #[serde(default)]
    pub arr: String,
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub aircraft: Option<String>,
    #[serde(default)]
    pub cruisespeed: String,
    #[serde(default)]
    pub altitude: String,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Parse a v3 live-data body into snapshots keyed by CID.
pub fn parse_snapshot(body: &str) -> Result<HashMap<i64, PilotSnapshot>, FetchError> {
    let root: Value = serde_json::from_str(body).map_err(|_| FetchError::Unavailable)?;
    let pilots = match root.get("pilots").and_then(Value::as_array) {
        Some(list) => list.as_slice(),
        None => &[],
    };

    let mut out = HashMap::new();
    for value in pilots {
        let pilot: VatsimPilot = match serde_json::from_value(value.clone()) {
            Ok(p) => p,
            Err(_) => continue,
        };
        let snapshot = normalize_pilot(&pilot);
        out.insert(snapshot.network_id, snapshot);
    }
    Ok(out)
}

/// Parse a members flightplans body. The first (most recent) entry wins;
/// an empty list is `None`.
pub fn parse_filed_plan(body: &str) -> Result<Option<FlightPlan>, FetchError> {
    let plans: Vec<Value> = serde_json::from_str(body).map_err(|_| FetchError::Unavailable)?;
    let first = match plans.into_iter().next() {
        Some(v) => v,
        None => return Ok(None),
    };
    let filed: VatsimFiledPlan = match serde_json::from_value(first) {
        Ok(p) => p,
        Err(_) => return Ok(None),
    };
    Ok(Some(FlightPlan {
        departure: filed.dep,
        arrival: filed.arr,
        route: filed.route,
        aircraft: filed.aircraft.filter(|a| !a.is_empty()),
        cruise_altitude_ft: digits(&filed.altitude),
        cruise_speed_kt: digits(&filed.cruisespeed),
    }))
}

fn normalize_pilot(pilot: &VatsimPilot) -> PilotSnapshot {
    PilotSnapshot {
        network_id: pilot.cid,
        network: NetworkSource::Vatsim,
        callsign: pilot.callsign.clone(),
        name: pilot.name.clone().filter(|n| !n.is_empty()),
        latitude: pilot.latitude,
        longitude: pilot.longitude,
        heading: pilot.heading,
        altitude_ft: pilot.altitude,
        ground_speed_kt: pilot.groundspeed,
        plan: pilot.flight_plan.as_ref().map(normalize_plan),
    }
}

fn normalize_plan(plan: &VatsimFlightPlan) -> FlightPlan {
    FlightPlan {
        departure: plan.departure.clone(),
        arrival: plan.arrival.clone(),
        route: plan.route.clone(),
        aircraft: if plan.aircraft_short.is_empty() {
            None
        } else {
            Some(plan.aircraft_short.clone())
        },
        cruise_altitude_ft: digits(&plan.altitude),
        cruise_speed_kt: digits(&plan.cruise_tas),
    }
}

/// Parse an all-digits string field, as the feed files plain numbers.
/// Anything else (`"FL350"`, empty) is `None`.
fn digits(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
