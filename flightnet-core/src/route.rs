//! Route reconstruction from filed route strings.
//!
//! A filed route is a whitespace-delimited mix of waypoint idents, airway
//! names, and procedure tokens. Only tokens that resolve in the directory
//! survive, and resolved waypoints still collide across the globe (the same
//! five-letter ident gets reused), so candidates are additionally gated by
//! great-circle distance from the previous accepted point.

use std::collections::HashMap;

use crate::geo::haversine_km;
use crate::types::{FlightPlan, RouteError, Waypoint};

/// Default maximum gap between consecutive accepted route points.
pub const DEFAULT_DISTANCE_THRESHOLD_KM: f64 = 1000.0;

/// Read-mostly ident lookup provided by the host.
///
/// `waypoints` may return its matches in any order; route construction
/// re-sorts them into token order itself.
pub trait Directory {
    /// Airport position by ident.
    fn airport(&self, ident: &str) -> Option<Waypoint>;

    /// Every waypoint whose ident appears in `idents`. Partial result:
    /// idents with no match are simply absent.
    fn waypoints(&self, idents: &[&str]) -> HashMap<String, Waypoint>;
}

/// Split a filed route string into candidate waypoint idents.
pub fn tokenize(route: &str) -> Vec<&str> {
    route.split_whitespace().collect()
}

/// Resolve tokens against the directory, preserving token order.
///
/// The directory mapping carries no order, so the matches are walked in the
/// order the tokens appear in the route string. Tokens with no match drop
/// out. Skipping this re-sort and iterating the mapping instead scrambles
/// the route.
pub fn match_tokens(tokens: &[&str], directory: &dyn Directory) -> Vec<Waypoint> {
    let resolved = directory.waypoints(tokens);
    tokens
        .iter()
        .filter_map(|t| resolved.get(*t).cloned())
        .collect()
}

/// Build the renderable route for a filed plan.
///
/// The output starts at the departure airport and ends at the arrival
/// airport. Interior points are the plan's route tokens that resolve in the
/// directory, in token order, each accepted only when its distance from the
/// previous accepted point is within `distance_threshold_km`. A rejected
/// candidate does not advance that reference point. The arrival is appended
/// unconditionally.
pub fn construct_route(
    plan: &FlightPlan,
    directory: &dyn Directory,
    distance_threshold_km: f64,
) -> Result<Vec<Waypoint>, RouteError> {
    let departure = directory
        .airport(&plan.departure)
        .ok_or(RouteError::AirportNotFound)?;
    let arrival = directory
        .airport(&plan.arrival)
        .ok_or(RouteError::AirportNotFound)?;

    let tokens = tokenize(&plan.route);
    let matched = match_tokens(&tokens, directory);

    let mut prev = (departure.longitude_deg, departure.latitude_deg);
    let mut route = vec![departure];
    for candidate in matched {
        let gap = haversine_km(prev.0, prev.1, candidate.longitude_deg, candidate.latitude_deg);
        if gap <= distance_threshold_km {
            prev = (candidate.longitude_deg, candidate.latitude_deg);
            route.push(candidate);
        }
    }
    route.push(arrival);
    Ok(route)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory directory fixture. Lookup is exact-match, like the real
    /// index after ident normalization.
    struct TestDirectory {
        airports: HashMap<String, Waypoint>,
        fixes: HashMap<String, Waypoint>,
    }

    fn wp(ident: &str, lat: f64, lon: f64) -> Waypoint {
        Waypoint {
            ident: ident.into(),
            latitude_deg: lat,
            longitude_deg: lon,
        }
    }

    impl Directory for TestDirectory {
        fn airport(&self, ident: &str) -> Option<Waypoint> {
            self.airports.get(ident).cloned()
        }

        fn waypoints(&self, idents: &[&str]) -> HashMap<String, Waypoint> {
            idents
                .iter()
                .filter_map(|i| self.fixes.get(*i).map(|w| (i.to_string(), w.clone())))
                .collect()
        }
    }

    /// Degrees of longitude on the equator: 1 deg is ~111.2 km.
    /// D at 0, W1 ~200 km out, W2 ~1500 km past W1, W3 ~300 km past W2,
    /// A ~330 km past W1.
    fn fixture() -> TestDirectory {
        let mut airports = HashMap::new();
        airports.insert("DDDD".to_string(), wp("DDDD", 0.0, 0.0));
        airports.insert("AAAA".to_string(), wp("AAAA", 0.0, 4.8));

        let mut fixes = HashMap::new();
        fixes.insert("WONE".to_string(), wp("WONE", 0.0, 1.8));
        fixes.insert("WTWO".to_string(), wp("WTWO", 0.0, 15.3));
        fixes.insert("WTRI".to_string(), wp("WTRI", 0.0, 18.0));
        TestDirectory { airports, fixes }
    }

    fn plan(dep: &str, arr: &str, route: &str) -> FlightPlan {
        FlightPlan {
            departure: dep.into(),
            arrival: arr.into(),
            route: route.into(),
            aircraft: None,
            cruise_altitude_ft: None,
            cruise_speed_kt: None,
        }
    }

    fn idents(route: &[Waypoint]) -> Vec<&str> {
        route.iter().map(|w| w.ident.as_str()).collect()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("CPT L9  UL9\tSTU"), vec!["CPT", "L9", "UL9", "STU"]);
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_match_preserves_token_order() {
        let dir = fixture();
        // Directory mapping is unordered; output must follow token order.
        let matched = match_tokens(&["WTWO", "NOPE", "WONE"], &dir);
        assert_eq!(
            matched.iter().map(|w| w.ident.as_str()).collect::<Vec<_>>(),
            vec!["WTWO", "WONE"]
        );
    }

    #[test]
    fn test_distance_gate_measures_from_last_accepted() {
        let dir = fixture();
        // W1 is 200 km from D: accepted. W2 is 1500 km from W1: dropped.
        // W3 is only 300 km from W2, but W2 was rejected, so its gap is
        // measured from W1 (~1800 km): dropped too.
        let route = construct_route(&plan("DDDD", "AAAA", "WONE WTWO WTRI"), &dir, 1000.0)
            .unwrap();
        assert_eq!(idents(&route), vec!["DDDD", "WONE", "AAAA"]);
    }

    #[test]
    fn test_all_waypoints_within_threshold() {
        let dir = fixture();
        let route = construct_route(&plan("DDDD", "AAAA", "WONE"), &dir, 1000.0).unwrap();
        assert_eq!(idents(&route), vec!["DDDD", "WONE", "AAAA"]);
    }

    #[test]
    fn test_no_resolving_tokens_yields_endpoints_only() {
        let dir = fixture();
        let route = construct_route(&plan("DDDD", "AAAA", "Q1 UL77 XXXXX"), &dir, 1000.0)
            .unwrap();
        assert_eq!(idents(&route), vec!["DDDD", "AAAA"]);
    }

    #[test]
    fn test_empty_route_string() {
        let dir = fixture();
        let route = construct_route(&plan("DDDD", "AAAA", ""), &dir, 1000.0).unwrap();
        assert_eq!(idents(&route), vec!["DDDD", "AAAA"]);
    }

    #[test]
    fn test_arrival_appended_even_when_far() {
        let dir = fixture();
        // AAAA is within threshold here, but the gate does not apply to the
        // arrival anyway; drop every interior candidate and the endpoints
        // remain.
        let route = construct_route(&plan("DDDD", "AAAA", "WTWO"), &dir, 1000.0).unwrap();
        assert_eq!(idents(&route), vec!["DDDD", "AAAA"]);
    }

    #[test]
    fn test_unknown_airport() {
        let dir = fixture();
        assert_eq!(
            construct_route(&plan("ZZZZ", "AAAA", ""), &dir, 1000.0),
            Err(RouteError::AirportNotFound)
        );
        assert_eq!(
            construct_route(&plan("DDDD", "", ""), &dir, 1000.0),
            Err(RouteError::AirportNotFound)
        );
    }

    #[test]
    fn test_repeated_token_resolves_twice() {
        let dir = fixture();
        let matched = match_tokens(&["WONE", "WONE"], &dir);
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn test_idempotent() {
        let dir = fixture();
        let p = plan("DDDD", "AAAA", "WONE WTWO WTRI");
        let a = construct_route(&p, &dir, 1000.0).unwrap();
        let b = construct_route(&p, &dir, 1000.0).unwrap();
        assert_eq!(a, b);
    }
}
