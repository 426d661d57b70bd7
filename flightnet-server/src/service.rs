//! Cross-network orchestration behind the API and the CLI.
//!
//! `RouteService` owns both feeds and the directory, and answers the
//! questions the handlers ask: who is flying, on which network, along which
//! route, and how far along. Each feed degrades independently; a single
//! dead upstream thins results instead of failing them.

use serde::Serialize;
use tracing::debug;

use flightnet_core::cache::Cached;
use flightnet_core::types::{
    FetchError, FlightPlan, NetworkSource, PilotSnapshot, RouteError, Waypoint,
};
use flightnet_core::{progress, route};

use crate::directory::DirectoryIndex;
use crate::feeds::{IvaoFeed, VatsimFeed};

// ---------------------------------------------------------------------------
// Result shapes
// ---------------------------------------------------------------------------

/// Merged listing across both networks with per-feed staleness.
///
/// A feed that is down with no history shows as stale and contributes no
/// pilots; the listing itself fails only when both feeds are in that state.
#[derive(Debug, Serialize)]
pub struct PilotListing {
    pub pilots: Vec<PilotSnapshot>,
    pub vatsim_stale: bool,
    pub ivao_stale: bool,
}

/// A reconstructed route ready for rendering.
#[derive(Debug, Serialize)]
pub struct ConstructedRoute {
    pub network_id: i64,
    /// The network that supplied the flight plan.
    pub network: NetworkSource,
    pub departure: String,
    pub arrival: String,
    pub waypoints: Vec<Waypoint>,
}

/// How far along the constructed route a live pilot is.
#[derive(Debug, Serialize)]
pub struct ProgressReport {
    pub network_id: i64,
    pub callsign: String,
    pub network: NetworkSource,
    pub percent_remaining: f64,
    pub route_total_km: f64,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct RouteService {
    pub vatsim: VatsimFeed,
    pub ivao: IvaoFeed,
    pub directory: DirectoryIndex,
    pub distance_threshold_km: f64,
}

impl RouteService {
    pub fn new(
        vatsim: VatsimFeed,
        ivao: IvaoFeed,
        directory: DirectoryIndex,
        distance_threshold_km: f64,
    ) -> Self {
        RouteService {
            vatsim,
            ivao,
            directory,
            distance_threshold_km,
        }
    }

    /// Merged pilot listing, sorted by callsign for stable output.
    pub async fn list_pilots(&self, now: f64) -> Result<PilotListing, FetchError> {
        let vatsim = self.vatsim.fetch_snapshot(now).await;
        let ivao = self.ivao.fetch_snapshot(now).await;
        if vatsim.is_err() && ivao.is_err() {
            return Err(FetchError::Unavailable);
        }

        let mut pilots = Vec::new();
        let mut vatsim_stale = true;
        let mut ivao_stale = true;
        if let Ok(cached) = &vatsim {
            vatsim_stale = cached.stale;
            pilots.extend(cached.payload.values().cloned());
        }
        if let Ok(cached) = &ivao {
            ivao_stale = cached.stale;
            pilots.extend(cached.payload.values().cloned());
        }
        pilots.sort_by(|a, b| {
            a.callsign
                .cmp(&b.callsign)
                .then(a.network_id.cmp(&b.network_id))
        });

        Ok(PilotListing {
            pilots,
            vatsim_stale,
            ivao_stale,
        })
    }

    /// Case-insensitive substring search over callsign, name, and id.
    /// An empty query matches everything.
    pub async fn search(&self, query: &str, now: f64) -> Result<PilotListing, FetchError> {
        let mut listing = self.list_pilots(now).await?;
        let needle = query.trim().to_lowercase();
        if !needle.is_empty() {
            listing.pilots.retain(|p| matches_query(p, &needle));
        }
        Ok(listing)
    }

    /// Look an id up on VATSIM first, then IVAO.
    ///
    /// `Ok(None)` means both feeds answered and neither knows the id. When a
    /// feed is unreachable the id could still exist behind it, so that
    /// failure outranks a confident "unknown".
    pub async fn find_pilot(
        &self,
        network_id: i64,
        now: f64,
    ) -> Result<Option<Cached<PilotSnapshot>>, FetchError> {
        let vatsim = self.vatsim.fetch_one(network_id, now).await;
        if let Ok(cached) = &vatsim {
            if let Some(pilot) = &cached.payload {
                return Ok(Some(Cached {
                    payload: pilot.clone(),
                    stale: cached.stale,
                }));
            }
        }

        let ivao = self.ivao.fetch_one(network_id, now).await;
        if let Ok(cached) = &ivao {
            if let Some(pilot) = &cached.payload {
                return Ok(Some(Cached {
                    payload: pilot.clone(),
                    stale: cached.stale,
                }));
            }
        }

        if vatsim.is_err() || ivao.is_err() {
            return Err(FetchError::Unavailable);
        }
        Ok(None)
    }

    /// Which network an id is currently connected to.
    pub async fn which_network(
        &self,
        network_id: i64,
        now: f64,
    ) -> Result<Option<NetworkSource>, FetchError> {
        let found = self.find_pilot(network_id, now).await?;
        Ok(found.map(|cached| cached.payload.network))
    }

    /// Find a usable plan for the id and run route construction over it.
    pub async fn construct_route(
        &self,
        network_id: i64,
        now: f64,
    ) -> Result<ConstructedRoute, RouteError> {
        let (plan, network) = self.find_plan(network_id, now).await?;
        let waypoints =
            route::construct_route(&plan, &self.directory, self.distance_threshold_km)?;
        debug!("route for {network_id}: {} points", waypoints.len());
        Ok(ConstructedRoute {
            network_id,
            network,
            departure: plan.departure,
            arrival: plan.arrival,
            waypoints,
        })
    }

    /// Percent of the route still ahead of the pilot's live position.
    pub async fn progress(
        &self,
        network_id: i64,
        now: f64,
    ) -> Result<ProgressReport, RouteError> {
        let pilot = match self.find_pilot(network_id, now).await {
            Ok(Some(cached)) => cached.payload,
            Ok(None) => return Err(RouteError::PilotNotFound),
            Err(e) => return Err(RouteError::Feed(e)),
        };

        let constructed = self.construct_route(network_id, now).await?;
        let percent =
            progress::remaining_percent(&constructed.waypoints, pilot.latitude, pilot.longitude);

        Ok(ProgressReport {
            network_id,
            callsign: pilot.callsign,
            network: pilot.network,
            percent_remaining: percent,
            route_total_km: progress::total_distance_km(&constructed.waypoints),
        })
    }

    /// Plan priority: VATSIM live snapshot, VATSIM filed plans, IVAO live
    /// snapshot. Unreachable sources are skipped while the rest are tried;
    /// with no plan found anywhere the outcome depends on whether every
    /// source actually answered.
    async fn find_plan(
        &self,
        network_id: i64,
        now: f64,
    ) -> Result<(FlightPlan, NetworkSource), RouteError> {
        let mut feed_failed = false;

        match self.vatsim.fetch_one(network_id, now).await {
            Ok(cached) => {
                if let Some(plan) = cached.payload.and_then(|p| p.plan) {
                    if plan.is_usable() {
                        return Ok((plan, NetworkSource::Vatsim));
                    }
                }
            }
            Err(_) => feed_failed = true,
        }

        // The members endpoint 404s for ids it does not know (IVAO ids
        // included), so any failure here reads as "no filed plan".
        if let Ok(Some(plan)) = self.vatsim.filed_plan(network_id).await {
            if plan.is_usable() {
                return Ok((plan, NetworkSource::Vatsim));
            }
        }

        match self.ivao.fetch_one(network_id, now).await {
            Ok(cached) => {
                if let Some(plan) = cached.payload.and_then(|p| p.plan) {
                    if plan.is_usable() {
                        return Ok((plan, NetworkSource::Ivao));
                    }
                }
            }
            Err(_) => feed_failed = true,
        }

        if feed_failed {
            Err(RouteError::Feed(FetchError::Unavailable))
        } else {
            Err(RouteError::PlanNotFound)
        }
    }
}

fn matches_query(pilot: &PilotSnapshot, needle: &str) -> bool {
    pilot.callsign.to_lowercase().contains(needle)
        || pilot
            .name
            .as_ref()
            .is_some_and(|n| n.to_lowercase().contains(needle))
        || pilot.network_id.to_string().contains(needle)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::fetch::tests::MockFetch;

    const VATSIM_URL: &str = "http://test/vatsim-data.json";
    const MEMBERS_URL: &str = "http://test/members";
    const IVAO_URL: &str = "http://test/whazzup";

    // One pilot parked at Frankfurt with a westbound plan. SPESA resolves,
    // UNKWN does not.
    const VATSIM_BODY: &str = r#"{
        "pilots": [
            {
                "cid": 1000001, "callsign": "DLH450", "name": "Test Pilot",
                "latitude": 50.0333, "longitude": 8.5706,
                "heading": 270, "altitude": 0, "groundspeed": 0,
                "flight_plan": {
                    "departure": "EDDF", "arrival": "KJFK",
                    "route": "SPESA UNKWN", "aircraft_short": "B744",
                    "altitude": "35000", "cruise_tas": "480"
                }
            },
            {
                "cid": 1000002, "callsign": "BAW22", "name": "No Plan",
                "latitude": 51.47, "longitude": -0.45
            }
        ]
    }"#;

    const IVAO_BODY: &str = r#"{
        "clients": {
            "pilots": [
                {
                    "userId": 540000, "callsign": "IVA540",
                    "lastTrack": {"latitude": -23.43, "longitude": -46.47},
                    "flightPlan": {
                        "departureId": "EDDF", "arrivalId": "KJFK",
                        "route": "SPESA", "level": "F350", "speed": "N0450",
                        "aircraftId": "B738"
                    }
                }
            ]
        }
    }"#;

    const AIRPORTS: &str = "\
ident,type,name,latitude_deg,longitude_deg
EDDF,large_airport,Frankfurt,50.0333,8.5706
KJFK,large_airport,John F Kennedy Intl,40.6399,-73.7787
";

    const WAYPOINTS: &str = "\
ident,latitude,longitude
SPESA,49.8414,6.2044
";

    fn test_directory() -> (DirectoryIndex, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let airports = dir.path().join("airports.csv");
        let waypoints = dir.path().join("waypoints.csv");
        std::fs::write(&airports, AIRPORTS).unwrap();
        std::fs::write(&waypoints, WAYPOINTS).unwrap();
        (DirectoryIndex::load(&airports, &waypoints).unwrap(), dir)
    }

    fn test_service() -> (RouteService, Arc<MockFetch>, tempfile::TempDir) {
        let mock = Arc::new(MockFetch::new());
        mock.set(VATSIM_URL, Ok(VATSIM_BODY));
        mock.set(IVAO_URL, Ok(IVAO_BODY));

        let vatsim = VatsimFeed::new(
            mock.clone(),
            VATSIM_URL.into(),
            MEMBERS_URL.into(),
            15.0,
        );
        let ivao = IvaoFeed::new(mock.clone(), IVAO_URL.into(), 15.0);
        let (directory, dir) = test_directory();

        (
            RouteService::new(vatsim, ivao, directory, 1000.0),
            mock,
            dir,
        )
    }

    #[tokio::test]
    async fn test_list_pilots_merges_both_networks() {
        let (service, _mock, _dir) = test_service();
        let listing = service.list_pilots(100.0).await.unwrap();
        assert_eq!(listing.pilots.len(), 3);
        assert!(!listing.vatsim_stale);
        assert!(!listing.ivao_stale);
        // Sorted by callsign.
        let callsigns: Vec<&str> = listing.pilots.iter().map(|p| p.callsign.as_str()).collect();
        assert_eq!(callsigns, vec!["BAW22", "DLH450", "IVA540"]);
    }

    #[tokio::test]
    async fn test_list_pilots_survives_one_dead_feed() {
        let (service, mock, _dir) = test_service();
        mock.set(IVAO_URL, Err(FetchError::Unavailable));

        let listing = service.list_pilots(100.0).await.unwrap();
        assert_eq!(listing.pilots.len(), 2);
        assert!(!listing.vatsim_stale);
        assert!(listing.ivao_stale);
    }

    #[tokio::test]
    async fn test_list_pilots_fails_when_both_dead() {
        let (service, mock, _dir) = test_service();
        mock.set(VATSIM_URL, Err(FetchError::Unavailable));
        mock.set(IVAO_URL, Err(FetchError::Unavailable));

        assert_eq!(
            service.list_pilots(100.0).await.unwrap_err(),
            FetchError::Unavailable
        );
    }

    #[tokio::test]
    async fn test_search_matches_callsign_name_and_id() {
        let (service, _mock, _dir) = test_service();

        let by_callsign = service.search("dlh", 100.0).await.unwrap();
        assert_eq!(by_callsign.pilots.len(), 1);
        assert_eq!(by_callsign.pilots[0].callsign, "DLH450");

        let by_name = service.search("test pilot", 100.0).await.unwrap();
        assert_eq!(by_name.pilots.len(), 1);

        let by_id = service.search("540000", 100.0).await.unwrap();
        assert_eq!(by_id.pilots.len(), 1);
        assert_eq!(by_id.pilots[0].network, NetworkSource::Ivao);

        let nothing = service.search("zzzzzz", 100.0).await.unwrap();
        assert!(nothing.pilots.is_empty());

        let all = service.search("", 100.0).await.unwrap();
        assert_eq!(all.pilots.len(), 3);
    }

    #[tokio::test]
    async fn test_which_network() {
        let (service, _mock, _dir) = test_service();
        assert_eq!(
            service.which_network(1000001, 100.0).await.unwrap(),
            Some(NetworkSource::Vatsim)
        );
        assert_eq!(
            service.which_network(540000, 100.0).await.unwrap(),
            Some(NetworkSource::Ivao)
        );
        assert_eq!(service.which_network(42, 100.0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_pilot_unavailable_feed_blocks_confident_miss() {
        let (service, mock, _dir) = test_service();
        mock.set(IVAO_URL, Err(FetchError::Unavailable));

        // Found on VATSIM: the dead IVAO feed does not matter.
        assert!(service.find_pilot(1000001, 100.0).await.unwrap().is_some());
        // Not on VATSIM and IVAO unreachable: cannot claim "unknown".
        assert_eq!(
            service.find_pilot(42, 100.0).await.unwrap_err(),
            FetchError::Unavailable
        );
    }

    #[tokio::test]
    async fn test_construct_route_from_live_plan() {
        let (service, _mock, _dir) = test_service();
        let constructed = service.construct_route(1000001, 100.0).await.unwrap();

        assert_eq!(constructed.network, NetworkSource::Vatsim);
        assert_eq!(constructed.departure, "EDDF");
        assert_eq!(constructed.arrival, "KJFK");
        let idents: Vec<&str> = constructed
            .waypoints
            .iter()
            .map(|w| w.ident.as_str())
            .collect();
        // UNKWN never resolves; SPESA survives the distance gate.
        assert_eq!(idents, vec!["EDDF", "SPESA", "KJFK"]);
    }

    #[tokio::test]
    async fn test_construct_route_filed_plan_fallback() {
        let (service, mock, _dir) = test_service();
        // 1000002 flies without a live plan, but filed one earlier.
        mock.set(
            "http://test/members/1000002/flightplans",
            Ok(r#"[{"dep": "EDDF", "arr": "KJFK", "route": "SPESA"}]"#),
        );

        let constructed = service.construct_route(1000002, 100.0).await.unwrap();
        assert_eq!(constructed.network, NetworkSource::Vatsim);
        assert_eq!(constructed.waypoints.len(), 3);
    }

    #[tokio::test]
    async fn test_construct_route_no_plan_anywhere() {
        let (service, _mock, _dir) = test_service();
        assert_eq!(
            service.construct_route(42, 100.0).await.unwrap_err(),
            RouteError::PlanNotFound
        );
    }

    #[tokio::test]
    async fn test_construct_route_feeds_down() {
        let (service, mock, _dir) = test_service();
        mock.set(VATSIM_URL, Err(FetchError::Unavailable));
        mock.set(IVAO_URL, Err(FetchError::Unavailable));

        assert_eq!(
            service.construct_route(42, 100.0).await.unwrap_err(),
            RouteError::Feed(FetchError::Unavailable)
        );
    }

    #[tokio::test]
    async fn test_construct_route_unknown_airport() {
        let (service, mock, _dir) = test_service();
        mock.set(
            VATSIM_URL,
            Ok(r#"{"pilots": [{
                "cid": 7, "callsign": "X", "latitude": 0.0, "longitude": 0.0,
                "flight_plan": {"departure": "ZZZZ", "arrival": "KJFK", "route": ""}
            }]}"#),
        );

        assert_eq!(
            service.construct_route(7, 100.0).await.unwrap_err(),
            RouteError::AirportNotFound
        );
    }

    #[tokio::test]
    async fn test_progress_at_departure_is_hundred() {
        let (service, _mock, _dir) = test_service();
        // DLH450 sits exactly on the EDDF reference point.
        let report = service.progress(1000001, 100.0).await.unwrap();
        assert_eq!(report.percent_remaining, 100.0);
        assert_eq!(report.callsign, "DLH450");
        assert!(report.route_total_km > 6000.0);
    }

    #[tokio::test]
    async fn test_progress_unknown_pilot() {
        let (service, _mock, _dir) = test_service();
        assert_eq!(
            service.progress(42, 100.0).await.unwrap_err(),
            RouteError::PilotNotFound
        );
    }
}
