//! Cached access to the two live network feeds.
//!
//! Each feed owns one `StaleCache` slot holding the whole normalized
//! snapshot behind an `Arc`, so concurrent handlers share a single parse.
//! Feeds never fail while they hold any historical snapshot; callers see
//! `stale: true` instead.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use flightnet_core::cache::{Cached, StaleCache};
use flightnet_core::types::{FetchError, FlightPlan, PilotSnapshot};
use flightnet_core::{ivao, vatsim};

use crate::fetch::HttpFetch;

/// Each feed caches exactly one snapshot under this key.
const SNAPSHOT_KEY: &str = "snapshot";

/// Current UNIX time in seconds.
pub fn unix_now() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs_f64()
}

/// One normalized feed snapshot, keyed by network id.
pub type Snapshot = Arc<HashMap<i64, PilotSnapshot>>;

// ---------------------------------------------------------------------------
// VATSIM
// ---------------------------------------------------------------------------

pub struct VatsimFeed {
    fetcher: Arc<dyn HttpFetch>,
    data_url: String,
    members_url: String,
    cache: StaleCache<Snapshot>,
}

impl VatsimFeed {
    pub fn new(
        fetcher: Arc<dyn HttpFetch>,
        data_url: String,
        members_url: String,
        ttl_s: f64,
    ) -> Self {
        VatsimFeed {
            fetcher,
            data_url,
            members_url,
            cache: StaleCache::new(ttl_s),
        }
    }

    /// The normalized live snapshot, at most one upstream GET per TTL.
    pub async fn fetch_snapshot(&self, now: f64) -> Result<Cached<Snapshot>, FetchError> {
        let got = self
            .cache
            .get_or_fetch(SNAPSHOT_KEY, now, || async move {
                let body = self.fetcher.get(&self.data_url).await?;
                let pilots = vatsim::parse_snapshot(&body)?;
                debug!("VATSIM snapshot: {} pilots", pilots.len());
                Ok(Arc::new(pilots))
            })
            .await?;
        if got.stale {
            debug!("serving stale VATSIM snapshot");
        }
        Ok(got)
    }

    /// One pilot out of the snapshot, with the snapshot's staleness.
    pub async fn fetch_one(
        &self,
        network_id: i64,
        now: f64,
    ) -> Result<Cached<Option<PilotSnapshot>>, FetchError> {
        let snapshot = self.fetch_snapshot(now).await?;
        Ok(Cached {
            payload: snapshot.payload.get(&network_id).cloned(),
            stale: snapshot.stale,
        })
    }

    /// Latest plan this member filed with VATSIM, connected or not.
    ///
    /// Hits the members endpoint directly; not cached, it only runs when the
    /// live snapshot had no usable plan for the id.
    pub async fn filed_plan(&self, cid: i64) -> Result<Option<FlightPlan>, FetchError> {
        let url = format!(
            "{}/{}/flightplans",
            self.members_url.trim_end_matches('/'),
            cid
        );
        let body = self.fetcher.get(&url).await?;
        vatsim::parse_filed_plan(&body)
    }

    pub fn last_fetched(&self) -> Option<f64> {
        self.cache.fetched_at(SNAPSHOT_KEY)
    }

    pub fn ttl(&self) -> f64 {
        self.cache.ttl()
    }
}

// ---------------------------------------------------------------------------
// IVAO
// ---------------------------------------------------------------------------

pub struct IvaoFeed {
    fetcher: Arc<dyn HttpFetch>,
    whazzup_url: String,
    cache: StaleCache<Snapshot>,
}

impl IvaoFeed {
    pub fn new(fetcher: Arc<dyn HttpFetch>, whazzup_url: String, ttl_s: f64) -> Self {
        IvaoFeed {
            fetcher,
            whazzup_url,
            cache: StaleCache::new(ttl_s),
        }
    }

    pub async fn fetch_snapshot(&self, now: f64) -> Result<Cached<Snapshot>, FetchError> {
        let got = self
            .cache
            .get_or_fetch(SNAPSHOT_KEY, now, || async move {
                let body = self.fetcher.get(&self.whazzup_url).await?;
                let pilots = ivao::parse_snapshot(&body)?;
                debug!("IVAO snapshot: {} pilots", pilots.len());
                Ok(Arc::new(pilots))
            })
            .await?;
        if got.stale {
            debug!("serving stale IVAO snapshot");
        }
        Ok(got)
    }

    pub async fn fetch_one(
        &self,
        network_id: i64,
        now: f64,
    ) -> Result<Cached<Option<PilotSnapshot>>, FetchError> {
        let snapshot = self.fetch_snapshot(now).await?;
        Ok(Cached {
            payload: snapshot.payload.get(&network_id).cloned(),
            stale: snapshot.stale,
        })
    }

    pub fn last_fetched(&self) -> Option<f64> {
        self.cache.fetched_at(SNAPSHOT_KEY)
    }

    pub fn ttl(&self) -> f64 {
        self.cache.ttl()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
