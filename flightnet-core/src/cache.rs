//! Stale-tolerant TTL cache.
//!
//! Three-tier read policy: serve a fresh entry, else run the caller's fetch,
//! else fall back to the last value that ever fetched successfully for the
//! key. Once a key has succeeded once, upstream flakiness never surfaces to
//! callers again.
//!
//! No clock and no executor: callers pass `now` (UNIX seconds) and the fetch
//! future. The entry table lock is never held across an await.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use crate::types::FetchError;

/// A cache read result, flagged when served from last-known-good.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub payload: T,
    pub stale: bool,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    payload: T,
    fetched_at: f64,
}

#[derive(Debug)]
struct Slot<T> {
    entry: Option<Entry<T>>,
    last_known: Option<T>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot {
            entry: None,
            last_known: None,
        }
    }
}

/// Keyed TTL cache with last-known-good fallback.
pub struct StaleCache<T> {
    ttl: f64,
    slots: Mutex<HashMap<String, Slot<T>>>,
}

impl<T: Clone> StaleCache<T> {
    /// Create a cache that serves entries younger than `ttl` seconds without
    /// refetching.
    pub fn new(ttl: f64) -> Self {
        StaleCache {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> f64 {
        self.ttl
    }

    /// Payload for `key` if a fresh entry exists.
    pub fn fresh(&self, key: &str, now: f64) -> Option<T> {
        let slots = self.slots.lock().unwrap();
        let entry = slots.get(key)?.entry.as_ref()?;
        if now - entry.fetched_at < self.ttl {
            Some(entry.payload.clone())
        } else {
            None
        }
    }

    /// When the current entry for `key` was stored, fresh or not.
    pub fn fetched_at(&self, key: &str) -> Option<f64> {
        let slots = self.slots.lock().unwrap();
        slots.get(key)?.entry.as_ref().map(|e| e.fetched_at)
    }

    /// Last value that ever fetched successfully for `key`, any age.
    pub fn last_known(&self, key: &str) -> Option<T> {
        let slots = self.slots.lock().unwrap();
        slots.get(key)?.last_known.clone()
    }

    /// Store a successful fetch for `key`, updating both the timed entry and
    /// the last-known-good slot in one locked write.
    ///
    /// A store older than the current entry is dropped entirely, so
    /// `fetched_at` never moves backwards for a key and a slow stale fetch
    /// cannot clobber a newer result.
    pub fn store(&self, key: &str, payload: T, now: f64) {
        let mut slots = self.slots.lock().unwrap();
        let slot = slots.entry(key.to_string()).or_default();
        if let Some(entry) = &slot.entry {
            if now < entry.fetched_at {
                return;
            }
        }
        slot.entry = Some(Entry {
            payload: payload.clone(),
            fetched_at: now,
        });
        slot.last_known = Some(payload);
    }

    /// Three-tier read.
    ///
    /// 1. Fresh entry for `key`: returned as-is, `fetch` never runs.
    /// 2. Otherwise `fetch` runs. Success is stored and returned with
    ///    `stale: false`.
    /// 3. On failure the last value that ever succeeded for `key` is
    ///    returned with `stale: true`; with no such value the error
    ///    propagates.
    ///
    /// Concurrent callers on the same expired key may each run their own
    /// fetch; the monotonic rule in [`store`](Self::store) keeps the newest
    /// result.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        now: f64,
        fetch: F,
    ) -> Result<Cached<T>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        if let Some(payload) = self.fresh(key, now) {
            return Ok(Cached {
                payload,
                stale: false,
            });
        }

        match fetch().await {
            Ok(payload) => {
                self.store(key, payload.clone(), now);
                Ok(Cached {
                    payload,
                    stale: false,
                })
            }
            Err(err) => match self.last_known(key) {
                Some(payload) => Ok(Cached {
                    payload,
                    stale: true,
                }),
                None => Err(err),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
