//! HTTP client abstraction for testability.
//!
//! Feeds talk to upstream networks through the `HttpFetch` trait so tests
//! can substitute a mock instead of a live endpoint. Every transport
//! failure collapses into `FetchError::Unavailable`; the cause is logged
//! here before the detail is dropped.

use std::time::Duration;

use tracing::warn;

use flightnet_core::types::{ConfigError, FetchError};

/// One HTTP GET returning the response body as text.
#[async_trait::async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}

/// Real client backed by reqwest.
///
/// User-Agent and timeout are fixed at construction; both networks ask
/// integrators to identify themselves.
pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    pub fn new(user_agent: &str, timeout_s: f64) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs_f64(timeout_s))
            .build()
            .map_err(|e| ConfigError(format!("failed to build HTTP client: {e}")))?;
        Ok(ReqwestFetch { client })
    }
}

#[async_trait::async_trait]
impl HttpFetch for ReqwestFetch {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("GET {url} failed: {e}");
                return Err(FetchError::Unavailable);
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("GET {url} returned {status}");
            return Err(FetchError::Unavailable);
        }

        match response.text().await {
            Ok(body) => Ok(body),
            Err(e) => {
                warn!("GET {url} body read failed: {e}");
                Err(FetchError::Unavailable)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock client serving canned responses per URL.
    ///
    /// URLs without a canned response fail as `Unavailable`, which doubles
    /// as the dead-upstream case. Responses can be swapped between calls to
    /// drive stale-fallback paths.
    pub struct MockFetch {
        responses: Mutex<HashMap<String, Result<String, FetchError>>>,
        pub calls: AtomicUsize,
    }

    impl MockFetch {
        pub fn new() -> Self {
            MockFetch {
                responses: Mutex::new(HashMap::new()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn set(&self, url: &str, response: Result<&str, FetchError>) {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), response.map(str::to_string));
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl HttpFetch for MockFetch {
        async fn get(&self, url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .unwrap_or(Err(FetchError::Unavailable))
        }
    }

    #[tokio::test]
    async fn test_mock_serves_canned_body() {
        let mock = MockFetch::new();
        mock.set("http://x/feed", Ok("hello"));

        assert_eq!(mock.get("http://x/feed").await.unwrap(), "hello");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_unknown_url_is_unavailable() {
        let mock = MockFetch::new();
        assert_eq!(
            mock.get("http://x/other").await,
            Err(FetchError::Unavailable)
        );
    }

    #[test]
    fn test_reqwest_fetch_builds() {
        assert!(ReqwestFetch::new("flightnet-test/0", 5.0).is_ok());
    }
}
