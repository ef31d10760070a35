//! HTTP fetcher abstraction for testability

use std::time::Duration;

use super::types::FetchError;

/// Default request timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Trait for blocking HTTP fetches.
///
/// Fetch jobs call this from worker threads. The abstraction allows mock
/// fetchers in tests and alternative HTTP stacks in host applications.
pub trait HttpFetcher: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Real HTTP fetcher implementation using reqwest.
pub struct ReqwestFetcher {
    client: reqwest::blocking::Client,
}

impl ReqwestFetcher {
    /// Creates a new ReqwestFetcher with the default timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT_SECS)
    }

    /// Creates a new ReqwestFetcher with a custom timeout.
    ///
    /// Tile servers such as OpenStreetMap reject requests without a
    /// User-Agent, so one identifying this crate is always sent.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("tilecache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

impl HttpFetcher for ReqwestFetcher {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::Http(format!("Failed to read response: {}", e)))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Mock fetcher returning a fixed response and recording requested URLs.
    pub struct MockHttpFetcher {
        pub response: Result<Vec<u8>, FetchError>,
        pub requests: Mutex<Vec<String>>,
    }

    impl MockHttpFetcher {
        pub fn ok(body: &[u8]) -> Self {
            Self {
                response: Ok(body.to_vec()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(error: FetchError) -> Self {
            Self {
                response: Err(error),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().len()
        }
    }

    impl HttpFetcher for MockHttpFetcher {
        fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.requests.lock().push(url.to_string());
            self.response.clone()
        }
    }

    #[test]
    fn test_mock_fetcher_success() {
        let mock = MockHttpFetcher::ok(&[1, 2, 3, 4]);

        let result = mock.get("http://example.com");
        assert_eq!(result.unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(mock.request_count(), 1);
    }

    #[test]
    fn test_mock_fetcher_error() {
        let mock = MockHttpFetcher::failing(FetchError::Http("Test error".to_string()));

        let result = mock.get("http://example.com");
        assert!(result.is_err());
    }

    #[test]
    fn test_reqwest_fetcher_builds() {
        assert!(ReqwestFetcher::with_timeout(5).is_ok());
    }

    #[test]
    fn test_trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn HttpFetcher>();
    }
}
