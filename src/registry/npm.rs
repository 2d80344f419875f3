//! npm registry checker for verifying package existence.

use crate::limiter::ApiLimiter;
use crate::registry::cache::RegistryCache;
use crate::types::Result;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Checker for verifying packages against the npm registry.
pub struct NpmChecker {
    client: Client,
    cache: RegistryCache,
    limiter: Arc<ApiLimiter>,
    registry_url: String,
}

impl NpmChecker {
    /// Create a new npm checker sharing the given admission gate.
    pub fn new(timeout_secs: u64, limiter: Arc<ApiLimiter>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("confuscan/0.1")
            .build()?;

        Ok(Self {
            client,
            cache: RegistryCache::new(3600),
            limiter,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
        })
    }

    /// Point the checker at a different registry (alternate mirrors, tests).
    pub fn with_registry_url(mut self, url: &str) -> Self {
        self.registry_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Check whether a package name is claimed on the registry.
    ///
    /// Exactly HTTP 200 means the package exists; every other status is
    /// treated as absent. That conflates transient server errors with true
    /// absence, which is the intended classification, not a bug. Transport
    /// failures propagate so the caller can log and move on.
    pub async fn exists(&self, package_name: &str) -> Result<bool> {
        if let Some(cached) = self.cache.get(package_name) {
            trace!("cache hit for {}", package_name);
            return Ok(cached);
        }

        self.limiter.admit().await;

        // The name lands in the URL as-is; names with path-unsafe characters
        // are a known unhandled edge case.
        let url = format!("{}/{}", self.registry_url, package_name);
        trace!("checking registry: {}", url);

        let response = self.client.get(&url).send().await?;
        let exists = response.status() == StatusCode::OK;

        debug!(
            "{}: {}",
            package_name,
            if exists { "exists" } else { "not found" }
        );
        self.cache.set(package_name, exists);
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConfuscanError;

    fn make_checker(registry_url: &str) -> NpmChecker {
        let limiter = Arc::new(ApiLimiter::new(6000));
        NpmChecker::new(10, limiter)
            .unwrap()
            .with_registry_url(registry_url)
    }

    #[tokio::test]
    async fn test_status_200_means_exists() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/left-pad")
            .with_status(200)
            .with_body(r#"{"name": "left-pad"}"#)
            .create_async()
            .await;

        let checker = make_checker(&server.url());
        assert!(checker.exists("left-pad").await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_404_means_missing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/totally-fake-pkg-xyz123")
            .with_status(404)
            .create_async()
            .await;

        let checker = make_checker(&server.url());
        assert!(!checker.exists("totally-fake-pkg-xyz123").await.unwrap());
    }

    #[tokio::test]
    async fn test_server_errors_classify_as_missing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/flaky-pkg")
            .with_status(503)
            .create_async()
            .await;

        let checker = make_checker(&server.url());
        assert!(!checker.exists("flaky-pkg").await.unwrap());
    }

    #[tokio::test]
    async fn test_verdicts_are_cached_within_a_run() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/lodash")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let checker = make_checker(&server.url());
        assert!(checker.exists("lodash").await.unwrap());
        assert!(checker.exists("lodash").await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        // Nothing listens here; connection is refused.
        let checker = make_checker("http://127.0.0.1:9");

        let err = checker.exists("left-pad").await.unwrap_err();
        assert!(matches!(err, ConfuscanError::Network(_)));
    }
}
