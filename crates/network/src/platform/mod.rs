//! Reporting Platform Client
//!
//! REST binding of the queue directory, queue metrics and recent
//! interactions endpoints. Implements the core [`MetricsSource`] and
//! [`InteractionsSource`] traits.
//!
//! The directory lookup is retried with the configured policy; the metrics
//! and interactions fetches are sent once, because the next poll tick
//! already retries them.

mod wire;

use crate::config::NetworkConfig;
use crate::error::{NetworkError, NetworkResult};
use crate::http::{HttpClient, HttpClientTrait, RetryPolicy};
use crate::types::HttpRequest;
use async_trait::async_trait;
use queuepulse_core::error::{SourceError, SourceResult};
use queuepulse_core::sources::{InteractionsSource, MetricsSource, QueueMetrics};
use queuepulse_core::types::{InteractionRecord, QueueId, ReportDate};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use url::Url;
use wire::{InteractionList, MetricsPayload, QueueDirectory};

/// Client of the contact-center reporting API
pub struct PlatformClient {
    http: Arc<dyn HttpClientTrait>,
    base_url: Url,
    api_token: String,
    retry: RetryPolicy,
}

impl PlatformClient {
    /// Create client from configuration
    ///
    /// # Errors
    /// Returns error if the base URL is invalid or the HTTP client cannot be built
    pub fn new(config: &NetworkConfig) -> NetworkResult<Self> {
        let http = Arc::new(HttpClient::new("platform", config.http.clone())?);
        Self::with_http(
            http,
            &config.platform.base_url,
            &config.platform.api_token,
            RetryPolicy::from_config(&config.http.retry),
        )
    }

    /// Create client on top of an existing HTTP client
    ///
    /// # Errors
    /// Returns error if `base_url` is not an absolute URL
    pub fn with_http(
        http: Arc<dyn HttpClientTrait>,
        base_url: &str,
        api_token: &str,
        retry: RetryPolicy,
    ) -> NetworkResult<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(NetworkError::config("platform.base_url", "must be an absolute URL"));
        }
        Ok(Self {
            http,
            base_url,
            api_token: api_token.to_string(),
            retry,
        })
    }

    /// `{base}/api/v2/{segments...}` with each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> NetworkResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| NetworkError::config("platform.base_url", "must be an absolute URL"))?
            .pop_if_empty()
            .extend(["api", "v2"])
            .extend(segments);
        Ok(url)
    }

    fn get(&self, url: &Url) -> HttpRequest {
        HttpRequest::get(url.as_str())
            .header("Accept", "application/json")
            .bearer(&self.api_token)
    }

    /// Underlying HTTP client, for health and statistics
    pub fn http(&self) -> &Arc<dyn HttpClientTrait> {
        &self.http
    }
}

#[async_trait]
impl MetricsSource for PlatformClient {
    #[instrument(skip(self))]
    async fn resolve_queue(&self, name: &str) -> SourceResult<QueueId> {
        let mut url = self.endpoint(&["routing", "queues"])?;
        url.query_pairs_mut().append_pair("name", name);

        let response = self
            .http
            .send_with_retry(self.get(&url), self.retry.clone())
            .await?
            .error_for_status(url.as_str())?;
        let directory: QueueDirectory = response.json()?;

        let queue = wire::best_match(&directory.entities, name)
            .ok_or_else(|| SourceError::not_found(format!("queue '{name}'")))?;
        info!(queue_id = %queue.id, matched = %queue.name, "Queue resolved");
        Ok(QueueId::new(queue.id.clone()))
    }

    #[instrument(skip(self), fields(queue_id = %queue_id, date = %date))]
    async fn fetch_metrics(&self, queue_id: &QueueId, date: ReportDate) -> SourceResult<QueueMetrics> {
        let mut url = self.endpoint(&["queues", queue_id.as_str(), "metrics"])?;
        url.query_pairs_mut().append_pair("date", &date.to_iso());

        let response = self.http.send(self.get(&url)).await?.error_for_status(url.as_str())?;
        let MetricsPayload { mut history, agents } = response.json()?;
        history.sort_by_key(|record| record.timestamp);

        debug!(intervals = history.len(), agents = agents.len(), "Metrics received");
        Ok(QueueMetrics { history, agents })
    }
}

#[async_trait]
impl InteractionsSource for PlatformClient {
    #[instrument(skip(self), fields(queue_id = %queue_id))]
    async fn fetch_recent(&self, queue_id: &QueueId) -> SourceResult<Vec<InteractionRecord>> {
        let url = self.endpoint(&["queues", queue_id.as_str(), "interactions"])?;

        let response = self.http.send(self.get(&url)).await?.error_for_status(url.as_str())?;
        let list: InteractionList = response.json()?;

        debug!(interactions = list.entities.len(), "Interactions received");
        Ok(list.entities)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> PlatformClient {
        let http = Arc::new(HttpClient::new("platform", crate::config::HttpConfig::default()).unwrap());
        PlatformClient::with_http(http, base, "t", RetryPolicy::none()).unwrap()
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let platform = client("https://api.platform.example/");
        let url = platform.endpoint(&["queues", "q 1/x", "metrics"]).unwrap();
        assert_eq!(url.as_str(), "https://api.platform.example/api/v2/queues/q%201%2Fx/metrics");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let platform = client("https://gateway.example/reporting");
        let url = platform.endpoint(&["routing", "queues"]).unwrap();
        assert_eq!(url.as_str(), "https://gateway.example/reporting/api/v2/routing/queues");
    }

    #[test]
    fn test_rejects_non_base_url() {
        let http = Arc::new(HttpClient::new("platform", crate::config::HttpConfig::default()).unwrap());
        let result = PlatformClient::with_http(http, "mailto:ops@example.com", "", RetryPolicy::none());
        assert!(matches!(result, Err(NetworkError::Configuration { .. })));
    }
}
