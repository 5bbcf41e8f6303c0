//! HTTP Client Implementation
//!
//! reqwest-backed client with connection pooling, a circuit breaker and
//! request metrics. 5xx responses come back as [`NetworkError::Http`] so
//! the breaker and the retry policy see them; other responses are returned
//! as-is and callers check them with [`HttpResponse::error_for_status`].

use crate::config::HttpConfig;
use crate::error::{NetworkError, NetworkResult};
use crate::http::circuit_breaker::CircuitBreakerConfig;
use crate::http::retry::retry_async;
use crate::http::{CircuitBreaker, CircuitBreakerState, HttpClientStats, HttpClientTrait, RetryPolicy};
use crate::metrics::ApiMetrics;
use crate::types::{HttpMethod, HttpRequest, HttpResponse, REQUEST_ID_HEADER};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Pooled HTTP client for one remote component
pub struct HttpClient {
    client: Client,
    config: HttpConfig,
    component: String,
    circuit_breaker: Arc<CircuitBreaker>,
    metrics: Arc<ApiMetrics>,
    active_requests: AtomicU64,
}

/// Counts one request as active until dropped, including on cancellation
struct InFlight<'a>(&'a AtomicU64);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicU64) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl HttpClient {
    /// Create new HTTP client for `component` (used in logs, metrics and
    /// circuit-breaker errors)
    ///
    /// # Errors
    /// Returns error if client configuration is invalid
    pub fn new(component: impl Into<String>, config: HttpConfig) -> NetworkResult<Self> {
        let mut client_builder = Client::builder()
            .pool_max_idle_per_host(usize::try_from(config.max_connections_per_host).unwrap_or(usize::MAX))
            .pool_idle_timeout(Duration::from_secs(config.keep_alive_timeout_s))
            .connect_timeout(Duration::from_secs(config.connection_timeout_s))
            .timeout(Duration::from_secs(config.request_timeout_s))
            .user_agent(config.user_agent.clone())
            .tcp_nodelay(true);

        if config.enable_http2 {
            client_builder = client_builder.http2_prior_knowledge();
        }

        client_builder = client_builder
            .gzip(config.enable_compression)
            .brotli(config.enable_compression);

        let client = client_builder.build().map_err(|e| {
            NetworkError::config("http_client", format!("Failed to build HTTP client: {e}"))
        })?;

        let component = component.into();
        let circuit_breaker = Arc::new(CircuitBreaker::new(
            component.clone(),
            CircuitBreakerConfig::from(&config.circuit_breaker),
        ));

        Ok(Self {
            client,
            config,
            component,
            circuit_breaker,
            metrics: Arc::new(ApiMetrics::new()),
            active_requests: AtomicU64::new(0),
        })
    }

    const fn convert_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        }
    }

    fn build_request(&self, request: &HttpRequest) -> RequestBuilder {
        let mut req_builder = self
            .client
            .request(Self::convert_method(request.method), &request.url)
            .header(REQUEST_ID_HEADER, request.id.to_string());

        for (name, value) in &request.headers {
            req_builder = req_builder.header(name, value);
        }
        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            req_builder = req_builder.timeout(timeout);
        }

        req_builder
    }

    fn map_send_error(&self, request: &HttpRequest, err: &reqwest::Error) -> NetworkError {
        if err.is_timeout() {
            let limit = request
                .timeout
                .unwrap_or_else(|| Duration::from_secs(self.config.request_timeout_s));
            NetworkError::timeout(
                format!("{} {}", request.method, request.url),
                limit,
                Some(request.url.clone()),
            )
        } else {
            NetworkError::connection(&request.url, err.to_string())
        }
    }

    /// Execute HTTP request with circuit breaker protection
    #[instrument(skip(self, request), fields(component = %self.component, method = %request.method, url = %request.url, request_id = %request.id))]
    async fn execute_request(&self, request: &HttpRequest) -> NetworkResult<HttpResponse> {
        let start_time = Instant::now();
        let in_flight = InFlight::enter(&self.active_requests);

        let result = self
            .circuit_breaker
            .execute(|| async {
                let response = self
                    .build_request(request)
                    .send()
                    .await
                    .map_err(|e| self.map_send_error(request, &e))?;

                let status_code = response.status().as_u16();
                let headers = response
                    .headers()
                    .iter()
                    .filter_map(|(name, value)| {
                        value
                            .to_str()
                            .ok()
                            .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
                    })
                    .collect();
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| self.map_send_error(request, &e))?
                    .to_vec();

                let response = HttpResponse {
                    status_code,
                    headers,
                    body,
                    latency: start_time.elapsed(),
                };
                if response.status_code >= 500 {
                    return response.error_for_status(&request.url);
                }
                Ok(response)
            })
            .await;

        drop(in_flight);
        let latency = start_time.elapsed();
        let component = self.component.clone();

        match &result {
            Ok(response) => {
                debug!(
                    status = response.status_code,
                    bytes = response.body.len(),
                    latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    "HTTP response received"
                );
                self.metrics.record_response(
                    response.status_code,
                    latency,
                    u64::try_from(response.body.len()).unwrap_or(u64::MAX),
                );
                metrics::counter!(
                    "queuepulse_http_requests_total",
                    "component" => component.clone(),
                    "status" => response.status_class()
                )
                .increment(1);
            }
            Err(NetworkError::Http { status_code, .. }) => {
                warn!(status = status_code, "Server error");
                self.metrics.record_response(*status_code, latency, 0);
                self.metrics.record_error("server");
                metrics::counter!(
                    "queuepulse_http_requests_total",
                    "component" => component.clone(),
                    "status" => format!("{}xx", status_code / 100)
                )
                .increment(1);
            }
            Err(error) => {
                warn!(error = %error, "HTTP request failed");
                self.metrics.record_transport_failure(error.kind(), latency);
                metrics::counter!(
                    "queuepulse_http_requests_total",
                    "component" => component.clone(),
                    "status" => error.kind()
                )
                .increment(1);
            }
        }
        metrics::histogram!("queuepulse_http_request_duration_seconds", "component" => component)
            .record(latency.as_secs_f64());

        result
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn send(&self, request: HttpRequest) -> NetworkResult<HttpResponse> {
        self.execute_request(&request).await
    }

    async fn send_with_retry(
        &self,
        request: HttpRequest,
        retry_policy: RetryPolicy,
    ) -> NetworkResult<HttpResponse> {
        let name = format!("{} {}", request.method, self.component);
        retry_async(&name, || self.execute_request(&request), retry_policy).await
    }

    fn stats(&self) -> HttpClientStats {
        let breaker = self.circuit_breaker.stats();
        let metrics = self.metrics.snapshot();
        HttpClientStats {
            total_requests: metrics.total_requests,
            successful_responses: metrics.successful_responses,
            failed_requests: metrics.total_requests.saturating_sub(metrics.successful_responses),
            avg_response_time_us: metrics.avg_latency_us,
            p95_response_time_us: metrics.p95_latency_us,
            errors: metrics.error_counts,
            active_requests: self.active_requests.load(Ordering::Relaxed),
            circuit_breaker_state: breaker.state,
        }
    }

    fn is_healthy(&self) -> bool {
        self.circuit_breaker.state() != CircuitBreakerState::Open
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_http_client_creation() {
        let client = HttpClient::new("platform", HttpConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_stats_initialization() {
        let client = HttpClient::new("platform", HttpConfig::default()).unwrap();
        let stats = client.stats();

        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.active_requests, 0);
        assert!(stats.errors.is_empty());
        assert_eq!(stats.circuit_breaker_state, CircuitBreakerState::Closed);
        assert!(client.is_healthy());
    }

    #[tokio::test]
    async fn test_abandoned_request_is_not_left_active() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client = HttpClient::new("platform", HttpConfig::default()).unwrap();
        let request = HttpRequest::get(format!("{}/slow", server.uri()));
        let abandoned = tokio::time::timeout(Duration::from_millis(100), client.send(request)).await;

        assert!(abandoned.is_err());
        assert_eq!(client.stats().active_requests, 0);
    }
}
