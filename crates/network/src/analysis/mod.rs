//! Forensic Analysis Client
//!
//! Sends the MOS series to a chat-completions style text service and returns
//! the narrative. Implements the core [`AnalysisSource`] trait.

pub mod prompt;

use crate::config::{AnalysisConfig, NetworkConfig};
use crate::error::{NetworkError, NetworkResult};
use crate::http::{HttpClient, HttpClientTrait, RetryPolicy};
use crate::types::HttpRequest;
use async_trait::async_trait;
use queuepulse_core::error::SourceResult;
use queuepulse_core::sources::AnalysisSource;
use queuepulse_core::types::MosSample;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use url::Url;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl ChatMessage {
    fn new(role: &str, content: String) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content),
        }
    }
}

/// Client of the text analysis service
pub struct AnalysisClient {
    http: Arc<dyn HttpClientTrait>,
    endpoint: Url,
    config: AnalysisConfig,
    retry: RetryPolicy,
}

impl AnalysisClient {
    /// Create client from configuration
    ///
    /// # Errors
    /// Returns error if the endpoint is invalid or the HTTP client cannot be built
    pub fn new(config: &NetworkConfig) -> NetworkResult<Self> {
        let http = Arc::new(HttpClient::new("analysis", config.http.clone())?);
        Self::with_http(
            http,
            config.analysis.clone(),
            RetryPolicy::from_config(&config.http.retry),
        )
    }

    /// Create client on top of an existing HTTP client
    ///
    /// # Errors
    /// Returns error if the endpoint does not parse
    pub fn with_http(
        http: Arc<dyn HttpClientTrait>,
        config: AnalysisConfig,
        retry: RetryPolicy,
    ) -> NetworkResult<Self> {
        Ok(Self {
            http,
            endpoint: Url::parse(&config.endpoint)?,
            config,
            retry,
        })
    }

    /// Underlying HTTP client, for health and statistics
    pub fn http(&self) -> &Arc<dyn HttpClientTrait> {
        &self.http
    }

    fn request(&self, series: &[MosSample]) -> NetworkResult<HttpRequest> {
        let system = self
            .config
            .system_prompt
            .clone()
            .unwrap_or_else(|| prompt::DEFAULT_SYSTEM_PROMPT.to_string());
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage::new("system", system),
                ChatMessage::new("user", prompt::user_prompt(series)?),
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        HttpRequest::post(self.endpoint.as_str())
            .bearer(&self.config.api_key)
            .json_body(&body)
    }
}

#[async_trait]
impl AnalysisSource for AnalysisClient {
    #[instrument(skip(self, series), fields(samples = series.len(), model = %self.config.model))]
    async fn analyze(&self, series: &[MosSample]) -> SourceResult<String> {
        let request = self.request(series)?;
        let response = self
            .http
            .send_with_retry(request, self.retry.clone())
            .await?
            .error_for_status(self.endpoint.as_str())?;
        let reply: ChatResponse = response.json()?;

        let text = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| NetworkError::json("analysis reply has no message content"))?;

        info!(chars = text.len(), "Analysis received");
        Ok(text)
    }
}
