//! HTTP client for the natural-language query parser.
//!
//! `POST {base}/parse-query` with `{ "query", "context" }` and a bearer key;
//! the service answers `{ "filters": {...}, "intent": "..." }`.

use std::time::Duration;

use async_trait::async_trait;
use estate_core::error::UpstreamError;
use estate_core::ports::{NlpService, ParsedQuery, PortResult};
use serde::Serialize;

/// Default time the translator waits for the parser.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct NlpConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl NlpConfig {
    /// Load the parser configuration. Returns `None` when `NLP_SERVICE_URL`
    /// is unset or empty, in which case search runs on local parsing only.
    ///
    /// | Env Var            | Default |
    /// |--------------------|---------|
    /// | `NLP_SERVICE_URL`  | --      |
    /// | `NLP_API_KEY`      | --      |
    /// | `NLP_TIMEOUT_SECS` | `10`    |
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("NLP_SERVICE_URL")
            .ok()
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())?;

        let api_key = std::env::var("NLP_API_KEY").ok().filter(|k| !k.is_empty());

        let timeout_secs: u64 = std::env::var("NLP_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("NLP_TIMEOUT_SECS must be a valid u64");

        Some(Self {
            base_url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NlpApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("NLP service error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

impl From<NlpApiError> for UpstreamError {
    fn from(err: NlpApiError) -> Self {
        UpstreamError::nlp(err.to_string())
    }
}

#[derive(Serialize)]
struct ParseRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a serde_json::Value>,
}

pub struct NlpClient {
    client: reqwest::Client,
    config: NlpConfig,
}

impl NlpClient {
    pub fn new(config: NlpConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn post_parse(
        &self,
        query: &str,
        context: Option<&serde_json::Value>,
    ) -> Result<ParsedQuery, NlpApiError> {
        let mut request = self
            .client
            .post(format!("{}/parse-query", self.config.base_url))
            .timeout(self.config.timeout)
            .json(&ParseRequest { query, context });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(NlpApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let mut parsed: ParsedQuery = response.json().await?;
        parsed.intent = parsed.intent.filter(|intent| !intent.is_empty());
        Ok(parsed)
    }
}

#[async_trait]
impl NlpService for NlpClient {
    async fn parse_query(
        &self,
        query: &str,
        context: Option<&serde_json::Value>,
    ) -> PortResult<ParsedQuery> {
        Ok(self.post_parse(query, context).await?)
    }

    fn timeout(&self) -> Duration {
        self.config.timeout
    }
}
