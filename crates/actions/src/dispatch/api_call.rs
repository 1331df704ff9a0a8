//! External API call dispatcher.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::registry::{ActionContext, ActionDispatcher, ActionKind};
use crate::result::ActionOutput;
use crate::Record;

/// Response bodies above this size are truncated in the step output.
const MAX_BODY_BYTES: usize = 4096;

/// HTTP method.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
#[allow(clippy::upper_case_acronyms)]
pub enum HttpMethod {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::GET => Method::GET,
            HttpMethod::POST => Method::POST,
            HttpMethod::PUT => Method::PUT,
            HttpMethod::PATCH => Method::PATCH,
            HttpMethod::DELETE => Method::DELETE,
        }
    }
}

/// Resolved api_call step parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCallConfig {
    /// URL to request.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: HttpMethod,

    /// Request headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// JSON request body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,

    /// Query parameters.
    #[serde(default)]
    pub query: HashMap<String, String>,

    /// Per-request timeout override in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

/// Invokes an external HTTP endpoint with a bounded wait.
pub struct ApiCallDispatcher {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl ApiCallDispatcher {
    pub fn new(default_timeout_seconds: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(default_timeout_seconds))
            .build()
            .unwrap_or_default();

        Self {
            client,
            default_timeout: Duration::from_secs(default_timeout_seconds),
        }
    }

    fn parse_config(params: &Record) -> Result<ApiCallConfig, ActionError> {
        serde_json::from_value(serde_json::Value::Object(params.clone()))
            .map_err(|e| ActionError::Configuration(format!("Invalid api_call parameters: {}", e)))
    }
}

#[async_trait]
impl ActionDispatcher for ApiCallDispatcher {
    fn kind(&self) -> ActionKind {
        ActionKind::ApiCall
    }

    async fn execute(
        &self,
        params: &Record,
        ctx: &ActionContext,
    ) -> Result<ActionOutput, ActionError> {
        let config = Self::parse_config(params)?;
        let timeout = config
            .timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);

        let start = std::time::Instant::now();
        let method: Method = config.method.clone().into();
        let mut request = self.client.request(method, &config.url).timeout(timeout);

        if !config.query.is_empty() {
            request = request.query(&config.query);
        }
        for (key, value) in &config.headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(ref payload) = config.payload {
            request = request.json(payload);
        }

        tracing::debug!(
            run_id = %ctx.run_id,
            step = %ctx.step_id,
            url = %config.url,
            method = ?config.method,
            "Executing API call"
        );

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ActionError::Timeout(timeout.as_secs())
            } else {
                ActionError::Network(e.to_string())
            }
        })?;

        let status_code = response.status().as_u16();
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_BODY_BYTES {
            let cut = body
                .char_indices()
                .take_while(|(i, _)| *i < MAX_BODY_BYTES)
                .last()
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(0);
            body.truncate(cut);
        }

        if !(200..300).contains(&status_code) {
            return Err(ActionError::HttpStatus(status_code));
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        Ok(
            ActionOutput::from_value(serde_json::json!({
                "status_code": status_code,
                "body": body,
                "url": config.url,
            }))
            .with_duration(duration_ms),
        )
    }
}
