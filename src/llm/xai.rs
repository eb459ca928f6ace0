use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{ChatCompletions, CompletionRequest, UpstreamResponse};
use crate::config::UpstreamConfig;
use crate::error::{RelayError, Result};

/// Chat completions client for x.ai (or any OpenAI-compatible base URL).
///
/// The credential is supplied per call so the same client serves both the
/// server-held key and keys provided by the pass-through route.
pub struct XaiClient {
    client: Client,
    endpoint: String,
}

impl XaiClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| RelayError::Config(format!("failed to create HTTP client: {e}")))?;

        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));

        info!(
            endpoint = %endpoint,
            model = %config.model,
            timeout_secs = config.timeout_secs,
            "upstream client initialized"
        );

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl ChatCompletions for XaiClient {
    fn name(&self) -> &str {
        "x.ai"
    }

    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<UpstreamResponse> {
        debug!(
            model = %request.model,
            messages = request.messages.as_array().map(Vec::len).unwrap_or(0),
            max_tokens = request.max_tokens,
            "invoking chat completions"
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| RelayError::Upstream(format!("request to {} failed: {e}", self.endpoint)))?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            // Error bodies are best-effort; a proxy page or empty body must
            // still map to the upstream status.
            let body = serde_json::from_str(&text).unwrap_or(Value::Null);
            warn!(status = %status, body = %text, "upstream API error");
            return Ok(UpstreamResponse {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = serde_json::from_str(&text)?;
        debug!(status = %status, response_len = text.len(), "upstream response received");

        Ok(UpstreamResponse {
            status: status.as_u16(),
            body,
        })
    }
}
