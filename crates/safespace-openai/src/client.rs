// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for an OpenAI-compatible Chat Completions API.
//!
//! Provides [`OpenAiClient`] which handles authentication, request
//! construction, and the streaming response. A request is sent exactly once;
//! failures are reported to the caller, never retried.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use safespace_core::{DeltaStream, SafeSpaceError};
use tracing::debug;

use crate::sse;
use crate::types::{ApiErrorResponse, ChatCompletionRequest};

/// Public API endpoint used when no base URL is configured.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for chat completion requests.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    completions_url: String,
}

impl OpenAiClient {
    /// Creates a client that authenticates with `api_key` against `api_base`.
    ///
    /// `timeout` bounds the whole exchange, streaming body included.
    pub fn new(api_key: &str, api_base: &str, timeout: Duration) -> Result<Self, SafeSpaceError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| SafeSpaceError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|e| SafeSpaceError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            completions_url: completions_url(api_base),
        })
    }

    /// Full URL requests are posted to.
    pub fn completions_url(&self) -> &str {
        &self.completions_url
    }

    /// Sends a streaming request and returns the decoded text deltas.
    pub async fn stream_chat(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<DeltaStream, SafeSpaceError> {
        let response = self
            .client
            .post(&self.completions_url)
            .json(request)
            .send()
            .await
            .map_err(|e| SafeSpaceError::Provider {
                message: format!("HTTP request failed: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "streaming response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SafeSpaceError::Provider {
                message: describe_error(status, &body),
                status: Some(status.as_u16()),
                source: None,
            });
        }

        Ok(sse::decode_deltas(response.bytes_stream()))
    }
}

fn completions_url(api_base: &str) -> String {
    format!("{}/chat/completions", api_base.trim_end_matches('/'))
}

fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_err) => match api_err.error.type_ {
            Some(kind) => format!("upstream error {status} ({kind}): {}", api_err.error.message),
            None => format!("upstream error {status}: {}", api_err.error.message),
        },
        Err(_) => format!("upstream returned {status}: {body}"),
    }
}
