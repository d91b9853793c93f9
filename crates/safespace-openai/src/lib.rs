// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible completion provider for the SafeSpace gateway.
//!
//! Implements [`CompletionProvider`] on top of the streaming Chat Completions
//! API. Any server exposing `POST {base}/chat/completions` with `stream: true`
//! works.

pub mod client;
pub mod sse;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use safespace_config::model::OpenAiConfig;
use safespace_core::{CompletionProvider, CompletionRequest, DeltaStream, SafeSpaceError};
use tracing::{debug, info};

use crate::client::{DEFAULT_API_BASE, OpenAiClient};
use crate::types::ChatCompletionRequest;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable consulted when no base URL is configured.
pub const API_BASE_ENV: &str = "OPENAI_API_BASE";

/// Streaming chat completion provider.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: OpenAiClient,
}

impl OpenAiProvider {
    /// Creates a provider from configuration and the process environment.
    ///
    /// # API Key Resolution
    /// 1. `config.api_key` if set and non-empty
    /// 2. `OPENAI_API_KEY` environment variable
    /// 3. Returns [`SafeSpaceError::Config`] if neither is available
    pub fn new(config: &OpenAiConfig) -> Result<Self, SafeSpaceError> {
        Self::from_lookup(config, |name| std::env::var(name).ok())
    }

    fn from_lookup(
        config: &OpenAiConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SafeSpaceError> {
        let api_key = resolve_api_key(&config.api_key, &env).ok_or_else(|| {
            SafeSpaceError::Config(format!(
                "upstream API key not found. Set openai.api_key in config or {API_KEY_ENV}."
            ))
        })?;
        let api_base = resolve_api_base(&config.api_base, &env);

        let client = OpenAiClient::new(
            &api_key,
            &api_base,
            Duration::from_secs(config.timeout_secs),
        )?;

        info!(
            url = client.completions_url(),
            model = %config.model,
            "chat completion provider initialized"
        );

        Ok(Self { client })
    }

    /// Creates a provider with an existing client.
    pub fn with_client(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn stream(&self, request: CompletionRequest) -> Result<DeltaStream, SafeSpaceError> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "sending streaming completion request"
        );
        let body = ChatCompletionRequest::streaming(&request);
        self.client.stream_chat(&body).await
    }
}

/// Returns true when an upstream credential is available from config or env.
pub fn has_credential(config: &OpenAiConfig) -> bool {
    resolve_api_key(&config.api_key, &|name| std::env::var(name).ok()).is_some()
}

fn resolve_api_key(
    config_key: &Option<String>,
    env: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    if let Some(key) = config_key
        && !key.trim().is_empty()
    {
        return Some(key.clone());
    }
    env(API_KEY_ENV).filter(|key| !key.trim().is_empty())
}

fn resolve_api_base(
    config_base: &Option<String>,
    env: &impl Fn(&str) -> Option<String>,
) -> String {
    if let Some(base) = config_base
        && !base.trim().is_empty()
    {
        return base.clone();
    }
    env(API_BASE_ENV)
        .filter(|base| !base.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
}
