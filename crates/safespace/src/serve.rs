// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `safespace serve` command implementation.
//!
//! Builds the upstream provider, memory, cache and relay from configuration
//! and runs the HTTP gateway until SIGINT or SIGTERM.

use std::sync::Arc;

use safespace_config::SafeSpaceConfig;
use safespace_core::{CompletionProvider, SafeSpaceError};
use safespace_gateway::{GatewayState, start_server};
use safespace_openai::OpenAiProvider;
use tracing::{info, warn};

use crate::shutdown;

/// Runs the gateway with the given configuration.
pub async fn run_serve(config: SafeSpaceConfig) -> Result<(), SafeSpaceError> {
    init_tracing(&config.server.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "starting safespace serve");

    let provider = build_provider(&config);
    let state = GatewayState::from_config(&config, provider);
    let shutdown = shutdown::install_signal_handler();

    start_server(&config.server, state, shutdown).await
}

/// The gateway still starts without a credential; chat requests then fail
/// with a configuration error and `/health` reports it.
fn build_provider(config: &SafeSpaceConfig) -> Option<Arc<dyn CompletionProvider>> {
    match OpenAiProvider::new(&config.openai) {
        Ok(provider) => Some(Arc::new(provider)),
        Err(e) => {
            warn!(error = %e, "upstream provider unavailable");
            None
        }
    }
}

/// `RUST_LOG` wins; otherwise `safespace={log_level},warn`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("safespace={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
