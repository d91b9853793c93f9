// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router,
    routing::{delete, get, post},
};
use safespace_config::SafeSpaceConfig;
use safespace_config::model::ServerConfig;
use safespace_core::{CompletionProvider, SafeSpaceError};
use safespace_memory::{ConversationMemory, ResponseCache};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::relay::{ChatRelay, RelaySettings};

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub relay: Arc<ChatRelay>,
    /// Process start time for uptime calculation.
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(relay: ChatRelay) -> Self {
        Self {
            relay: Arc::new(relay),
            started_at: Instant::now(),
        }
    }

    /// Build memory, cache and relay from configuration.
    pub fn from_config(
        config: &SafeSpaceConfig,
        provider: Option<Arc<dyn CompletionProvider>>,
    ) -> Self {
        let memory = Arc::new(ConversationMemory::new(config.memory.max_turns));
        let cache = Arc::new(ResponseCache::new(
            config.cache.capacity,
            Duration::from_secs(config.cache.ttl_secs),
        ));
        Self::new(ChatRelay::new(
            provider,
            memory,
            cache,
            RelaySettings::from_config(config),
        ))
    }
}

/// All gateway routes.
///
/// - GET /api/chat/stream (SSE, query parameters)
/// - POST /api/chat/stream (SSE, JSON body)
/// - POST /api/chat (JSON)
/// - DELETE /api/memory/{userId}
/// - GET /health
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route(
            "/api/chat/stream",
            get(handlers::stream_chat_query).post(handlers::stream_chat_body),
        )
        .route("/api/chat", post(handlers::chat))
        .route("/api/memory/{user_id}", delete(handlers::clear_memory))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), SafeSpaceError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SafeSpaceError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| SafeSpaceError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
