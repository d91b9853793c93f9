// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider trait for upstream chat completion services.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::SafeSpaceError;
use crate::types::CompletionRequest;

/// A stream of non-empty text deltas in upstream order.
///
/// The stream ends when the upstream sends its terminal sentinel or closes
/// the connection. An `Err` item is a stream-level failure; malformed
/// individual records never surface here.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, SafeSpaceError>> + Send>>;

/// Adapter for an upstream chat completion service.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &str;

    /// Sends a streaming completion request.
    ///
    /// Resolves once the upstream has accepted the request (success status)
    /// and returns the incremental deltas. Dropping the returned stream
    /// releases the upstream connection.
    async fn stream(&self, request: CompletionRequest) -> Result<DeltaStream, SafeSpaceError>;
}
