// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parser for SSE response bodies captured in tests.

use std::convert::Infallible;

use eventsource_stream::Eventsource;
use futures::executor::block_on;
use futures::future;
use futures::stream::{self, StreamExt};

/// One event from a captured SSE body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name; `"message"` when the record had no `event:` line.
    pub event: String,
    /// Concatenated `data:` lines.
    pub data: String,
}

impl SseEvent {
    /// Parse `data` as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.data).unwrap_or(serde_json::Value::Null)
    }
}

/// Split a complete SSE body into events, skipping comment-only records.
pub fn parse_sse(body: &str) -> Vec<SseEvent> {
    let chunks = stream::iter([Ok::<_, Infallible>(body.to_string())]);
    block_on(
        chunks
            .eventsource()
            .filter_map(|result| future::ready(result.ok()))
            .map(|event| SseEvent {
                event: event.event,
                data: event.data,
            })
            .collect(),
    )
}
