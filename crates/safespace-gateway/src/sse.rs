// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-Sent Events framing for relay runs.
//!
//! Event format:
//! ```text
//! event: chunk
//! data: "partial reply"
//!
//! event: done
//! data: {"crisis":false,"personality":"calm_listener","cached":false}
//! ```
//!
//! The relay runs in its own task and writes to an mpsc channel; the response
//! body drains that channel. The body owns a [`DropGuard`] for the turn's
//! cancellation token, so a client disconnect cancels the relay.

use std::convert::Infallible;
use std::sync::Arc;

use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::stream::{self, Stream};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::relay::{ChatRelay, PreparedTurn, RELAY_BUFFER, RelayEvent};

impl From<&RelayEvent> for Event {
    fn from(event: &RelayEvent) -> Self {
        Event::default()
            .event(event.name())
            .data(event.data().to_string())
    }
}

/// Spawn the relay for `turn` and stream its events to the client.
pub fn stream_turn(relay: Arc<ChatRelay>, turn: PreparedTurn) -> Response {
    let cancel = CancellationToken::new();
    let (tx, rx) = mpsc::channel(RELAY_BUFFER);

    let task_cancel = cancel.clone();
    tokio::spawn(async move {
        relay.run(turn, tx, task_cancel).await;
    });

    let sse = Sse::new(event_stream(rx, cancel.drop_guard())).keep_alive(KeepAlive::default());
    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        sse,
    )
        .into_response()
}

fn event_stream(
    rx: mpsc::Receiver<RelayEvent>,
    guard: DropGuard,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let event = rx.recv().await?;
        Some((Ok(Event::from(&event)), (rx, guard)))
    })
}
