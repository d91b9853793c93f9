// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion provider for deterministic testing.
//!
//! `MockProvider` implements `CompletionProvider` with scripted replies, so
//! relay and gateway tests run without an upstream service.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use tokio::sync::Mutex;

use safespace_core::{CompletionProvider, CompletionRequest, DeltaStream, SafeSpaceError};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Stream these deltas, then end normally.
    Deltas(Vec<String>),
    /// Fail before any delta, like a non-success upstream status.
    Fail(String),
    /// Stream these deltas, then fail.
    FailAfter { deltas: Vec<String>, error: String },
    /// Stream these deltas, then never finish.
    Hang(Vec<String>),
}

impl MockReply {
    /// Deltas from string slices.
    pub fn deltas(parts: &[&str]) -> Self {
        MockReply::Deltas(parts.iter().map(|p| p.to_string()).collect())
    }
}

/// A mock completion provider.
///
/// Replies are popped from a FIFO queue. When the queue is empty, a single
/// "mock response" delta is streamed.
#[derive(Clone, Default)]
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    calls: Arc<AtomicUsize>,
    dropped: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a new mock provider with an empty reply queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock provider pre-loaded with the given replies.
    pub fn with_replies(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            ..Self::default()
        }
    }

    /// Add a reply to the end of the queue.
    pub async fn push(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Number of `stream` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of delta streams that have been dropped, finished or not.
    pub fn streams_dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    async fn next_reply(&self) -> MockReply {
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockReply::deltas(&["mock response"]))
    }
}

/// Bumps a counter when the owning stream is dropped.
struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn ok_items(deltas: Vec<String>) -> Vec<Result<String, SafeSpaceError>> {
    deltas.into_iter().map(Ok).collect()
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn stream(&self, request: CompletionRequest) -> Result<DeltaStream, SafeSpaceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request);

        let items = match self.next_reply().await {
            MockReply::Fail(message) => return Err(SafeSpaceError::provider(message)),
            MockReply::Deltas(deltas) => stream::iter(ok_items(deltas)).boxed(),
            MockReply::FailAfter { deltas, error } => {
                let mut items = ok_items(deltas);
                items.push(Err(SafeSpaceError::provider(error)));
                stream::iter(items).boxed()
            }
            MockReply::Hang(deltas) => stream::iter(ok_items(deltas))
                .chain(stream::pending())
                .boxed(),
        };

        let guard = DropCounter(Arc::clone(&self.dropped));
        Ok(Box::pin(items.map(move |item| {
            let _ = &guard;
            item
        })))
    }
}
