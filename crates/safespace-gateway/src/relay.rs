// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The chat relay: one request from validation to its terminal event.
//!
//! A turn moves through
//! `INIT -> AWAITING_UPSTREAM -> STREAMING -> COMPLETING -> {DONE, FAILED, CANCELLED}`.
//! Events are written to an mpsc channel so the same relay drives both the
//! SSE endpoint and the buffered JSON endpoint. Memory and cache are only
//! written in `COMPLETING`, so a failed or abandoned turn leaves no trace.

use std::sync::Arc;

use futures::StreamExt;
use safespace_config::SafeSpaceConfig;
use safespace_core::{
    CompletionProvider, CompletionRequest, ConversationTurn, PersonalityId, SafeSpaceError,
};
use safespace_memory::{ConversationMemory, ResponseCache};
use safespace_persona::{BASE_PROMPT, Selection};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Reply used when the upstream produced no visible text.
pub const FALLBACK_REPLY: &str = "I'm here with you. Would you like to share a bit more?";

/// Client-facing message for a request without user id or message.
pub const MISSING_INPUT: &str = "Missing userId or message";

/// Settings applied to every upstream request.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub model: String,
    pub temperature: f32,
    pub crisis_temperature: f32,
    /// System preamble sent before the personality prompt.
    pub base_prompt: String,
}

impl RelaySettings {
    pub fn from_config(config: &SafeSpaceConfig) -> Self {
        Self {
            model: config.openai.model.clone(),
            temperature: config.openai.temperature,
            crisis_temperature: config.openai.crisis_temperature,
            base_prompt: config
                .persona
                .base_prompt
                .clone()
                .unwrap_or_else(|| BASE_PROMPT.to_string()),
        }
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self::from_config(&SafeSpaceConfig::default())
    }
}

/// Inbound chat request, from a query string or a JSON body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub personality: Option<String>,
}

/// A request that passed validation.
#[derive(Debug, Clone)]
pub struct PreparedTurn {
    pub user_id: String,
    pub message: String,
    pub selection: Selection,
}

/// Payload of the terminal `done` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DonePayload {
    pub crisis: bool,
    pub personality: PersonalityId,
    pub cached: bool,
}

/// Events emitted by a relay run, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// A delta or a replayed cached reply.
    Chunk(String),
    /// Successful completion.
    Done(DonePayload),
    /// Upstream failure, already reduced to a client-safe message.
    Error(String),
}

impl RelayEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            RelayEvent::Chunk(_) => "chunk",
            RelayEvent::Done(_) => "done",
            RelayEvent::Error(_) => "error",
        }
    }

    /// JSON payload carried in the SSE `data:` field.
    pub fn data(&self) -> serde_json::Value {
        match self {
            RelayEvent::Chunk(text) | RelayEvent::Error(text) => {
                serde_json::Value::String(text.clone())
            }
            RelayEvent::Done(done) => serde_json::json!({
                "crisis": done.crisis,
                "personality": done.personality,
                "cached": done.cached,
            }),
        }
    }
}

/// How a relay run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Done,
    Failed,
    Cancelled,
}

/// Buffered result of a relay run, for the JSON endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub crisis: bool,
    pub personality: PersonalityId,
    pub cached: bool,
}

/// Shared relay, one per process.
pub struct ChatRelay {
    provider: Option<Arc<dyn CompletionProvider>>,
    memory: Arc<ConversationMemory>,
    cache: Arc<ResponseCache>,
    settings: RelaySettings,
}

impl ChatRelay {
    /// `provider` is `None` when no upstream credential is available; every
    /// valid request then fails with a configuration error.
    pub fn new(
        provider: Option<Arc<dyn CompletionProvider>>,
        memory: Arc<ConversationMemory>,
        cache: Arc<ResponseCache>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            provider,
            memory,
            cache,
            settings,
        }
    }

    pub fn memory(&self) -> &Arc<ConversationMemory> {
        &self.memory
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Whether an upstream provider is available.
    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// INIT: validate input, then check that an upstream is configured.
    pub fn prepare(&self, request: &ChatRequest) -> Result<PreparedTurn, SafeSpaceError> {
        let user_id = request.user_id.as_deref().map(str::trim).unwrap_or_default();
        let message = request.message.as_deref().map(str::trim).unwrap_or_default();
        if user_id.is_empty() || message.is_empty() {
            return Err(SafeSpaceError::Validation(MISSING_INPUT.to_string()));
        }
        if self.provider.is_none() {
            return Err(SafeSpaceError::Config(
                "no upstream API key configured".to_string(),
            ));
        }

        let selection = safespace_persona::select(message, request.personality.as_deref());
        if selection.crisis {
            warn!(user_id, "crisis phrase detected, switching to crisis_mode");
        }

        Ok(PreparedTurn {
            user_id: user_id.to_string(),
            message: message.to_string(),
            selection,
        })
    }

    /// Upstream request for `turn`: preamble, personality prompt, history,
    /// then the new user message.
    pub fn build_request(&self, turn: &PreparedTurn) -> CompletionRequest {
        let history = self.memory.get(&turn.user_id);
        let mut messages = Vec::with_capacity(history.len() + 3);
        messages.push(ConversationTurn::system(self.settings.base_prompt.clone()));
        messages.push(ConversationTurn::system(safespace_persona::prompt_for(
            turn.selection.personality,
        )));
        messages.extend(history);
        messages.push(ConversationTurn::user(turn.message.clone()));

        let temperature = if turn.selection.crisis {
            self.settings.crisis_temperature
        } else {
            self.settings.temperature
        };

        CompletionRequest {
            model: self.settings.model.clone(),
            messages,
            temperature,
        }
    }

    /// Drive one turn to its terminal state, writing events to `events`.
    ///
    /// Cancelling `cancel` (or dropping the receiver) abandons the turn:
    /// nothing more is emitted and nothing is committed.
    pub async fn run(
        &self,
        turn: PreparedTurn,
        events: mpsc::Sender<RelayEvent>,
        cancel: CancellationToken,
    ) -> RelayOutcome {
        let Selection {
            personality,
            crisis,
        } = turn.selection;
        let key = ResponseCache::key(&turn.user_id, personality, &turn.message);

        if let Some(reply) = self.cache.get(&key) {
            debug!(user_id = %turn.user_id, %personality, "serving cached reply");
            let done = DonePayload {
                crisis,
                personality,
                cached: true,
            };
            if !emit(&events, &cancel, RelayEvent::Chunk(reply)).await
                || !emit(&events, &cancel, RelayEvent::Done(done)).await
            {
                return RelayOutcome::Cancelled;
            }
            return RelayOutcome::Done;
        }

        let Some(provider) = self.provider.as_ref() else {
            let err = SafeSpaceError::Config("no upstream API key configured".to_string());
            emit(&events, &cancel, RelayEvent::Error(err.client_message())).await;
            return RelayOutcome::Failed;
        };

        // AWAITING_UPSTREAM
        let request = self.build_request(&turn);
        let started = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(user_id = %turn.user_id, "client left while awaiting upstream");
                return RelayOutcome::Cancelled;
            }
            result = provider.stream(request) => result,
        };
        let mut deltas = match started {
            Ok(stream) => stream,
            Err(e) => return self.fail(&turn, &events, &cancel, e).await,
        };

        // STREAMING
        let mut reply = String::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(user_id = %turn.user_id, "client left mid-stream");
                    return RelayOutcome::Cancelled;
                }
                next = deltas.next() => next,
            };
            match next {
                None => break,
                Some(Ok(delta)) if delta.is_empty() => continue,
                Some(Ok(delta)) => {
                    reply.push_str(&delta);
                    if !emit(&events, &cancel, RelayEvent::Chunk(delta)).await {
                        return RelayOutcome::Cancelled;
                    }
                }
                Some(Err(e)) => return self.fail(&turn, &events, &cancel, e).await,
            }
        }
        drop(deltas);

        // COMPLETING
        if cancel.is_cancelled() {
            return RelayOutcome::Cancelled;
        }
        if reply.trim().is_empty() {
            debug!(user_id = %turn.user_id, "empty upstream reply, using fallback");
            reply = FALLBACK_REPLY.to_string();
            if !emit(&events, &cancel, RelayEvent::Chunk(reply.clone())).await {
                return RelayOutcome::Cancelled;
            }
        }

        self.memory
            .append(&turn.user_id, ConversationTurn::user(turn.message.clone()));
        self.memory
            .append(&turn.user_id, ConversationTurn::assistant(reply.clone()));
        self.cache.put(key, reply);

        info!(
            user_id = %turn.user_id,
            %personality,
            crisis,
            cached = false,
            "chat turn completed"
        );

        let done = DonePayload {
            crisis,
            personality,
            cached: false,
        };
        emit(&events, &cancel, RelayEvent::Done(done)).await;
        RelayOutcome::Done
    }

    /// Run a turn to completion and buffer its output.
    pub async fn complete(&self, turn: PreparedTurn) -> Result<ChatReply, SafeSpaceError> {
        let (tx, mut rx) = mpsc::channel(RELAY_BUFFER);
        let run = self.run(turn, tx, CancellationToken::new());
        let collect = async {
            let mut reply = String::new();
            let mut done = None;
            let mut error = None;
            while let Some(event) = rx.recv().await {
                match event {
                    RelayEvent::Chunk(text) => reply.push_str(&text),
                    RelayEvent::Done(payload) => done = Some(payload),
                    RelayEvent::Error(message) => error = Some(message),
                }
            }
            (reply, done, error)
        };
        let (_, (reply, done, error)) = tokio::join!(run, collect);

        match (done, error) {
            (Some(done), _) => Ok(ChatReply {
                reply,
                crisis: done.crisis,
                personality: done.personality,
                cached: done.cached,
            }),
            (None, Some(message)) => Err(SafeSpaceError::provider(message)),
            (None, None) => Err(SafeSpaceError::Internal(
                "relay ended without a terminal event".to_string(),
            )),
        }
    }

    async fn fail(
        &self,
        turn: &PreparedTurn,
        events: &mpsc::Sender<RelayEvent>,
        cancel: &CancellationToken,
        error: SafeSpaceError,
    ) -> RelayOutcome {
        warn!(user_id = %turn.user_id, error = %error, "upstream request failed");
        emit(events, cancel, RelayEvent::Error(error.client_message())).await;
        RelayOutcome::Failed
    }
}

/// Channel capacity between a relay run and its consumer.
pub const RELAY_BUFFER: usize = 64;

/// Send `event` unless the turn was cancelled. False when the consumer is gone.
async fn emit(
    events: &mpsc::Sender<RelayEvent>,
    cancel: &CancellationToken,
    event: RelayEvent,
) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    events.send(event).await.is_ok()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use safespace_core::Role;
    use safespace_memory::ResponseCache;
    use safespace_test_utils::{MockProvider, MockReply};

    use super::*;

    struct Fixture {
        relay: Arc<ChatRelay>,
        provider: MockProvider,
    }

    fn fixture(replies: Vec<MockReply>) -> Fixture {
        let provider = MockProvider::with_replies(replies);
        let upstream: Arc<dyn CompletionProvider> = Arc::new(provider.clone());
        let relay = ChatRelay::new(
            Some(upstream),
            Arc::new(ConversationMemory::new(12)),
            Arc::new(ResponseCache::new(16, Duration::from_secs(300))),
            RelaySettings::default(),
        );
        Fixture {
            relay: Arc::new(relay),
            provider,
        }
    }

    fn request(user: &str, message: &str, personality: Option<&str>) -> ChatRequest {
        ChatRequest {
            user_id: Some(user.into()),
            message: Some(message.into()),
            personality: personality.map(String::from),
        }
    }

    async fn run_collect(relay: &ChatRelay, req: ChatRequest) -> (RelayOutcome, Vec<RelayEvent>) {
        let turn = relay.prepare(&req).unwrap();
        let (tx, mut rx) = mpsc::channel(RELAY_BUFFER);
        let outcome = relay.run(turn, tx, CancellationToken::new()).await;
        let mut events = Vec::new();
        while let Some(e) = rx.recv().await {
            events.push(e);
        }
        (outcome, events)
    }

    fn chunks(events: &[RelayEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                RelayEvent::Chunk(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn missing_fields_are_rejected() {
        let f = fixture(vec![]);
        for req in [
            ChatRequest::default(),
            request("u1", "   ", None),
            request("  ", "hello", None),
            ChatRequest {
                user_id: Some("u1".into()),
                ..ChatRequest::default()
            },
        ] {
            let err = f.relay.prepare(&req).unwrap_err();
            assert!(matches!(err, SafeSpaceError::Validation(ref m) if m == MISSING_INPUT));
        }
    }

    #[test]
    fn validation_precedes_configuration_check() {
        let relay = ChatRelay::new(
            None,
            Arc::new(ConversationMemory::default()),
            Arc::new(ResponseCache::new(4, Duration::from_secs(60))),
            RelaySettings::default(),
        );
        assert!(matches!(
            relay.prepare(&ChatRequest::default()),
            Err(SafeSpaceError::Validation(_))
        ));
        assert!(matches!(
            relay.prepare(&request("u1", "hi", None)),
            Err(SafeSpaceError::Config(_))
        ));
        assert!(!relay.is_configured());
    }

    #[tokio::test]
    async fn message_is_trimmed_before_use() {
        let f = fixture(vec![MockReply::deltas(&["ok"])]);
        let turn = f.relay.prepare(&request(" u1 ", "  hello \n", None)).unwrap();
        assert_eq!(turn.user_id, "u1");
        assert_eq!(turn.message, "hello");

        let (tx, _rx) = mpsc::channel(RELAY_BUFFER);
        f.relay.run(turn, tx, CancellationToken::new()).await;

        let sent = &f.provider.requests().await[0];
        assert_eq!(sent.messages.last(), Some(&ConversationTurn::user("hello")));
        assert_eq!(f.relay.memory().get("u1")[0], ConversationTurn::user("hello"));
    }

    #[test]
    fn request_layout_and_temperature() {
        let f = fixture(vec![]);
        f.relay.memory().append("u1", ConversationTurn::user("earlier"));
        f.relay
            .memory()
            .append("u1", ConversationTurn::assistant("reply"));

        let turn = f
            .relay
            .prepare(&request("u1", "hello", Some("cbt_helper")))
            .unwrap();
        let req = f.relay.build_request(&turn);
        assert_eq!(req.model, "gpt-4o");
        assert!((req.temperature - 0.9).abs() < f32::EPSILON);
        assert_eq!(req.messages.len(), 5);
        assert_eq!(req.messages[0].content, BASE_PROMPT);
        assert_eq!(
            req.messages[1].content,
            safespace_persona::prompt_for(PersonalityId::CbtHelper)
        );
        assert_eq!(req.messages[2].content, "earlier");
        assert_eq!(req.messages[3].role, Role::Assistant);
        assert_eq!(req.messages[4], ConversationTurn::user("hello"));
    }

    #[test]
    fn crisis_lowers_temperature_and_forces_crisis_mode() {
        let f = fixture(vec![]);
        let turn = f
            .relay
            .prepare(&request("u1", "I want to end my life", Some("motivation_coach")))
            .unwrap();
        assert!(turn.selection.crisis);
        assert_eq!(turn.selection.personality, PersonalityId::CrisisMode);
        let req = f.relay.build_request(&turn);
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(
            req.messages[1].content,
            safespace_persona::prompt_for(PersonalityId::CrisisMode)
        );
    }

    #[tokio::test]
    async fn live_turn_streams_and_commits() {
        let f = fixture(vec![MockReply::deltas(&["I hear ", "you", "."])]);
        let (outcome, events) =
            run_collect(&f.relay, request("u1", "I feel anxious about work", None)).await;

        assert_eq!(outcome, RelayOutcome::Done);
        assert_eq!(
            events,
            vec![
                RelayEvent::Chunk("I hear ".into()),
                RelayEvent::Chunk("you".into()),
                RelayEvent::Chunk(".".into()),
                RelayEvent::Done(DonePayload {
                    crisis: false,
                    personality: PersonalityId::CalmListener,
                    cached: false,
                }),
            ]
        );

        let history = f.relay.memory().get("u1");
        assert_eq!(
            history,
            vec![
                ConversationTurn::user("I feel anxious about work"),
                ConversationTurn::assistant(chunks(&events)),
            ]
        );
        let key = ResponseCache::key("u1", PersonalityId::CalmListener, "I feel anxious about work");
        assert_eq!(f.relay.cache().get(&key).as_deref(), Some("I hear you."));
    }

    #[tokio::test]
    async fn cache_hit_replays_without_upstream_or_memory() {
        let f = fixture(vec![MockReply::deltas(&["first answer"])]);
        let (_, first) = run_collect(&f.relay, request("u1", "hello", None)).await;
        assert_eq!(f.provider.calls(), 1);
        assert_eq!(f.relay.memory().len("u1"), 2);

        let (outcome, second) = run_collect(&f.relay, request("u1", "  hello  ", None)).await;
        assert_eq!(outcome, RelayOutcome::Done);
        assert_eq!(f.provider.calls(), 1);
        assert_eq!(f.relay.memory().len("u1"), 2);
        assert_eq!(chunks(&second), chunks(&first));
        assert_eq!(
            second.last(),
            Some(&RelayEvent::Done(DonePayload {
                crisis: false,
                personality: PersonalityId::CalmListener,
                cached: true,
            }))
        );
    }

    #[tokio::test]
    async fn empty_reply_falls_back_once() {
        let f = fixture(vec![MockReply::deltas(&["", ""])]);
        let (outcome, events) = run_collect(&f.relay, request("u1", "hi", None)).await;
        assert_eq!(outcome, RelayOutcome::Done);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], RelayEvent::Chunk(FALLBACK_REPLY.into()));
        assert_eq!(
            f.relay.memory().get("u1")[1],
            ConversationTurn::assistant(FALLBACK_REPLY)
        );
    }

    #[tokio::test]
    async fn whitespace_reply_falls_back() {
        let f = fixture(vec![MockReply::deltas(&["  ", "\n"])]);
        let (_, events) = run_collect(&f.relay, request("u1", "hi", None)).await;
        let fallbacks = events
            .iter()
            .filter(|e| **e == RelayEvent::Chunk(FALLBACK_REPLY.into()))
            .count();
        assert_eq!(fallbacks, 1);
        let key = ResponseCache::key("u1", PersonalityId::CalmListener, "hi");
        assert_eq!(f.relay.cache().get(&key).as_deref(), Some(FALLBACK_REPLY));
    }

    #[tokio::test]
    async fn upstream_error_before_stream_fails_without_commit() {
        let f = fixture(vec![MockReply::Fail("401 Unauthorized: bad key".into())]);
        let (outcome, events) = run_collect(&f.relay, request("u1", "hi", None)).await;
        assert_eq!(outcome, RelayOutcome::Failed);
        assert_eq!(events.len(), 1);
        match &events[0] {
            RelayEvent::Error(message) => assert!(!message.contains("bad key")),
            other => panic!("expected error event, got {other:?}"),
        }
        assert_eq!(f.relay.memory().len("u1"), 0);
        assert!(f.relay.cache().is_empty());
    }

    #[tokio::test]
    async fn mid_stream_error_fails_without_commit() {
        let f = fixture(vec![MockReply::FailAfter {
            deltas: vec!["partial".into()],
            error: "connection reset".into(),
        }]);
        let (outcome, events) = run_collect(&f.relay, request("u1", "hi", None)).await;
        assert_eq!(outcome, RelayOutcome::Failed);
        assert_eq!(events[0], RelayEvent::Chunk("partial".into()));
        assert!(matches!(events[1], RelayEvent::Error(_)));
        assert_eq!(events.len(), 2);
        assert_eq!(f.relay.memory().len("u1"), 0);
        assert!(f.relay.cache().is_empty());
    }

    #[tokio::test]
    async fn cancellation_mid_stream_commits_nothing() {
        let f = fixture(vec![MockReply::Hang(vec!["Hello".into(), " there".into()])]);
        let turn = f.relay.prepare(&request("u1", "hi", None)).unwrap();
        let (tx, mut rx) = mpsc::channel(RELAY_BUFFER);
        let cancel = CancellationToken::new();

        let relay = Arc::clone(&f.relay);
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move { relay.run(turn, tx, task_cancel).await });

        assert_eq!(rx.recv().await, Some(RelayEvent::Chunk("Hello".into())));
        assert_eq!(rx.recv().await, Some(RelayEvent::Chunk(" there".into())));
        cancel.cancel();

        let outcome = handle.await.unwrap();
        assert_eq!(outcome, RelayOutcome::Cancelled);
        assert_eq!(rx.recv().await, None);
        assert_eq!(f.relay.memory().len("u1"), 0);
        assert!(f.relay.cache().is_empty());
        assert_eq!(f.provider.streams_dropped(), 1);
    }

    #[tokio::test]
    async fn dropped_receiver_cancels_the_turn() {
        let f = fixture(vec![MockReply::deltas(&["a", "b", "c"])]);
        let turn = f.relay.prepare(&request("u1", "hi", None)).unwrap();
        let (tx, rx) = mpsc::channel(RELAY_BUFFER);
        drop(rx);
        let outcome = f.relay.run(turn, tx, CancellationToken::new()).await;
        assert_eq!(outcome, RelayOutcome::Cancelled);
        assert_eq!(f.relay.memory().len("u1"), 0);
    }

    #[tokio::test]
    async fn complete_buffers_the_reply() {
        let f = fixture(vec![MockReply::deltas(&["one ", "two"])]);
        let turn = f.relay.prepare(&request("u1", "hi", Some("journal_helper"))).unwrap();
        let reply = f.relay.complete(turn).await.unwrap();
        assert_eq!(
            reply,
            ChatReply {
                reply: "one two".into(),
                crisis: false,
                personality: PersonalityId::JournalHelper,
                cached: false,
            }
        );
    }

    #[tokio::test]
    async fn complete_maps_failure_to_provider_error() {
        let f = fixture(vec![MockReply::Fail("boom".into())]);
        let turn = f.relay.prepare(&request("u1", "hi", None)).unwrap();
        let err = f.relay.complete(turn).await.unwrap_err();
        assert!(matches!(err, SafeSpaceError::Provider { .. }));
    }

    #[test]
    fn event_payloads() {
        let chunk = RelayEvent::Chunk("hi \"there\"".into());
        assert_eq!(chunk.name(), "chunk");
        assert_eq!(chunk.data(), serde_json::json!("hi \"there\""));

        let done = RelayEvent::Done(DonePayload {
            crisis: true,
            personality: PersonalityId::CrisisMode,
            cached: false,
        });
        assert_eq!(done.name(), "done");
        assert_eq!(
            done.data(),
            serde_json::json!({"crisis": true, "personality": "crisis_mode", "cached": false})
        );
    }
}
