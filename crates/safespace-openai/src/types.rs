// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat Completions API wire types.

use safespace_core::{CompletionRequest, ConversationTurn};
use serde::{Deserialize, Serialize};

// --- Request types ---

/// Body of `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub stream: bool,
    pub temperature: f32,
    pub messages: Vec<ApiMessage>,
}

/// One message in the request.
#[derive(Debug, Clone, Serialize)]
pub struct ApiMessage {
    /// "system", "user" or "assistant".
    pub role: String,
    pub content: String,
}

impl From<&ConversationTurn> for ApiMessage {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            role: turn.role.to_string(),
            content: turn.content.clone(),
        }
    }
}

impl ChatCompletionRequest {
    /// Streaming request for a provider-neutral [`CompletionRequest`].
    pub fn streaming(request: &CompletionRequest) -> Self {
        Self {
            model: request.model.clone(),
            stream: true,
            temperature: request.temperature,
            messages: request.messages.iter().map(ApiMessage::from).collect(),
        }
    }
}

// --- Streaming response types ---

/// One `data:` record of a streaming response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: Option<ChoiceDelta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChoiceDelta {
    #[serde(default)]
    pub content: Option<DeltaContent>,
}

/// Delta content as sent by different upstreams: a plain string, a list of
/// string fragments, or something this gateway does not understand.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DeltaContent {
    Text(String),
    Parts(Vec<String>),
    Other(serde_json::Value),
}

impl DeltaContent {
    /// Normalize to plain text; `None` when there is no usable text.
    pub fn into_text(self) -> Option<String> {
        let text = match self {
            DeltaContent::Text(text) => text,
            DeltaContent::Parts(parts) => parts.concat(),
            DeltaContent::Other(_) => return None,
        };
        (!text.is_empty()).then_some(text)
    }
}

impl StreamChunk {
    /// Text delta of the first choice, if any.
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta)
            .and_then(|delta| delta.content)
            .and_then(DeltaContent::into_text)
    }
}

// --- Error types ---

/// Error body returned with non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
}

#[cfg(test)]
mod tests {
    use safespace_core::Role;

    use super::*;

    fn chunk(json: &str) -> StreamChunk {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn string_content_is_extracted() {
        let c = chunk(r#"{"choices":[{"delta":{"content":"Hello"}}]}"#);
        assert_eq!(c.into_text().as_deref(), Some("Hello"));
    }

    #[test]
    fn array_content_is_joined() {
        let c = chunk(r#"{"choices":[{"delta":{"content":["Hel","lo"]}}]}"#);
        assert_eq!(c.into_text().as_deref(), Some("Hello"));
    }

    #[test]
    fn missing_or_null_content_yields_nothing() {
        assert!(chunk(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).into_text().is_none());
        assert!(chunk(r#"{"choices":[{"delta":{"content":null}}]}"#).into_text().is_none());
        assert!(chunk(r#"{"choices":[]}"#).into_text().is_none());
        assert!(chunk(r#"{}"#).into_text().is_none());
    }

    #[test]
    fn empty_and_unknown_content_yields_nothing() {
        assert!(chunk(r#"{"choices":[{"delta":{"content":""}}]}"#).into_text().is_none());
        assert!(chunk(r#"{"choices":[{"delta":{"content":42}}]}"#).into_text().is_none());
    }

    #[test]
    fn request_serializes_with_stream_flag_and_roles() {
        let request = CompletionRequest {
            model: "gpt-4o".into(),
            messages: vec![
                ConversationTurn::new(Role::System, "be kind"),
                ConversationTurn::user("hi"),
            ],
            temperature: 0.7,
        };
        let json = serde_json::to_value(ChatCompletionRequest::streaming(&request)).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn error_body_deserializes() {
        let body = r#"{"error":{"message":"Incorrect API key","type":"invalid_request_error"}}"#;
        let err: ApiErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(err.error.message, "Incorrect API key");
        assert_eq!(err.error.type_.as_deref(), Some("invalid_request_error"));
    }
}
