// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Handles the chat stream (GET query / POST body), buffered chat, memory
//! reset and health.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use safespace_core::SafeSpaceError;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::relay::{ChatRequest, MISSING_INPUT};
use crate::server::GatewayState;
use crate::sse;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// "configured" or "missing_credential".
    pub upstream: String,
}

/// A [`SafeSpaceError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub SafeSpaceError);

impl From<SafeSpaceError> for ApiError {
    fn from(err: SafeSpaceError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            SafeSpaceError::Validation(_) => StatusCode::BAD_REQUEST,
            SafeSpaceError::Provider { .. } => StatusCode::BAD_GATEWAY,
            SafeSpaceError::Config(_) | SafeSpaceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self.0 {
            SafeSpaceError::Validation(_) => {}
            SafeSpaceError::Provider { .. } => warn!(error = %self.0, "chat request failed"),
            _ => error!(error = %self.0, "chat request failed"),
        }
        let body = ErrorResponse {
            error: self.0.client_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// GET /api/chat/stream?userId=..&message=..&personality=..
pub async fn stream_chat_query(
    State(state): State<GatewayState>,
    Query(request): Query<ChatRequest>,
) -> Result<Response, ApiError> {
    start_stream(state, request)
}

/// POST /api/chat/stream with a JSON body.
pub async fn stream_chat_body(
    State(state): State<GatewayState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    start_stream(state, json_body(body)?)
}

fn start_stream(state: GatewayState, request: ChatRequest) -> Result<Response, ApiError> {
    let turn = state.relay.prepare(&request)?;
    Ok(sse::stream_turn(state.relay.clone(), turn))
}

/// POST /api/chat
///
/// Runs the same relay and returns the whole reply as JSON.
pub async fn chat(
    State(state): State<GatewayState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = json_body(body)?;
    let turn = state.relay.prepare(&request)?;
    let reply = state.relay.complete(turn).await?;
    Ok(Json(reply).into_response())
}

/// DELETE /api/memory/{userId}
pub async fn clear_memory(
    State(state): State<GatewayState>,
    Path(user_id): Path<String>,
) -> StatusCode {
    state.relay.memory().clear(user_id.trim());
    info!(user_id = %user_id.trim(), "conversation memory cleared");
    StatusCode::NO_CONTENT
}

/// GET /health
pub async fn health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let upstream = if state.relay.is_configured() {
        "configured"
    } else {
        "missing_credential"
    };
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        upstream: upstream.to_string(),
    })
}

/// A body that is not a JSON object counts as missing fields.
fn json_body(body: Result<Json<ChatRequest>, JsonRejection>) -> Result<ChatRequest, ApiError> {
    match body {
        Ok(Json(request)) => Ok(request),
        Err(rejection) => {
            warn!(error = %rejection, "rejected chat request body");
            Err(SafeSpaceError::Validation(MISSING_INPUT.to_string()).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_statuses() {
        let cases = [
            (SafeSpaceError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (SafeSpaceError::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (SafeSpaceError::provider("x"), StatusCode::BAD_GATEWAY),
            (SafeSpaceError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).into_response().status(), status);
        }
    }
}
