// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for SafeSpace.
//!
//! Accepts chat requests, classifies them, relays them to the upstream
//! completion provider and streams the reply back as Server-Sent Events.

pub mod handlers;
pub mod relay;
pub mod server;
pub mod sse;

pub use relay::{
    ChatRelay, ChatReply, ChatRequest, DonePayload, FALLBACK_REPLY, RelayEvent, RelayOutcome,
    RelaySettings,
};
pub use server::{GatewayState, router, start_server};
