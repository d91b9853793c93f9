// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for SafeSpace integration tests.
//!
//! # Components
//!
//! - [`MockProvider`] - scripted completion provider with failure modes and
//!   request capture
//! - [`parse_sse`] - splits a captured SSE response body into events

pub mod mock_provider;
pub mod sse;

pub use mock_provider::{MockProvider, MockReply};
pub use sse::{SseEvent, parse_sse};
