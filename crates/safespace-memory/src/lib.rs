// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide shared state of the gateway.
//!
//! Both components are plain values meant to be wrapped in an `Arc` and
//! injected, so each test can build an isolated instance.

pub mod cache;
pub mod conversation;

pub use cache::{CacheKey, ResponseCache};
pub use conversation::ConversationMemory;
