// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the SafeSpace gateway.
//!
//! Holds the error taxonomy, the conversation and personality types, and the
//! [`CompletionProvider`] trait that upstream adapters implement.

pub mod error;
pub mod traits;
pub mod types;

pub use error::SafeSpaceError;
pub use traits::{CompletionProvider, DeltaStream};
pub use types::{CompletionRequest, ConversationTurn, PersonalityId, Role};
