// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the persona, memory, provider and gateway crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Author of a conversation turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Response personality drawn from a closed set.
///
/// `CrisisMode` is reserved: it is selected by the crisis classifier and
/// overrides whatever the client asked for.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PersonalityId {
    #[default]
    CalmListener,
    MotivationCoach,
    CbtHelper,
    JournalHelper,
    CrisisMode,
}

impl PersonalityId {
    /// Every member of the closed set.
    pub const ALL: [PersonalityId; 5] = [
        PersonalityId::CalmListener,
        PersonalityId::MotivationCoach,
        PersonalityId::CbtHelper,
        PersonalityId::JournalHelper,
        PersonalityId::CrisisMode,
    ];
}

/// A chat completion request sent to the upstream provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier (e.g. "gpt-4o").
    pub model: String,
    /// Ordered messages: preamble, personality prompt, history, new user turn.
    pub messages: Vec<ConversationTurn>,
    /// Sampling temperature; lowered when a crisis was detected.
    pub temperature: f32,
}
