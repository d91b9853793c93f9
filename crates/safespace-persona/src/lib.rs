// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Personality selection for incoming messages.
//!
//! [`select`] combines the registry and the crisis classifier: a detected
//! crisis overrides whatever personality the client asked for.

pub mod crisis;
pub mod personality;

use safespace_core::PersonalityId;

pub use crisis::is_crisis;
pub use personality::{BASE_PROMPT, prompt_for, resolve};

/// Outcome of classifying one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Personality that will answer.
    pub personality: PersonalityId,
    /// Whether a crisis phrase was detected.
    pub crisis: bool,
}

/// Classify `message` and pick the active personality.
pub fn select(message: &str, requested: Option<&str>) -> Selection {
    let crisis = is_crisis(message);
    let personality = if crisis {
        PersonalityId::CrisisMode
    } else {
        resolve(requested)
    };
    Selection {
        personality,
        crisis,
    }
}
