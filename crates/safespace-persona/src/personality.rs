// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Personality registry: closed set of response profiles and their prompts.

use std::str::FromStr;

use safespace_core::PersonalityId;

/// Fixed preamble sent ahead of every personality prompt.
pub const BASE_PROMPT: &str = "You are SafeSpace AI, a warm, deeply supportive, emotionally intelligent companion.
Speak like a caring friend, not a therapist.
Use short, comforting sentences.
Reflect feelings, validate, stay present.
Avoid clinical or robotic language.
Ask gentle follow-up questions.
Crisis Mode: slow, calm, grounding, encourage reaching out to a trusted person or hotline.
Forbidden: diagnosing, medical advice, instructions.";

/// Resolve a client-supplied personality identifier.
///
/// Absent, empty and unknown identifiers fall back to the default; this never
/// fails.
pub fn resolve(requested: Option<&str>) -> PersonalityId {
    let Some(raw) = requested.map(str::trim).filter(|s| !s.is_empty()) else {
        return PersonalityId::default();
    };

    PersonalityId::from_str(raw).unwrap_or_else(|_| {
        tracing::debug!(requested = raw, "unrecognized personality, using default");
        PersonalityId::default()
    })
}

/// System prompt for a personality. Total over the closed set.
pub fn prompt_for(id: PersonalityId) -> &'static str {
    match id {
        PersonalityId::CalmListener => {
            "You are a calm listener. Offer warm, empathetic reflections in gentle, concise sentences. Validate feelings and keep the tone soft and human."
        }
        PersonalityId::MotivationCoach => {
            "You are a motivation coach. Be positive, encouraging, and friendly. Highlight small wins and gently inspire forward movement without pressure."
        }
        PersonalityId::CbtHelper => {
            "You are a CBT-style helper. Ask structured, compassionate questions about how thoughts connect to feelings and behavior. Stay warm and non-clinical."
        }
        PersonalityId::JournalHelper => {
            "You are a journaling helper. Reflect themes and patterns, invite deeper self-reflection, and keep the tone soothing and thoughtful."
        }
        PersonalityId::CrisisMode => {
            "You are in crisis mode. Speak slowly, calmly, and grounding. Encourage reaching out to a trusted person or hotline. Never provide instructions for self-harm."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_empty_resolves_to_default() {
        assert_eq!(resolve(None), PersonalityId::CalmListener);
        assert_eq!(resolve(Some("")), PersonalityId::CalmListener);
        assert_eq!(resolve(Some("   ")), PersonalityId::CalmListener);
    }

    #[test]
    fn unknown_resolves_to_default() {
        for raw in ["pirate", "CALM_LISTENER", "motivation-coach", "__proto__"] {
            assert_eq!(resolve(Some(raw)), PersonalityId::CalmListener, "{raw}");
        }
    }

    #[test]
    fn known_identifiers_resolve_to_themselves() {
        assert_eq!(resolve(Some("motivation_coach")), PersonalityId::MotivationCoach);
        assert_eq!(resolve(Some("cbt_helper")), PersonalityId::CbtHelper);
        assert_eq!(resolve(Some("journal_helper")), PersonalityId::JournalHelper);
        assert_eq!(resolve(Some("calm_listener")), PersonalityId::CalmListener);
    }

    #[test]
    fn crisis_mode_is_a_member_of_the_set() {
        assert_eq!(resolve(Some("crisis_mode")), PersonalityId::CrisisMode);
    }

    #[test]
    fn every_personality_has_a_prompt() {
        for id in PersonalityId::ALL {
            assert!(!prompt_for(id).trim().is_empty(), "{id} has empty prompt");
        }
    }
}
