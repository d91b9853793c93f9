// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword-gated crisis detection.
//!
//! Case-insensitive substring match against a fixed phrase list. Stateless.

/// Risk phrases, lower-case.
pub const CRISIS_PHRASES: &[&str] = &[
    "i want to die",
    "kill myself",
    "suicide",
    "hurt myself",
    "end my life",
    "cant go on",
    "can't go on",
    "cannot go on",
    "ending it all",
    "better off dead",
    "take my life",
    "self harm",
    "self-harm",
    "die tonight",
    "want to disappear",
];

/// Returns true when any crisis phrase occurs in `text`.
pub fn is_crisis(text: &str) -> bool {
    let lower = text.to_lowercase();
    CRISIS_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_phrase_regardless_of_case() {
        assert!(is_crisis("I want to DIE today"));
        assert!(is_crisis("SUICIDE"));
        assert!(is_crisis("sometimes I think about Self-Harm"));
    }

    #[test]
    fn detects_phrase_inside_longer_text() {
        assert!(is_crisis("honestly i feel like ending it all lately"));
        assert!(is_crisis("I want to end my life"));
    }

    #[test]
    fn ordinary_messages_are_not_flagged() {
        assert!(!is_crisis("I had a long day"));
        assert!(!is_crisis("I feel anxious about work"));
        assert!(!is_crisis(""));
    }

    #[test]
    fn every_phrase_triggers() {
        for phrase in CRISIS_PHRASES {
            assert!(is_crisis(phrase), "{phrase}");
            assert!(is_crisis(&phrase.to_uppercase()), "{phrase} upper");
        }
    }
}
