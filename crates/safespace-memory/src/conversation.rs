// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user bounded conversation history.

use std::collections::VecDeque;

use dashmap::DashMap;
use safespace_core::ConversationTurn;

/// Default number of turns kept per user.
pub const DEFAULT_MAX_TURNS: usize = 12;

/// Bounded, ordered turn log keyed by user id.
///
/// Each user's log holds at most `max_turns` entries; appending past the
/// limit drops the oldest turn. Logs are created on first append and live
/// until [`clear`](Self::clear).
#[derive(Debug)]
pub struct ConversationMemory {
    max_turns: usize,
    turns: DashMap<String, VecDeque<ConversationTurn>>,
}

impl ConversationMemory {
    /// Create an empty memory keeping at most `max_turns` per user (minimum 1).
    pub fn new(max_turns: usize) -> Self {
        Self {
            max_turns: max_turns.max(1),
            turns: DashMap::new(),
        }
    }

    /// Maximum turns retained per user.
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Append a turn, evicting the oldest ones beyond the limit.
    pub fn append(&self, user_id: &str, turn: ConversationTurn) {
        let mut log = self.turns.entry(user_id.to_string()).or_default();
        log.push_back(turn);
        while log.len() > self.max_turns {
            log.pop_front();
        }
    }

    /// Snapshot of a user's history, oldest first. Empty for unknown users.
    pub fn get(&self, user_id: &str) -> Vec<ConversationTurn> {
        self.turns
            .get(user_id)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Forget everything about a user. Idempotent.
    pub fn clear(&self, user_id: &str) {
        if self.turns.remove(user_id).is_some() {
            tracing::debug!(user_id, "conversation memory cleared");
        }
    }

    /// Number of turns currently held for a user.
    pub fn len(&self, user_id: &str) -> usize {
        self.turns.get(user_id).map(|log| log.len()).unwrap_or(0)
    }

    /// Number of users with a non-cleared history.
    pub fn user_count(&self) -> usize {
        self.turns.len()
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn unknown_user_has_empty_history() {
        let memory = ConversationMemory::default();
        assert!(memory.get("nobody").is_empty());
        assert_eq!(memory.len("nobody"), 0);
    }

    #[test]
    fn thirteen_appends_keep_last_twelve() {
        let memory = ConversationMemory::new(12);
        for i in 0..13 {
            memory.append("u1", ConversationTurn::user(format!("m{i}")));
        }

        let history = memory.get("u1");
        assert_eq!(history.len(), 12);
        assert_eq!(history.first().unwrap().content, "m1");
        assert_eq!(history.last().unwrap().content, "m12");
    }

    #[test]
    fn history_is_never_longer_than_limit() {
        let memory = ConversationMemory::new(3);
        for i in 0..50 {
            memory.append("u1", ConversationTurn::assistant(i.to_string()));
            assert!(memory.len("u1") <= 3);
        }
        let contents: Vec<_> = memory.get("u1").into_iter().map(|t| t.content).collect();
        assert_eq!(contents, vec!["47", "48", "49"]);
    }

    #[test]
    fn snapshot_mutation_does_not_leak_back() {
        let memory = ConversationMemory::default();
        memory.append("u1", ConversationTurn::user("hello"));

        let mut snapshot = memory.get("u1");
        snapshot.push(ConversationTurn::assistant("injected"));
        snapshot[0].content.push_str(" tampered");

        let stored = memory.get("u1");
        assert_eq!(stored, vec![ConversationTurn::user("hello")]);
    }

    #[test]
    fn users_are_isolated() {
        let memory = ConversationMemory::default();
        memory.append("a", ConversationTurn::user("from a"));
        memory.append("b", ConversationTurn::user("from b"));
        assert_eq!(memory.get("a")[0].content, "from a");
        assert_eq!(memory.get("b")[0].content, "from b");
        assert_eq!(memory.user_count(), 2);
    }

    #[test]
    fn clear_is_idempotent() {
        let memory = ConversationMemory::default();
        memory.append("u1", ConversationTurn::user("hi"));
        memory.clear("u1");
        memory.clear("u1");
        assert!(memory.get("u1").is_empty());
        assert_eq!(memory.user_count(), 0);
    }

    #[test]
    fn zero_limit_is_raised_to_one() {
        let memory = ConversationMemory::new(0);
        memory.append("u1", ConversationTurn::user("a"));
        memory.append("u1", ConversationTurn::user("b"));
        assert_eq!(memory.get("u1"), vec![ConversationTurn::user("b")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_stay_bounded() {
        let memory = Arc::new(ConversationMemory::new(12));
        let mut handles = Vec::new();
        for task in 0..8 {
            let memory = Arc::clone(&memory);
            handles.push(tokio::spawn(async move {
                for i in 0..100 {
                    memory.append("shared", ConversationTurn::user(format!("{task}-{i}")));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(memory.len("shared"), 12);
    }
}
