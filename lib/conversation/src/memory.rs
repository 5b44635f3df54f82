//! Turn-scoped session memory.
//!
//! Memory entries carry a lifespan counted in turns. An entry created
//! with lifespan `1` is visible through the next turn; an entry created
//! with lifespan `0` lives for the whole session; a non-positive
//! countdown expires at the next cleanup.

use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// How long a memory entry lives.
///
/// The distinction between `Session` and a countdown that happens to
/// reach zero is made at creation time: only entries created with
/// lifespan exactly `0` are session-scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifespan {
    /// Countdown in turns; expires once non-positive at cleanup.
    Turns(i64),
    /// Lives until process teardown; never auto-expires.
    Session,
}

impl Lifespan {
    /// Interprets a caller-supplied lifespan value.
    ///
    /// `0` means session-scoped; anything else is a turn countdown
    /// (negative values expire at the end of the current turn).
    #[must_use]
    pub fn from_turns(turns: i64) -> Self {
        if turns == 0 {
            Self::Session
        } else {
            Self::Turns(turns)
        }
    }

    /// Returns the remaining turn count as exposed in snapshots.
    #[must_use]
    pub fn remaining_turns(&self) -> i64 {
        match self {
            Self::Session => 0,
            Self::Turns(n) => *n,
        }
    }
}

/// A single memory entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryEntry {
    /// The stored value.
    pub value: JsonValue,
    /// Remaining lifespan.
    pub lifespan: Lifespan,
}

/// Keyed store of memory entries with per-turn expiry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    entries: HashMap<String, MemoryEntry>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: JsonValue, lifespan: Lifespan) {
        self.entries.insert(key.into(), MemoryEntry { value, lifespan });
    }

    /// Gets an entry by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MemoryEntry> {
        self.entries.get(key)
    }

    /// Returns true if the key is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes expired entries and advances the countdowns.
    ///
    /// Called exactly once per processed turn-batch, before prompt
    /// assembly. Session-scoped entries are exempt; countdown entries
    /// are removed once non-positive, otherwise decremented by one.
    pub fn cleanup_expired(&mut self) {
        self.entries.retain(|_, entry| match &mut entry.lifespan {
            Lifespan::Session => true,
            Lifespan::Turns(n) if *n <= 0 => false,
            Lifespan::Turns(n) => {
                *n -= 1;
                true
            }
        });
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes the store for the prompt snapshot.
    ///
    /// Entries render as `{"value": ..., "lifespan": n}` with
    /// session-scoped entries reporting `0`.
    #[must_use]
    pub fn to_snapshot(&self) -> JsonValue {
        let map: serde_json::Map<String, JsonValue> = self
            .entries
            .iter()
            .map(|(key, entry)| {
                (
                    key.clone(),
                    serde_json::json!({
                        "value": entry.value,
                        "lifespan": entry.lifespan.remaining_turns(),
                    }),
                )
            })
            .collect();
        JsonValue::Object(map)
    }
}
