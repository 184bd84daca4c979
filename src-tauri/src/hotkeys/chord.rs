use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between key names in a persisted binding
pub const CHORD_SEPARATOR: &str = " + ";

/// Canonical stored form of a binding: lower case, outer whitespace trimmed
pub fn normalize_binding(binding: &str) -> String {
    binding.trim().to_lowercase()
}

/// A set of keys held down together. Key order is irrelevant to matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chord {
    keys: Vec<String>,
}

impl Chord {
    /// Parse a binding like `"Ctrl + Alt + K"`. `None` when it names no keys.
    pub fn parse(binding: &str) -> Option<Self> {
        let normalized = normalize_binding(binding);
        let chord = Self::from_keys(normalized.split(CHORD_SEPARATOR));
        (!chord.keys.is_empty()).then_some(chord)
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys: Vec<String> = keys
            .into_iter()
            .map(|key| key.as_ref().trim().to_lowercase())
            .filter(|key| !key.is_empty())
            .collect();
        keys.sort();
        Self { keys }
    }

    /// Keys in sorted order
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Same multiset of keys
    pub fn matches(&self, other: &Chord) -> bool {
        !self.keys.is_empty() && self.keys == other.keys
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.keys.join(CHORD_SEPARATOR))
    }
}
