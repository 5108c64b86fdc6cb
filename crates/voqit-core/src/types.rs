use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Question
// =============================================================================

/// A user question, trimmed of surrounding whitespace and guaranteed non-empty.
///
/// The inner text is the exact cache key: no normalization beyond trimming
/// is applied, so casing and interior whitespace are significant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Question(String);

impl Question {
    /// Trim `raw` and wrap it. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Question {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Transcript
// =============================================================================

/// Which side of the exchange a transcript entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Question,
    Answer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Question => write!(f, "question"),
            Role::Answer => write!(f, "answer"),
        }
    }
}

/// Why an answer entry exists.
///
/// Failure entries are still answers from the transcript's point of view,
/// but front-ends can render them differently from a real completion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    #[default]
    Normal,
    RateLimited,
    Failed,
}

/// One immutable line of the transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
    #[serde(default)]
    pub kind: EntryKind,
    pub created_at: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn question(text: impl Into<String>) -> Self {
        Self {
            role: Role::Question,
            text: text.into(),
            kind: EntryKind::Normal,
            created_at: Utc::now(),
        }
    }

    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            role: Role::Answer,
            text: text.into(),
            kind: EntryKind::Normal,
            created_at: Utc::now(),
        }
    }

    /// An answer entry carrying a user-facing failure message.
    pub fn failure(text: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            role: Role::Answer,
            text: text.into(),
            kind,
            created_at: Utc::now(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.kind != EntryKind::Normal
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_trims_whitespace() {
        let q = Question::parse("  2+2?\n").unwrap();
        assert_eq!(q.as_str(), "2+2?");
    }

    #[test]
    fn test_question_rejects_blank() {
        assert!(Question::parse("").is_none());
        assert!(Question::parse("   ").is_none());
        assert!(Question::parse("\t\n").is_none());
    }

    #[test]
    fn test_question_keeps_case_and_interior_whitespace() {
        let a = Question::parse("Hello  World").unwrap();
        let b = Question::parse("hello world").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "Hello  World");
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Question.to_string(), "question");
        assert_eq!(Role::Answer.to_string(), "answer");
    }

    #[test]
    fn test_entry_constructors() {
        let q = TranscriptEntry::question("hi");
        assert_eq!(q.role, Role::Question);
        assert!(!q.is_failure());

        let a = TranscriptEntry::answer("hello");
        assert_eq!(a.role, Role::Answer);
        assert_eq!(a.kind, EntryKind::Normal);

        let f = TranscriptEntry::failure("Rate limit exceeded.", EntryKind::RateLimited);
        assert_eq!(f.role, Role::Answer);
        assert!(f.is_failure());
    }

    #[test]
    fn test_entry_serializes_snake_case() {
        let entry = TranscriptEntry::failure("oops", EntryKind::RateLimited);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["role"], "answer");
        assert_eq!(json["kind"], "rate_limited");
    }
}
