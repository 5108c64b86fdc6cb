//! Exact-match answer cache.
//!
//! Keys are trimmed question text compared byte for byte. The first answer
//! stored for a key wins: entries are never overwritten or evicted. An
//! optional bound stops new keys from being added once reached.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use voqit_core::config::CacheConfig;

#[derive(Debug, Default)]
pub struct AnswerCache {
    entries: Mutex<HashMap<String, String>>,
    max_entries: Option<usize>,
}

impl AnswerCache {
    /// Create an unbounded cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache that stops accepting new keys after `max_entries`.
    pub fn bounded(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries: Some(max_entries),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        match config.max_entries {
            Some(limit) => Self::bounded(limit),
            None => Self::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, question: &str) -> Option<String> {
        self.lock().get(question).cloned()
    }

    /// Store `answer` under `question`.
    ///
    /// Returns `false` when the key already exists or the cache is full.
    pub fn set(&self, question: &str, answer: &str) -> bool {
        let mut entries = self.lock();
        if entries.contains_key(question) {
            return false;
        }
        if let Some(limit) = self.max_entries {
            if entries.len() >= limit {
                tracing::debug!(limit, "Answer cache full, not caching");
                return false;
            }
        }
        entries.insert(question.to_string(), answer.to_string());
        true
    }

    pub fn contains(&self, question: &str) -> bool {
        self.lock().contains_key(question)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing() {
        let cache = AnswerCache::new();
        assert!(cache.get("2+2?").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_then_get() {
        let cache = AnswerCache::new();
        assert!(cache.set("2+2?", "4"));
        assert_eq!(cache.get("2+2?").as_deref(), Some("4"));
        assert!(cache.contains("2+2?"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_first_answer_wins() {
        let cache = AnswerCache::new();
        assert!(cache.set("q", "first"));
        assert!(!cache.set("q", "second"));
        assert_eq!(cache.get("q").as_deref(), Some("first"));
    }

    #[test]
    fn test_keys_are_case_and_whitespace_sensitive() {
        let cache = AnswerCache::new();
        cache.set("Hello", "a");
        assert!(cache.get("hello").is_none());
        assert!(cache.get("Hello ").is_none());
        assert!(cache.get("Hello").is_some());
    }

    #[test]
    fn test_bounded_cache_refuses_new_keys_when_full() {
        let cache = AnswerCache::bounded(2);
        assert!(cache.set("a", "1"));
        assert!(cache.set("b", "2"));
        assert!(!cache.set("c", "3"));
        assert_eq!(cache.len(), 2);
        // existing entries survive
        assert_eq!(cache.get("a").as_deref(), Some("1"));
        assert!(cache.get("c").is_none());
    }

    #[test]
    fn test_from_config() {
        let unbounded = AnswerCache::from_config(&CacheConfig { max_entries: None });
        for i in 0..100 {
            unbounded.set(&i.to_string(), "x");
        }
        assert_eq!(unbounded.len(), 100);

        let bounded = AnswerCache::from_config(&CacheConfig {
            max_entries: Some(0),
        });
        assert!(!bounded.set("a", "1"));
    }
}
