//! services/api/src/adapters/memory.rs
//!
//! The process-local fallback store used when no database is configured.
//! Nothing survives a restart.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use vocab_core::{
    domain::{
        example_id, JsonObject, SavedExample, SavedWord, SearchEntry, SortOrder, WordQuery,
        WordSort,
    },
    ports::{PortError, PortResult, StorageService},
};

#[derive(Default)]
struct Tables {
    /// Keyed by (user, lowercased word).
    words: HashMap<(String, String), SavedWord>,
    /// Per user, in insertion order.
    examples: HashMap<String, Vec<SavedExample>>,
    /// Per user, in insertion order.
    history: HashMap<String, Vec<SearchEntry>>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The lowercased `word` field every saved word must carry.
pub(crate) fn word_key(data: &JsonObject) -> PortResult<String> {
    data.get("word")
        .and_then(|w| w.as_str())
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .ok_or_else(|| PortError::InvalidRequest("word data needs a 'word' field".to_string()))
}

/// True when the record's `partOfSpeech` (string or array) contains `wanted`.
pub(crate) fn has_part_of_speech(data: &JsonObject, wanted: &str) -> bool {
    match data.get("partOfSpeech") {
        Some(serde_json::Value::Array(items)) => items.iter().any(|i| i.as_str() == Some(wanted)),
        Some(serde_json::Value::String(s)) => s == wanted,
        _ => false,
    }
}

#[async_trait]
impl StorageService for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn save_word(&self, user_id: &str, data: JsonObject) -> PortResult<()> {
        let key = word_key(&data)?;
        let record = SavedWord {
            id: key.clone(),
            data,
            saved_at: Utc::now(),
            is_learned: false,
            learned_at: None,
        };
        self.tables
            .write()
            .await
            .words
            .insert((user_id.to_string(), key), record);
        Ok(())
    }

    async fn list_words(&self, user_id: &str, query: &WordQuery) -> PortResult<Vec<SavedWord>> {
        let tables = self.tables.read().await;
        let mut words: Vec<SavedWord> = tables
            .words
            .iter()
            .filter(|((owner, _), _)| owner == user_id)
            .map(|(_, word)| word)
            .filter(|word| {
                query
                    .part_of_speech
                    .as_deref()
                    .map(|pos| has_part_of_speech(&word.data, pos))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();

        words.sort_by(|a, b| match query.sort_by {
            WordSort::SavedAt => a.saved_at.cmp(&b.saved_at),
            WordSort::Word => a.id.cmp(&b.id),
        });
        if query.order == SortOrder::Desc {
            words.reverse();
        }
        Ok(words)
    }

    async fn mark_learned(&self, user_id: &str, word: &str, is_learned: bool) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let key = (user_id.to_string(), word.trim().to_lowercase());
        let record = tables
            .words
            .get_mut(&key)
            .ok_or_else(|| PortError::NotFound(format!("saved word '{}'", word)))?;
        record.is_learned = is_learned;
        record.learned_at = is_learned.then(Utc::now);
        Ok(())
    }

    async fn delete_word(&self, user_id: &str, word: &str) -> PortResult<()> {
        let key = (user_id.to_string(), word.trim().to_lowercase());
        self.tables.write().await.words.remove(&key);
        Ok(())
    }

    async fn save_example(&self, user_id: &str, data: JsonObject) -> PortResult<String> {
        let word = data.get("word").and_then(|w| w.as_str()).unwrap_or("example");
        let saved_at = Utc::now();

        let mut tables = self.tables.write().await;
        let examples = tables.examples.entry(user_id.to_string()).or_default();
        let id = (0..)
            .map(|sequence| example_id(word, saved_at, sequence))
            .find(|candidate| examples.iter().all(|e| &e.id != candidate))
            .unwrap_or_default();
        examples.push(SavedExample {
            id: id.clone(),
            data,
            saved_at,
        });
        Ok(id)
    }

    async fn list_examples(&self, user_id: &str) -> PortResult<Vec<SavedExample>> {
        let tables = self.tables.read().await;
        Ok(tables
            .examples
            .get(user_id)
            .map(|examples| examples.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn record_search(&self, user_id: &str, word: &str) -> PortResult<()> {
        let entry = SearchEntry {
            word: word.trim().to_lowercase(),
            searched_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .history
            .entry(user_id.to_string())
            .or_default()
            .push(entry);
        Ok(())
    }

    async fn search_history(&self, user_id: &str, limit: usize) -> PortResult<Vec<SearchEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .history
            .get(user_id)
            .map(|entries| entries.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: serde_json::Value) -> JsonObject {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn saved_word_reads_back_structurally_equal() {
        let store = MemoryStore::new();
        let data = object(json!({
            "word": "Run",
            "pronunciation": "/rʌn/",
            "partOfSpeech": ["verb", "noun"],
            "coreMeanings": [{"meaning": "달리다"}]
        }));
        store.save_word("u1", data.clone()).await.unwrap();

        let words = store.list_words("u1", &WordQuery::default()).await.unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].id, "run");
        assert_eq!(words[0].data, data);
        assert!(!words[0].is_learned);

        // Other users see nothing.
        assert!(store.list_words("u2", &WordQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saving_twice_overwrites_and_resets_learned() {
        let store = MemoryStore::new();
        store.save_word("u1", object(json!({"word": "run", "v": 1}))).await.unwrap();
        store.mark_learned("u1", "RUN", true).await.unwrap();
        store.save_word("u1", object(json!({"word": "run", "v": 2}))).await.unwrap();

        let words = store.list_words("u1", &WordQuery::default()).await.unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].data["v"], json!(2));
        assert!(!words[0].is_learned);
        assert!(words[0].learned_at.is_none());
    }

    #[tokio::test]
    async fn list_filters_by_part_of_speech_and_sorts_by_word() {
        let store = MemoryStore::new();
        for (word, pos) in [("zeal", "noun"), ("apple", "noun"), ("run", "verb")] {
            store
                .save_word("u1", object(json!({"word": word, "partOfSpeech": [pos]})))
                .await
                .unwrap();
        }

        let query = WordQuery {
            sort_by: WordSort::Word,
            order: SortOrder::Asc,
            part_of_speech: Some("noun".to_string()),
        };
        let ids: Vec<String> = store
            .list_words("u1", &query)
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(ids, vec!["apple", "zeal"]);
    }

    #[tokio::test]
    async fn marking_an_unsaved_word_is_not_found() {
        let store = MemoryStore::new();
        let err = store.mark_learned("u1", "ghost", true).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn history_returns_newest_entries_first() {
        let store = MemoryStore::new();
        for word in ["one", "Two", "three"] {
            store.record_search("u1", word).await.unwrap();
        }
        let history = store.search_history("u1", 2).await.unwrap();
        let words: Vec<&str> = history.iter().map(|h| h.word.as_str()).collect();
        assert_eq!(words, vec!["three", "two"]);
    }

    #[tokio::test]
    async fn examples_get_word_based_ids() {
        let store = MemoryStore::new();
        let id = store
            .save_example("u1", object(json!({"word": "run", "sentence": "I **run** daily."})))
            .await
            .unwrap();
        assert!(id.starts_with("run_"));

        let examples = store.list_examples("u1").await.unwrap();
        assert_eq!(examples[0].id, id);
        assert_eq!(examples[0].data["sentence"], json!("I **run** daily."));
    }

    #[tokio::test]
    async fn examples_saved_in_the_same_millisecond_get_distinct_ids() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let id = store
                .save_example("u1", object(json!({"word": "run", "sentence": "I run."})))
                .await
                .unwrap();
            ids.push(id);
        }

        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 5, "{:?}", ids);
        assert_eq!(store.list_examples("u1").await.unwrap().len(), 5);
    }
}
