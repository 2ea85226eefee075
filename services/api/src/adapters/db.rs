//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `StorageService` port from `vocab_core`. Saved words and examples are
//! stored as JSONB documents in PostgreSQL using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use vocab_core::domain::{
    example_id, JsonObject, SavedExample, SavedWord, SearchEntry, SortOrder, WordQuery, WordSort,
    EXAMPLE_ID_ATTEMPTS,
};
use vocab_core::ports::{PortError, PortResult, StorageService};

use super::memory::word_key;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `StorageService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn db_error(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct SavedWordRecord {
    word: String,
    data: Json<JsonObject>,
    saved_at: DateTime<Utc>,
    is_learned: bool,
    learned_at: Option<DateTime<Utc>>,
}
impl SavedWordRecord {
    fn to_domain(self) -> SavedWord {
        SavedWord {
            id: self.word,
            data: self.data.0,
            saved_at: self.saved_at,
            is_learned: self.is_learned,
            learned_at: self.learned_at,
        }
    }
}

#[derive(FromRow)]
struct SavedExampleRecord {
    id: String,
    data: Json<JsonObject>,
    saved_at: DateTime<Utc>,
}
impl SavedExampleRecord {
    fn to_domain(self) -> SavedExample {
        SavedExample {
            id: self.id,
            data: self.data.0,
            saved_at: self.saved_at,
        }
    }
}

#[derive(FromRow)]
struct SearchEntryRecord {
    word: String,
    searched_at: DateTime<Utc>,
}
impl SearchEntryRecord {
    fn to_domain(self) -> SearchEntry {
        SearchEntry {
            word: self.word,
            searched_at: self.searched_at,
        }
    }
}

/// Builds the listing query. Column and direction come from closed enums, so
/// formatting them into the SQL is safe.
fn list_words_sql(query: &WordQuery) -> String {
    let column = match query.sort_by {
        WordSort::SavedAt => "saved_at",
        WordSort::Word => "word",
    };
    let direction = match query.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    format!(
        "SELECT word, data, saved_at, is_learned, learned_at FROM saved_words \
         WHERE user_id = $1 AND ($2::TEXT IS NULL OR data->'partOfSpeech' ? $2) \
         ORDER BY {} {}",
        column, direction
    )
}

//=========================================================================================
// `StorageService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StorageService for DbAdapter {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn save_word(&self, user_id: &str, data: JsonObject) -> PortResult<()> {
        let word = word_key(&data)?;
        sqlx::query(
            "INSERT INTO saved_words (user_id, word, data, saved_at, is_learned, learned_at) \
             VALUES ($1, $2, $3, NOW(), FALSE, NULL) \
             ON CONFLICT (user_id, word) DO UPDATE \
             SET data = EXCLUDED.data, saved_at = EXCLUDED.saved_at, is_learned = FALSE, learned_at = NULL",
        )
        .bind(user_id)
        .bind(word)
        .bind(Json(data))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn list_words(&self, user_id: &str, query: &WordQuery) -> PortResult<Vec<SavedWord>> {
        let records = sqlx::query_as::<_, SavedWordRecord>(&list_words_sql(query))
            .bind(user_id)
            .bind(query.part_of_speech.as_deref())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn mark_learned(&self, user_id: &str, word: &str, is_learned: bool) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE saved_words \
             SET is_learned = $3, learned_at = CASE WHEN $3 THEN NOW() ELSE NULL END \
             WHERE user_id = $1 AND word = $2",
        )
        .bind(user_id)
        .bind(word.trim().to_lowercase())
        .bind(is_learned)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("saved word '{}'", word)));
        }
        Ok(())
    }

    async fn delete_word(&self, user_id: &str, word: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM saved_words WHERE user_id = $1 AND word = $2")
            .bind(user_id)
            .bind(word.trim().to_lowercase())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn save_example(&self, user_id: &str, data: JsonObject) -> PortResult<String> {
        let word = data
            .get("word")
            .and_then(|w| w.as_str())
            .unwrap_or("example")
            .to_string();
        let saved_at = Utc::now();
        let data = Json(data);

        // Examples saved within the same millisecond would share an id; take the next suffix.
        for sequence in 0..EXAMPLE_ID_ATTEMPTS {
            let id = example_id(&word, saved_at, sequence);
            let inserted = sqlx::query(
                "INSERT INTO saved_examples (user_id, id, data, saved_at) VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (user_id, id) DO NOTHING",
            )
            .bind(user_id)
            .bind(&id)
            .bind(&data)
            .bind(saved_at)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
            if inserted.rows_affected() == 1 {
                return Ok(id);
            }
        }
        Err(PortError::Unexpected(format!(
            "no free example id for '{}' after {} attempts",
            word, EXAMPLE_ID_ATTEMPTS
        )))
    }

    async fn list_examples(&self, user_id: &str) -> PortResult<Vec<SavedExample>> {
        let records = sqlx::query_as::<_, SavedExampleRecord>(
            "SELECT id, data, saved_at FROM saved_examples WHERE user_id = $1 ORDER BY saved_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn record_search(&self, user_id: &str, word: &str) -> PortResult<()> {
        sqlx::query("INSERT INTO search_history (user_id, word, searched_at) VALUES ($1, $2, NOW())")
            .bind(user_id)
            .bind(word.trim().to_lowercase())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn search_history(&self, user_id: &str, limit: usize) -> PortResult<Vec<SearchEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let records = sqlx::query_as::<_, SearchEntryRecord>(
            "SELECT word, searched_at FROM search_history WHERE user_id = $1 \
             ORDER BY searched_at DESC, id DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_sql_uses_whitelisted_ordering() {
        let sql = list_words_sql(&WordQuery {
            sort_by: WordSort::Word,
            order: SortOrder::Asc,
            part_of_speech: None,
        });
        assert!(sql.ends_with("ORDER BY word ASC"));
        assert!(list_words_sql(&WordQuery::default()).ends_with("ORDER BY saved_at DESC"));
    }
}
