//! Vocabulary storage and the per-user word log.

use sqlx::{SqliteConnection, SqlitePool};

use crate::entities::word::{fold_case, NewWord, UpdateWord, Word, WordFilter, WORD_COLUMNS};
use crate::types::{new_id, now_timestamp, DatabaseError, DatabaseResult};

#[derive(Clone)]
pub struct WordRepository {
    pool: SqlitePool,
}

fn active_filter(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

impl WordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List words alphabetically, honouring every filter that is set.
    pub async fn list(&self, filter: &WordFilter, skip: i64, limit: i64) -> DatabaseResult<Vec<Word>> {
        let level = active_filter(&filter.level);
        let part_of_speech = active_filter(&filter.part_of_speech);
        let language_id = active_filter(&filter.language_id);
        let pattern = active_filter(&filter.search).map(|s| format!("%{}%", fold_case(s)));

        let words = sqlx::query_as::<_, Word>(&format!(
            r#"
            SELECT {WORD_COLUMNS}
            FROM words
            WHERE (? IS NULL OR level = ?)
              AND (? IS NULL OR part_of_speech = ?)
              AND (? IS NULL OR language_id = ?)
              AND (? IS NULL OR word_folded LIKE ? OR meaning_folded LIKE ?)
            ORDER BY word ASC, rowid ASC
            LIMIT ? OFFSET ?
            "#
        ))
        .bind(level)
        .bind(level)
        .bind(part_of_speech)
        .bind(part_of_speech)
        .bind(language_id)
        .bind(language_id)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(words)
    }

    pub async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<Word>> {
        let word = sqlx::query_as::<_, Word>(&format!("SELECT {WORD_COLUMNS} FROM words WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(word)
    }

    pub async fn create(&self, request: &NewWord) -> DatabaseResult<Word> {
        let id = new_id();
        sqlx::query(
            r#"
            INSERT INTO words (
                id, language_id, target_language_id, word, meaning, word_folded, meaning_folded,
                part_of_speech, level, is_active, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?)
            "#,
        )
        .bind(&id)
        .bind(&request.language_id)
        .bind(&request.target_language_id)
        .bind(request.word.trim())
        .bind(request.meaning.trim())
        .bind(fold_case(&request.word))
        .bind(fold_case(&request.meaning))
        .bind(&request.part_of_speech)
        .bind(&request.level)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        self.find_by_id(&id).await?.ok_or(DatabaseError::NotFound("Word"))
    }

    pub async fn update(&self, id: &str, request: &UpdateWord) -> DatabaseResult<Word> {
        let result = sqlx::query(
            r#"
            UPDATE words
            SET language_id = COALESCE(?, language_id),
                target_language_id = COALESCE(?, target_language_id),
                word = COALESCE(?, word),
                meaning = COALESCE(?, meaning),
                word_folded = COALESCE(?, word_folded),
                meaning_folded = COALESCE(?, meaning_folded),
                part_of_speech = COALESCE(?, part_of_speech),
                level = COALESCE(?, level),
                is_active = COALESCE(?, is_active)
            WHERE id = ?
            "#,
        )
        .bind(&request.language_id)
        .bind(&request.target_language_id)
        .bind(request.word.as_deref().map(str::trim))
        .bind(request.meaning.as_deref().map(str::trim))
        .bind(request.word.as_deref().map(fold_case))
        .bind(request.meaning.as_deref().map(fold_case))
        .bind(&request.part_of_speech)
        .bind(&request.level)
        .bind(request.is_active)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Word"));
        }
        self.find_by_id(id).await?.ok_or(DatabaseError::NotFound("Word"))
    }

    pub async fn delete(&self, id: &str) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM words WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether the same spelling already exists for the language pair, ignoring case.
    pub async fn is_duplicate(
        &self,
        word: &str,
        language_id: &str,
        target_language_id: Option<&str>,
    ) -> DatabaseResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM words
                WHERE word_folded = ?
                  AND language_id = ?
                  AND COALESCE(target_language_id, '') = COALESCE(?, '')
            )
            "#,
        )
        .bind(fold_case(word))
        .bind(language_id)
        .bind(target_language_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn count(&self) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM words")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Pick a random active word in `language_id`, or from the whole catalogue when
    /// that language has none.
    pub async fn random_in(
        conn: &mut SqliteConnection,
        language_id: Option<&str>,
    ) -> DatabaseResult<Option<Word>> {
        if let Some(language_id) = language_id {
            let word = sqlx::query_as::<_, Word>(&format!(
                "SELECT {WORD_COLUMNS} FROM words WHERE is_active = 1 AND language_id = ? ORDER BY RANDOM() LIMIT 1"
            ))
            .bind(language_id)
            .fetch_optional(&mut *conn)
            .await?;

            if word.is_some() {
                return Ok(word);
            }
        }

        let word = sqlx::query_as::<_, Word>(&format!(
            "SELECT {WORD_COLUMNS} FROM words WHERE is_active = 1 ORDER BY RANDOM() LIMIT 1"
        ))
        .fetch_optional(&mut *conn)
        .await?;
        Ok(word)
    }

    /// Record that the user has seen a word. Returns `true` only the first time.
    pub async fn log_view_in(conn: &mut SqliteConnection, user_id: &str, word_id: &str) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO word_logs (id, user_id, word_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(new_id())
        .bind(user_id)
        .bind(word_id)
        .bind(now_timestamp())
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
