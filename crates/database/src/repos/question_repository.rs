//! Questions, answers, helpful votes and answer reports.

use sqlx::{SqliteConnection, SqlitePool};

use crate::entities::question::{
    Answer, AnswerReport, AnswerView, NewAnswer, NewQuestion, Question, QuestionFilter,
    QuestionView, UpdateQuestion, ANSWER_COLUMNS, QUESTION_COLUMNS,
};
use crate::types::{new_id, now_timestamp, DatabaseError, DatabaseResult};

const QUESTION_VIEW_SELECT: &str = r#"
    SELECT q.id, q.user_id, u.username AS author_username, q.source_language_id, q.target_language_id,
           q.question_text, q.description,
           (SELECT COUNT(*) FROM answers a WHERE a.question_id = q.id) AS answer_count,
           q.created_at, q.updated_at
    FROM questions q
    JOIN users u ON u.id = q.user_id
"#;

const ANSWER_VIEW_SELECT: &str = r#"
    SELECT a.id, a.question_id, a.user_id, u.username AS author_username, a.answer_text, a.context_tags,
           a.is_edited,
           (SELECT COUNT(*) FROM answer_votes v WHERE v.answer_id = a.id AND v.is_helpful = 1) AS helpful_count,
           EXISTS(
               SELECT 1 FROM answer_votes v
               WHERE v.answer_id = a.id AND v.user_id = ? AND v.is_helpful = 1
           ) AS is_helpful,
           a.created_at, a.updated_at
    FROM answers a
    JOIN users u ON u.id = a.user_id
"#;

#[derive(Clone)]
pub struct QuestionRepository {
    pool: SqlitePool,
}

impl QuestionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Newest questions first.
    pub async fn list(&self, filter: &QuestionFilter, skip: i64, limit: i64) -> DatabaseResult<Vec<QuestionView>> {
        let unanswered_only = filter.unanswered.unwrap_or(false);

        let questions = sqlx::query_as::<_, QuestionView>(&format!(
            r#"
            {QUESTION_VIEW_SELECT}
            WHERE q.is_active = 1
              AND (? IS NULL OR q.source_language_id = ?)
              AND (? IS NULL OR q.target_language_id = ?)
              AND (? IS NULL OR q.user_id = ?)
              AND (? = 0 OR NOT EXISTS (SELECT 1 FROM answers a WHERE a.question_id = q.id))
            ORDER BY q.created_at DESC, q.rowid DESC
            LIMIT ? OFFSET ?
            "#
        ))
        .bind(&filter.source_lang)
        .bind(&filter.source_lang)
        .bind(&filter.target_lang)
        .bind(&filter.target_lang)
        .bind(&filter.user_id)
        .bind(&filter.user_id)
        .bind(unanswered_only)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    pub async fn find_view(&self, id: &str) -> DatabaseResult<Option<QuestionView>> {
        let question = sqlx::query_as::<_, QuestionView>(&format!(
            "{QUESTION_VIEW_SELECT} WHERE q.id = ? AND q.is_active = 1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    pub async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<Question>> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ? AND is_active = 1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    pub async fn insert_in(
        conn: &mut SqliteConnection,
        user_id: &str,
        request: &NewQuestion,
    ) -> DatabaseResult<Question> {
        let id = new_id();
        let now = now_timestamp();

        sqlx::query(
            r#"
            INSERT INTO questions (id, user_id, source_language_id, target_language_id, question_text, description, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&request.source_language_id)
        .bind(&request.target_language_id)
        .bind(request.question_text.trim())
        .bind(&request.description)
        .bind(&now)
        .bind(&now)
        .execute(&mut *conn)
        .await?;

        let question = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?"
        ))
        .bind(&id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(question)
    }

    pub async fn update(&self, id: &str, request: &UpdateQuestion) -> DatabaseResult<Question> {
        let result = sqlx::query(
            r#"
            UPDATE questions
            SET source_language_id = COALESCE(?, source_language_id),
                target_language_id = COALESCE(?, target_language_id),
                question_text = COALESCE(?, question_text),
                description = COALESCE(?, description),
                updated_at = ?
            WHERE id = ? AND is_active = 1
            "#,
        )
        .bind(&request.source_language_id)
        .bind(&request.target_language_id)
        .bind(request.question_text.as_deref().map(str::trim))
        .bind(&request.description)
        .bind(now_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Question"));
        }
        self.find_by_id(id).await?.ok_or(DatabaseError::NotFound("Question"))
    }

    /// Hard delete; answers, votes and reports cascade.
    pub async fn delete(&self, id: &str) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM questions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[derive(Clone)]
pub struct AnswerRepository {
    pool: SqlitePool,
}

impl AnswerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Answers of one question, most helpful first. `viewer` drives `is_helpful`.
    pub async fn list_for_question(
        &self,
        question_id: &str,
        viewer: Option<&str>,
    ) -> DatabaseResult<Vec<AnswerView>> {
        let answers = sqlx::query_as::<_, AnswerView>(&format!(
            "{ANSWER_VIEW_SELECT} WHERE a.question_id = ? ORDER BY helpful_count DESC, a.created_at ASC, a.rowid ASC"
        ))
        .bind(viewer)
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(answers)
    }

    pub async fn find_view(&self, id: &str, viewer: Option<&str>) -> DatabaseResult<Option<AnswerView>> {
        let answer = sqlx::query_as::<_, AnswerView>(&format!("{ANSWER_VIEW_SELECT} WHERE a.id = ?"))
            .bind(viewer)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(answer)
    }

    pub async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<Answer>> {
        let answer = sqlx::query_as::<_, Answer>(&format!("SELECT {ANSWER_COLUMNS} FROM answers WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(answer)
    }

    pub async fn insert_in(
        conn: &mut SqliteConnection,
        user_id: &str,
        request: &NewAnswer,
    ) -> DatabaseResult<Answer> {
        let id = new_id();
        let now = now_timestamp();

        sqlx::query(
            r#"
            INSERT INTO answers (id, question_id, user_id, answer_text, context_tags, is_edited, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&request.question_id)
        .bind(user_id)
        .bind(request.answer_text.trim())
        .bind(&request.context_tags)
        .bind(&now)
        .bind(&now)
        .execute(&mut *conn)
        .await?;

        let answer = sqlx::query_as::<_, Answer>(&format!("SELECT {ANSWER_COLUMNS} FROM answers WHERE id = ?"))
            .bind(&id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(answer)
    }

    /// Edit text or tags and flag the answer as edited.
    pub async fn update(
        &self,
        id: &str,
        answer_text: Option<&str>,
        context_tags: Option<&str>,
    ) -> DatabaseResult<Answer> {
        let result = sqlx::query(
            r#"
            UPDATE answers
            SET answer_text = COALESCE(?, answer_text),
                context_tags = COALESCE(?, context_tags),
                is_edited = 1,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(answer_text.map(str::trim))
        .bind(context_tags)
        .bind(now_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Answer"));
        }
        self.find_by_id(id).await?.ok_or(DatabaseError::NotFound("Answer"))
    }

    pub async fn delete(&self, id: &str) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM answers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Cast a vote. Repeating the same vote withdraws it.
    ///
    /// Returns the helpful tally and the voter's standing vote, `None` once withdrawn.
    pub async fn vote(
        &self,
        answer_id: &str,
        user_id: &str,
        is_helpful: bool,
    ) -> DatabaseResult<(i64, Option<bool>)> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<bool> = sqlx::query_scalar(
            "SELECT is_helpful FROM answer_votes WHERE answer_id = ? AND user_id = ?",
        )
        .bind(answer_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let standing = match existing {
            Some(previous) if previous == is_helpful => {
                sqlx::query("DELETE FROM answer_votes WHERE answer_id = ? AND user_id = ?")
                    .bind(answer_id)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
                None
            }
            _ => {
                sqlx::query(
                    r#"
                    INSERT INTO answer_votes (id, answer_id, user_id, is_helpful, created_at)
                    VALUES (?, ?, ?, ?, ?)
                    ON CONFLICT(answer_id, user_id) DO UPDATE SET is_helpful = excluded.is_helpful
                    "#,
                )
                .bind(new_id())
                .bind(answer_id)
                .bind(user_id)
                .bind(is_helpful)
                .bind(now_timestamp())
                .execute(&mut *tx)
                .await?;
                Some(is_helpful)
            }
        };

        let helpful_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM answer_votes WHERE answer_id = ? AND is_helpful = 1",
        )
        .bind(answer_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((helpful_count, standing))
    }

    pub async fn report(&self, answer_id: &str, user_id: &str, reason: &str) -> DatabaseResult<AnswerReport> {
        let report = AnswerReport {
            id: new_id(),
            answer_id: answer_id.to_string(),
            user_id: user_id.to_string(),
            reason: reason.to_string(),
            created_at: now_timestamp(),
        };

        sqlx::query("INSERT INTO answer_reports (id, answer_id, user_id, reason, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(&report.id)
            .bind(&report.answer_id)
            .bind(&report.user_id)
            .bind(&report.reason)
            .bind(&report.created_at)
            .execute(&self.pool)
            .await?;
        Ok(report)
    }

    pub async fn list_reports(&self, skip: i64, limit: i64) -> DatabaseResult<Vec<AnswerReport>> {
        let reports = sqlx::query_as::<_, AnswerReport>(
            r#"
            SELECT id, answer_id, user_id, reason, created_at
            FROM answer_reports
            ORDER BY created_at DESC, rowid DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::UserRepository;
    use crate::test_support::migrated_pool;

    async fn seed_question(pool: &SqlitePool) -> (String, Question) {
        let mut conn = pool.acquire().await.unwrap();
        let user = UserRepository::insert(&mut conn, "asker", "asker@example.com", "hash")
            .await
            .unwrap();
        let question = QuestionRepository::insert_in(
            &mut conn,
            &user.id,
            &NewQuestion {
                source_language_id: None,
                target_language_id: None,
                question_text: "How do I say hello?".into(),
                description: None,
            },
        )
        .await
        .unwrap();
        (user.id, question)
    }

    #[tokio::test]
    async fn unanswered_filter_hides_answered_questions() {
        let (pool, _dir) = migrated_pool().await;
        let (user_id, question) = seed_question(&pool).await;
        let questions = QuestionRepository::new(pool.clone());

        let filter = QuestionFilter {
            unanswered: Some(true),
            ..Default::default()
        };
        assert_eq!(questions.list(&filter, 0, 10).await.unwrap().len(), 1);

        let mut conn = pool.acquire().await.unwrap();
        AnswerRepository::insert_in(
            &mut conn,
            &user_id,
            &NewAnswer {
                question_id: question.id.clone(),
                answer_text: "Merhaba".into(),
                context_tags: None,
            },
        )
        .await
        .unwrap();
        drop(conn);

        assert!(questions.list(&filter, 0, 10).await.unwrap().is_empty());
        let view = questions.find_view(&question.id).await.unwrap().unwrap();
        assert_eq!(view.answer_count, 1);
        assert_eq!(view.author_username, "asker");
    }

    #[tokio::test]
    async fn repeating_a_vote_withdraws_it() {
        let (pool, _dir) = migrated_pool().await;
        let (user_id, question) = seed_question(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let answer = AnswerRepository::insert_in(
            &mut conn,
            &user_id,
            &NewAnswer {
                question_id: question.id,
                answer_text: "Hola".into(),
                context_tags: Some("greeting".into()),
            },
        )
        .await
        .unwrap();
        drop(conn);

        let answers = AnswerRepository::new(pool);
        assert_eq!(answers.vote(&answer.id, &user_id, true).await.unwrap(), (1, Some(true)));
        assert_eq!(answers.vote(&answer.id, &user_id, true).await.unwrap(), (0, None));
        assert_eq!(answers.vote(&answer.id, &user_id, true).await.unwrap(), (1, Some(true)));
        assert_eq!(answers.vote(&answer.id, &user_id, false).await.unwrap(), (0, Some(false)));
        assert_eq!(answers.vote(&answer.id, &user_id, false).await.unwrap(), (0, None));

        let view = answers.find_view(&answer.id, Some(&user_id)).await.unwrap().unwrap();
        assert!(!view.is_helpful);
        assert_eq!(view.helpful_count, 0);
    }

    #[tokio::test]
    async fn deleting_a_question_removes_its_answers() {
        let (pool, _dir) = migrated_pool().await;
        let (user_id, question) = seed_question(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let answer = AnswerRepository::insert_in(
            &mut conn,
            &user_id,
            &NewAnswer {
                question_id: question.id.clone(),
                answer_text: "Bonjour".into(),
                context_tags: None,
            },
        )
        .await
        .unwrap();
        drop(conn);

        assert!(QuestionRepository::new(pool.clone()).delete(&question.id).await.unwrap());
        assert!(AnswerRepository::new(pool).find_by_id(&answer.id).await.unwrap().is_none());
    }
}
