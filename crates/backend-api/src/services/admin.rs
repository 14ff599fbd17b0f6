//! Moderation helpers shared by the admin routes.

use lanxpert_database::{AuditRepository, LanguageRepository, NewWord, User, WordRepository};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::error::ServiceResult;

/// Write an `admin_actions` row and log it.
pub async fn audit(
    pool: &SqlitePool,
    admin: &User,
    action: &str,
    target_table: &str,
    target_id: Option<&str>,
) -> ServiceResult<()> {
    AuditRepository::new(pool.clone())
        .record(&admin.id, action, target_table, target_id)
        .await?;
    info!(admin = %admin.username, action, target_table, target_id, "admin action");
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BulkImportResult {
    pub status: String,
    pub created: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Import a batch of words.
///
/// Languages may be given by id or code. Words already present for the same
/// language pair (ignoring case) are skipped; bad rows are reported and the
/// rest still go in.
pub async fn bulk_create_words(pool: &SqlitePool, admin: &User, items: &[NewWord]) -> ServiceResult<BulkImportResult> {
    let languages = LanguageRepository::new(pool.clone());
    let words = WordRepository::new(pool.clone());

    let mut created = 0;
    let mut skipped = 0;
    let mut errors = Vec::new();

    for item in items {
        if item.word.trim().is_empty() || item.meaning.trim().is_empty() {
            errors.push("Word and meaning are required".to_string());
            continue;
        }

        let Some(language) = languages.resolve(&item.language_id).await? else {
            errors.push(format!("Invalid Native Language for {}", item.word));
            continue;
        };

        let target_language_id = match item.target_language_id.as_deref() {
            Some(reference) => languages.resolve(reference).await?.map(|language| language.id),
            None => None,
        };

        if words
            .is_duplicate(&item.word, &language.id, target_language_id.as_deref())
            .await?
        {
            skipped += 1;
            continue;
        }

        let request = NewWord {
            language_id: language.id,
            target_language_id,
            ..item.clone()
        };
        match words.create(&request).await {
            Ok(_) => created += 1,
            Err(error) => {
                warn!(word = %item.word, error = %error, "bulk word import failed");
                errors.push(format!("Error adding {}: {error}", item.word));
            }
        }
    }

    audit(pool, admin, "bulk_create_words", "words", None).await?;
    Ok(BulkImportResult {
        status: "success".to_string(),
        created,
        skipped,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_utils::{create_test_db, create_user};

    fn word(language: &str, target: Option<&str>, text: &str) -> NewWord {
        NewWord {
            language_id: language.into(),
            target_language_id: target.map(str::to_string),
            word: text.into(),
            meaning: format!("meaning of {text}"),
            part_of_speech: None,
            level: Some("A1".into()),
        }
    }

    #[tokio::test]
    async fn bulk_import_resolves_codes_and_skips_duplicates() {
        let (pool, _dir) = create_test_db().await;
        let admin = create_user(&pool, "admin").await;

        let batch = vec![
            word("en", Some("tr"), "House"),
            word("en", Some("tr"), "house"),
            word("xx", None, "ghost"),
            word("es", None, "casa"),
        ];
        let result = bulk_create_words(&pool, &admin, &batch).await.unwrap();

        assert_eq!(result.created, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors, vec!["Invalid Native Language for ghost".to_string()]);

        let actions = AuditRepository::new(pool.clone()).recent_actions(10).await.unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action, "bulk_create_words");
    }
}
