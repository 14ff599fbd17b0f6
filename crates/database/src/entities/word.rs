use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

pub(crate) const WORD_COLUMNS: &str = "id, language_id, target_language_id, word, meaning, \
    part_of_speech, level, is_active, created_at";

/// Case-insensitive comparison key for words and meanings. Dotted and dotless
/// Turkish i fold to the same letter so `GÜNAYDIN` matches `Günaydın`.
pub(crate) fn fold_case(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| *c != '\u{307}')
        .map(|c| if c == 'ı' { 'i' } else { c })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Word {
    pub id: String,
    pub language_id: String,
    pub target_language_id: Option<String>,
    pub word: String,
    pub meaning: String,
    pub part_of_speech: Option<String>,
    pub level: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewWord {
    pub language_id: String,
    pub target_language_id: Option<String>,
    pub word: String,
    pub meaning: String,
    pub part_of_speech: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateWord {
    pub language_id: Option<String>,
    pub target_language_id: Option<String>,
    pub word: Option<String>,
    pub meaning: Option<String>,
    pub part_of_speech: Option<String>,
    pub level: Option<String>,
    pub is_active: Option<bool>,
}

/// Listing filters. The value `"all"` on level or part of speech disables that filter.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WordFilter {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub level: Option<String>,
    pub language_id: Option<String>,
    pub part_of_speech: Option<String>,
    /// Case-insensitive match against the word or its meaning.
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::fold_case;

    #[test]
    fn folding_handles_non_ascii_letters() {
        assert_eq!(fold_case("GÜNAYDIN"), fold_case("Günaydın"));
        assert_eq!(fold_case("İstanbul"), fold_case("istanbul"));
        assert_eq!(fold_case(" Übung "), "übung");
        assert_eq!(fold_case("ÉCOLE"), "école");
    }
}
