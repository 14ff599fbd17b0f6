use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::ApiError;

pub fn require_bearer(headers: &HeaderMap) -> Result<String, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

    let mut parts = value.split_whitespace();
    let scheme = parts.next().unwrap_or("");
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(ApiError::unauthorized("invalid authorization scheme"));
    }

    let token = parts.next().unwrap_or("");
    if token.is_empty() {
        return Err(ApiError::unauthorized("missing bearer token"));
    }

    Ok(token.to_string())
}

pub fn optional_bearer(headers: &HeaderMap) -> Option<String> {
    require_bearer(headers).ok()
}

pub const MAX_PAGE_SIZE: i64 = 100;

/// `skip`/`limit` query parameters shared by list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    /// Resolve to `(skip, limit)`, clamping negatives and oversize pages.
    pub fn resolve(&self, default_limit: i64) -> (i64, i64) {
        page(self.skip, self.limit, default_limit)
    }
}

pub fn page(skip: Option<i64>, limit: Option<i64>, default_limit: i64) -> (i64, i64) {
    let skip = skip.unwrap_or(0).max(0);
    let limit = limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE);
    (skip, limit)
}

/// Cut `text` to `max` characters, appending `...` when something was dropped.
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn require_bearer_extracts_token_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer TOKEN123"));

        let token = require_bearer(&headers).expect("token should be extracted");
        assert_eq!(token, "TOKEN123");
    }

    #[test]
    fn require_bearer_rejects_missing_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer"));

        let error = require_bearer(&headers).expect_err("should reject missing token");
        assert_eq!(error.status, axum::http::StatusCode::UNAUTHORIZED);
        assert!(error.message.contains("missing bearer token"));
    }

    #[test]
    fn optional_bearer_ignores_other_schemes() {
        let mut headers = HeaderMap::new();
        assert_eq!(optional_bearer(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(optional_bearer(&headers), None);
    }

    #[test]
    fn pages_are_clamped() {
        assert_eq!(page(None, None, 20), (0, 20));
        assert_eq!(page(Some(-3), Some(0), 20), (0, 1));
        assert_eq!(page(Some(5), Some(1_000), 20), (5, MAX_PAGE_SIZE));
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_with_ellipsis("short", 50), "short");
        assert_eq!(truncate_with_ellipsis("çğüşöı-abc", 6), "çğüşöı...");
    }
}
