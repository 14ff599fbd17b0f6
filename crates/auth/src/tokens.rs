//! JWT access and refresh tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::AuthError;

const AUDIENCE: &str = "lanxpert-api";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
    pub jti: String,
    pub typ: TokenKind,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Signs and verifies HS256 tokens for one issuer.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, issuer: impl Into<String>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn issue_access(&self, subject: &str) -> Result<IssuedToken, AuthError> {
        self.issue(subject, TokenKind::Access, self.access_ttl)
    }

    pub fn issue_refresh(&self, subject: &str) -> Result<IssuedToken, AuthError> {
        self.issue(subject, TokenKind::Refresh, self.refresh_ttl)
    }

    pub fn decode_access(&self, token: &str) -> Result<Claims, AuthError> {
        self.decode_kind(token, TokenKind::Access)
    }

    pub fn decode_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        self.decode_kind(token, TokenKind::Refresh)
    }

    fn issue(&self, subject: &str, typ: TokenKind, ttl: Duration) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            aud: AUDIENCE.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            typ,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(IssuedToken { token, claims })
    }

    fn decode_kind(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[AUDIENCE]);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|err| {
            match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;

        if data.claims.typ != expected {
            return Err(AuthError::InvalidToken);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            "test_secret_key_that_is_long_enough_for_hs256",
            "lanxpert-test",
            Duration::minutes(30),
            Duration::days(7),
        )
    }

    #[test]
    fn access_tokens_round_trip() {
        let issuer = issuer();
        let issued = issuer.issue_access("user-1").unwrap();

        let claims = issuer.decode_access(&issued.token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.typ, TokenKind::Access);
        assert_eq!(claims.iss, "lanxpert-test");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let issuer = issuer();
        let refresh = issuer.issue_refresh("user-1").unwrap();
        let access = issuer.issue_access("user-1").unwrap();

        assert!(matches!(issuer.decode_access(&refresh.token), Err(AuthError::InvalidToken)));
        assert!(matches!(issuer.decode_refresh(&access.token), Err(AuthError::InvalidToken)));
        assert!(issuer.decode_refresh(&refresh.token).is_ok());
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let other = TokenIssuer::new("another-secret", "lanxpert-test", Duration::minutes(30), Duration::days(7));
        let token = other.issue_access("user-1").unwrap().token;

        assert!(matches!(issuer().decode_access(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(issuer().decode_access("invalid.jwt.token"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn expired_tokens_are_reported_as_expired() {
        let issuer = TokenIssuer::new("secret", "lanxpert-test", Duration::seconds(-120), Duration::days(7));
        let token = issuer.issue_access("user-1").unwrap().token;

        assert!(matches!(issuer.decode_access(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn every_token_gets_a_fresh_jti() {
        let issuer = issuer();
        let a = issuer.issue_refresh("user-1").unwrap();
        let b = issuer.issue_refresh("user-1").unwrap();
        assert_ne!(a.claims.jti, b.claims.jti);
    }
}
