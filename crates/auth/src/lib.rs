//! Account registration, credential checks and JWT session management.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use lanxpert_config::AuthConfig;
use lanxpert_database::{
    DatabaseError, NotificationRepository, TokenRepository, User, UserRepository,
};
use rand::RngCore;
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod password;
pub mod tokens;
pub mod validation;

pub use password::{hash_password, verify_password};
pub use tokens::{Claims, IssuedToken, TokenIssuer, TokenKind};

/// Role every new account receives.
pub const DEFAULT_ROLE: &str = "user";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed")]
    Validation(Vec<String>),
    #[error("{0}")]
    UserExists(String),
    #[error("Incorrect username or password")]
    InvalidCredentials,
    #[error("Inactive user")]
    InactiveUser,
    #[error("Could not validate credentials")]
    InvalidToken,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Token has been revoked")]
    TokenRevoked,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("repository error: {0}")]
    Repository(#[from] DatabaseError),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error("token encoding failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Tokens handed to a client after login or refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: String,
}

/// Where a login came from, kept in the login log.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Clone)]
pub struct Authenticator {
    pool: SqlitePool,
    users: UserRepository,
    tokens: TokenRepository,
    issuer: TokenIssuer,
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: &AuthConfig) -> Self {
        let issuer = TokenIssuer::new(
            &config.jwt_secret,
            config.issuer.clone(),
            Duration::minutes(config.access_token_ttl_minutes),
            Duration::days(config.refresh_token_ttl_days),
        );

        Self {
            users: UserRepository::new(pool.clone()),
            tokens: TokenRepository::new(pool.clone()),
            pool,
            issuer,
        }
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Create an account with the default role and notification settings.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User, AuthError> {
        let username = username.trim();
        let email = email.trim();

        let errors = validation::validate_registration(username, email, password);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        if self.users.email_taken(email, None).await? {
            return Err(AuthError::UserExists("Email already registered".into()));
        }
        if self.users.username_taken(username, None).await? {
            return Err(AuthError::UserExists("Username already taken".into()));
        }

        let password_hash = hash_password(password)?;

        let mut tx = self.pool.begin().await?;
        let user = UserRepository::insert(&mut tx, username, email, &password_hash)
            .await
            .map_err(|err| match err {
                DatabaseError::Duplicate(message) => AuthError::UserExists(message),
                other => AuthError::Repository(other),
            })?;
        UserRepository::assign_role_in(&mut tx, &user.id, DEFAULT_ROLE).await?;
        NotificationRepository::ensure_settings_in(&mut tx, &user.id).await?;
        tx.commit().await?;

        info!(user_id = %user.id, username = %user.username, "registered user");
        Ok(user)
    }

    /// Check credentials for a username or email and start a session.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        client: &ClientInfo,
    ) -> Result<(User, TokenPair), AuthError> {
        let Some(user) = self.users.find_by_login(identifier.trim()).await? else {
            debug!(identifier, "login for unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            debug!(user_id = %user.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active || user.is_deleted() {
            return Err(AuthError::InactiveUser);
        }

        self.tokens
            .record_login(&user.id, client.ip_address.as_deref(), client.user_agent.as_deref())
            .await?;

        let pair = self.issue_pair(&user.id).await?;
        info!(user_id = %user.id, "user logged in");
        Ok((user, pair))
    }

    /// Exchange a refresh token for a new pair. The presented token is revoked.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.issuer.decode_refresh(refresh_token)?;

        let Some(record) = self.tokens.find_refresh(&claims.jti).await? else {
            return Err(AuthError::InvalidToken);
        };
        if record.revoked {
            warn!(user_id = %record.user_id, "revoked refresh token presented");
            return Err(AuthError::TokenRevoked);
        }
        if is_expired(&record.expires_at) {
            return Err(AuthError::TokenExpired);
        }

        let user = self.load_active_user(&record.user_id).await?;

        if !self.tokens.revoke_refresh(&claims.jti).await? {
            return Err(AuthError::TokenRevoked);
        }

        self.issue_pair(&user.id).await
    }

    /// Revoke a refresh token. Unknown or already revoked tokens are not an error.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self.issuer.decode_refresh(refresh_token)?;
        if self.tokens.revoke_refresh(&claims.jti).await? {
            debug!(user_id = %claims.sub, "refresh token revoked");
        }
        Ok(())
    }

    /// Resolve a bearer access token to its user.
    pub async fn authenticate(&self, access_token: &str) -> Result<User, AuthError> {
        let claims = self.issuer.decode_access(access_token)?;
        self.load_active_user(&claims.sub).await
    }

    async fn load_active_user(&self, user_id: &str) -> Result<User, AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if user.is_deleted() {
            return Err(AuthError::InvalidToken);
        }
        if !user.is_active {
            return Err(AuthError::InactiveUser);
        }
        Ok(user)
    }

    async fn issue_pair(&self, user_id: &str) -> Result<TokenPair, AuthError> {
        let access = self.issuer.issue_access(user_id)?;
        let refresh = self.issuer.issue_refresh(user_id)?;

        let expires_at = refresh
            .claims
            .expires_at()
            .to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
        self.tokens
            .store_refresh(&refresh.claims.jti, user_id, &expires_at)
            .await?;

        Ok(TokenPair {
            access_token: access.token,
            token_type: "bearer".to_string(),
            refresh_token: refresh.token,
        })
    }
}

/// Random URL-safe token for email verification links.
pub fn generate_verification_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn is_expired(expires_at: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(expires_at)
        .map(|at| at.with_timezone(&Utc) <= Utc::now())
        .unwrap_or(true)
}
