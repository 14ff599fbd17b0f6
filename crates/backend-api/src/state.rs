use std::sync::Arc;

use axum::http::HeaderMap;
use lanxpert_auth::Authenticator;
use lanxpert_config::AppConfig;
use lanxpert_database::User;
use sqlx::SqlitePool;

use crate::util::{optional_bearer, require_bearer};
use crate::ApiError;

pub const ADMIN_ROLES: [&str; 2] = ["admin", "moderator"];
pub const SUPER_ADMIN_ROLE: &str = "admin";

#[derive(Clone)]
pub struct AppState {
    pool: SqlitePool,
    authenticator: Authenticator,
    config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, authenticator: Authenticator, config: Arc<AppConfig>) -> Self {
        Self {
            pool,
            authenticator,
            config,
        }
    }

    pub fn from_config(pool: SqlitePool, config: AppConfig) -> Self {
        let authenticator = Authenticator::new(pool.clone(), &config.auth);
        Self::new(pool, authenticator, Arc::new(config))
    }

    pub fn db_pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn authenticate(&self, token: &str) -> Result<User, ApiError> {
        self.authenticator
            .authenticate(token)
            .await
            .map_err(ApiError::from)
    }

    /// The caller behind the `Authorization` header; 401 without one.
    pub async fn current_user(&self, headers: &HeaderMap) -> Result<User, ApiError> {
        let token = require_bearer(headers)?;
        self.authenticate(&token).await
    }

    /// Like [`AppState::current_user`] for public routes that personalise
    /// their output. A missing or unusable token yields `None`.
    pub async fn optional_user(&self, headers: &HeaderMap) -> Option<User> {
        let token = optional_bearer(headers)?;
        self.authenticator.authenticate(&token).await.ok()
    }

    /// Caller must hold `admin` or `moderator`.
    pub async fn require_admin(&self, headers: &HeaderMap) -> Result<User, ApiError> {
        let user = self.current_user(headers).await?;
        if self.has_any_role(&user, &ADMIN_ROLES).await? {
            Ok(user)
        } else {
            Err(ApiError::forbidden("Not enough permissions"))
        }
    }

    /// Caller must hold `admin`.
    pub async fn require_super_admin(&self, headers: &HeaderMap) -> Result<User, ApiError> {
        let user = self.current_user(headers).await?;
        if self.has_any_role(&user, &[SUPER_ADMIN_ROLE]).await? {
            Ok(user)
        } else {
            Err(ApiError::forbidden("Super admin access required"))
        }
    }

    async fn has_any_role(&self, user: &User, wanted: &[&str]) -> Result<bool, ApiError> {
        if self
            .config
            .auth
            .bootstrap_admins
            .iter()
            .any(|name| name == &user.username)
        {
            return Ok(true);
        }

        let roles = lanxpert_database::UserRepository::new(self.pool.clone())
            .role_names(&user.id)
            .await?;
        Ok(roles.iter().any(|role| wanted.contains(&role.as_str())))
    }
}
