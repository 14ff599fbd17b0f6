use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "lanxpert.toml",
    "config/lanxpert.toml",
    "crates/config/lanxpert.toml",
    "../lanxpert.toml",
    "../config/lanxpert.toml",
];

/// Secret used when nothing is configured. Fine for local development only.
pub const DEVELOPMENT_JWT_SECRET: &str = "lanxpert-development-secret-change-me";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
    /// Base URL of the web client, used to build links sent to users.
    #[serde(default = "HttpConfig::default_frontend_url")]
    pub frontend_url: String,
}

impl HttpConfig {
    fn default_frontend_url() -> String {
        "http://localhost:3000".to_string()
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8000,
            frontend_url: Self::default_frontend_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://lanxpert.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Token signing and lifetime settings.
///
/// ```
/// use lanxpert_config::AuthConfig;
///
/// let auth = AuthConfig::default();
/// assert_eq!(auth.access_token_ttl_minutes, 30);
/// assert_eq!(auth.refresh_token_ttl_days, 7);
/// assert!(auth.uses_development_secret());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_secret")]
    pub jwt_secret: String,
    #[serde(default = "AuthConfig::default_issuer")]
    pub issuer: String,
    #[serde(default = "AuthConfig::default_access_ttl")]
    pub access_token_ttl_minutes: i64,
    #[serde(default = "AuthConfig::default_refresh_ttl")]
    pub refresh_token_ttl_days: i64,
    /// Usernames that pass the admin gates without holding a role.
    #[serde(default = "AuthConfig::default_bootstrap_admins")]
    pub bootstrap_admins: Vec<String>,
}

impl AuthConfig {
    fn default_secret() -> String {
        DEVELOPMENT_JWT_SECRET.to_string()
    }

    fn default_issuer() -> String {
        "lanxpert".to_string()
    }

    const fn default_access_ttl() -> i64 {
        30
    }

    const fn default_refresh_ttl() -> i64 {
        7
    }

    fn default_bootstrap_admins() -> Vec<String> {
        vec!["admin".to_string()]
    }

    pub fn uses_development_secret(&self) -> bool {
        self.jwt_secret == DEVELOPMENT_JWT_SECRET
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Self::default_secret(),
            issuer: Self::default_issuer(),
            access_token_ttl_minutes: Self::default_access_ttl(),
            refresh_token_ttl_days: Self::default_refresh_ttl(),
            bootstrap_admins: Self::default_bootstrap_admins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use lanxpert_config::load;
///
/// std::env::remove_var("LANXPERT_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("http.frontend_url", defaults.http.frontend_url.clone())?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default("auth.jwt_secret", defaults.auth.jwt_secret.clone())?
        .set_default("auth.issuer", defaults.auth.issuer.clone())?
        .set_default(
            "auth.access_token_ttl_minutes",
            defaults.auth.access_token_ttl_minutes,
        )?
        .set_default(
            "auth.refresh_token_ttl_days",
            defaults.auth.refresh_token_ttl_days,
        )?
        .set_default("auth.bootstrap_admins", defaults.auth.bootstrap_admins.clone())?
        .set_default("cors.allowed_origins", defaults.cors.allowed_origins.clone())?;

    let environment_overrides = config::Environment::with_prefix("LANXPERT")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("cors.allowed_origins")
        .with_list_parse_key("auth.bootstrap_admins");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("LANXPERT_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via LANXPERT_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.auth.access_token_ttl_minutes <= 0 || config.auth.refresh_token_ttl_days <= 0 {
        anyhow::bail!("token lifetimes must be positive");
    }

    if config.auth.uses_development_secret() {
        warn!("auth.jwt_secret is not set, using the development secret");
    }

    debug!(
        address = %config.http.address,
        port = config.http.port,
        database = %config.database.url,
        "loaded backend configuration"
    );
    Ok(config)
}
