//! Configuration module
//!
//! Settings are read from a TOML file (`~/.config/cardbank/config.toml` by
//! default, or the path in `CARDBANK_CONFIG`). Every section has defaults, so
//! a partial file is fine. Secrets can be supplied through the environment
//! instead of the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::infrastructure::database::DatabaseConfig;
use crate::shared::validations::{validate_pagination_with, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::shared::PageRequest;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub encryption: EncryptionConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: 30,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "super-secret-key-change-in-production".to_string(),
            jwt_expiration_hours: 24,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Key material for card-number encryption at rest
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct EncryptionConfig {
    pub password: String,
    pub salt: String,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            password: String::new(),
            salt: String::new(),
        }
    }
}

impl std::fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionConfig")
            .field("password", &"<redacted>")
            .field("salt", &"<redacted>")
            .finish()
    }
}

/// Bootstrap administrator, created when the user table is empty
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: "admin@cardbank.local".to_string(),
            password: "change-me-now".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "cardbank=info,tower_http=info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl PaginationConfig {
    pub fn page_request(&self, page: Option<u32>, page_size: Option<u32>) -> PageRequest {
        validate_pagination_with(page, page_size, self.default_page_size, self.max_page_size)
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg = Self::from_toml(&raw)?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Environment wins over the file for secrets and the database URL.
    pub fn apply_env_overrides(&mut self) {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        if let Some(url) = var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(secret) = var("JWT_SECRET") {
            self.security.jwt_secret = secret;
        }
        if let Some(password) = var("CARD_ENCRYPTION_PASSWORD") {
            self.encryption.password = password;
        }
        if let Some(salt) = var("CARD_ENCRYPTION_SALT") {
            self.encryption.salt = salt;
        }
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.security.jwt_secret.clone(),
            expiration_hours: self.security.jwt_expiration_hours,
            issuer: "cardbank".to_string(),
        }
    }
}

/// `~/.config/cardbank/config.toml`, or `./config.toml` when there is no home.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("cardbank").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            port = 9090

            [encryption]
            password = "pw"
            salt = "saltsalt"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.encryption.salt, "saltsalt");
        assert_eq!(cfg.security.jwt_expiration_hours, 24);
        assert!(!cfg.database.is_in_memory());
    }

    #[test]
    fn connect_retry_is_configurable() {
        let cfg = AppConfig::from_toml(
            "[database]\nurl = \"postgres://db/cards\"\n[database.connect_retry]\nattempts = 8",
        )
        .unwrap();
        assert_eq!(cfg.database.connect_retry.attempts, 8);
        assert_eq!(cfg.database.connect_retry.initial_delay_ms, 500);
    }

    #[test]
    fn memory_url_selects_in_memory_store() {
        let cfg = AppConfig::from_toml("[database]\nurl = \"memory://\"").unwrap();
        assert!(cfg.database.is_in_memory());
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        assert!(matches!(
            AppConfig::from_toml("[server\nport = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn encryption_secrets_are_redacted_in_debug() {
        let cfg = EncryptionConfig {
            password: "hunter2".into(),
            salt: "pepper-salt".into(),
        };
        let shown = format!("{:?}", cfg);
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("pepper-salt"));
    }

    #[test]
    fn pagination_limits_come_from_config() {
        let cfg = AppConfig::from_toml(
            "[pagination]\ndefault_page_size = 5\nmax_page_size = 10",
        )
        .unwrap();
        assert_eq!(cfg.pagination.page_request(None, None), PageRequest::new(1, 5));
        assert_eq!(cfg.pagination.page_request(Some(2), Some(50)), PageRequest::new(2, 10));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = AppConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
