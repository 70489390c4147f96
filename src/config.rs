use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::constants::{ALLOWED_EXTENSIONS, MAX_UPLOAD_MB};
use crate::credentials::{get_password, Credentials};
use crate::db::{build_postgres_url, Backend, DynError};

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_mb() -> usize {
    MAX_UPLOAD_MB
}

fn default_allowed_extensions() -> Vec<String> {
    ALLOWED_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
}

fn default_database_url() -> String {
    "sqlite://scrap_market.sqlite".to_string()
}

/// Server configuration file structure
///
/// ```toml
/// port = 5000
/// upload_dir = "uploads"
///
/// [database]
/// url = "postgres://owner@db.example.com/market?sslmode=require"
/// credential_profile = "market"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Address to bind (default: 0.0.0.0)
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on (default: 5000)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding uploaded photos (default: uploads)
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Maximum request body size in megabytes (default: 16)
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
    /// Accepted photo extensions (default: png, jpg, jpeg, gif, webp)
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Database connection (maps to [database] section in TOML)
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Database configuration (maps to [database] section in TOML)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `sqlite://path` or `postgres://user@host:port/db`
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Profile name used to look up the postgres password in
    /// ~/.config/scrap_market/credentials.toml
    pub credential_profile: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            credential_profile: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            upload_dir: default_upload_dir(),
            max_upload_mb: default_max_upload_mb(),
            allowed_extensions: default_allowed_extensions(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Config {
    /// Load a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, DynError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the given file, or fall back to defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, DynError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate settings that serde cannot check on its own
    pub fn validate(&self) -> Result<(), String> {
        if self.allowed_extensions.is_empty() {
            return Err("allowed_extensions must not be empty".to_string());
        }
        if self.max_upload_mb == 0 {
            return Err("max_upload_mb must be greater than zero".to_string());
        }
        let backend = Backend::from_url(&self.database.url).map_err(|e| e.to_string())?;
        if self.database.credential_profile.is_some() && backend != Backend::Postgres {
            return Err(
                "database.credential_profile is only supported for postgres urls".to_string(),
            );
        }
        Ok(())
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }

    /// Connection url with the postgres password filled in from credentials when configured
    pub fn database_url(&self, credentials: &Option<Credentials>) -> Result<String, DynError> {
        match &self.database.credential_profile {
            Some(profile) => {
                let password = get_password(credentials, profile)?;
                build_postgres_url(&self.database.url, &password)
            }
            None => Ok(self.database.url.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_upload_bytes(), 16 * 1024 * 1024);
        assert_eq!(config.allowed_extensions.len(), 5);
        assert!(config.database.url.starts_with("sqlite://"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_credential_profile_requires_postgres() {
        let config: Config = toml::from_str(
            r#"
            [database]
            url = "sqlite://market.sqlite"
            credential_profile = "market"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_extension_list_is_rejected() {
        let config: Config = toml::from_str("allowed_extensions = []").unwrap();
        assert!(config.validate().is_err());
    }
}
