use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::db::DynError;

/// Credentials file structure
///
/// Format:
/// ```toml
/// [postgres.profile_name]
/// password = "your_postgres_password_here"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Credentials {
    #[serde(default)]
    pub postgres: HashMap<String, CredentialProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialProfile {
    pub password: String,
}

/// Default credentials file path: ~/.config/scrap_market/credentials.toml
pub fn get_credentials_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("scrap_market")
            .join("credentials.toml"),
    )
}

/// Load credentials from the default location
/// Returns None if the file doesn't exist
pub fn load_credentials() -> Result<Option<Credentials>, DynError> {
    let creds_path = match get_credentials_path() {
        Some(path) => path,
        None => return Ok(None),
    };

    if !creds_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&creds_path)?;
    let credentials: Credentials = toml::from_str(&content)?;

    Ok(Some(credentials))
}

/// Get the postgres password for a profile
pub fn get_password(credentials: &Option<Credentials>, profile: &str) -> Result<String, String> {
    match credentials {
        Some(creds) => creds
            .postgres
            .get(profile)
            .map(|p| p.password.clone())
            .ok_or_else(|| {
                format!(
                    "Profile '{}' not found in [postgres] section of credentials file",
                    profile
                )
            }),
        None => Err(format!(
            "Credentials file not found (expected at {}), required for profile '{}'",
            get_credentials_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "~/.config/scrap_market/credentials.toml".to_string()),
            profile
        )),
    }
}
