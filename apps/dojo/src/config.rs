//! # Configuration
//!
//! `dojo.toml`, read once at startup.
//!
//! ```toml
//! [database]
//! path = "dojo.redb"
//!
//! [export]
//! path = "backups"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! rate_limit = 100
//!
//! [auth]
//! admin_password = "secret"
//!
//! [[grades]]
//! name = "10. Kyu weiss"
//!
//! [[stickers]]
//! threshold = 0
//! name = "Anfänger"
//! ```
//!
//! Every section is optional. `[[grades]]` and `[[stickers]]` replace the
//! built-in tables as a whole when present.
//!
//! ## Environment Overrides
//!
//! - `DOJO_ADMIN_PASSWORD`: replaces `auth.admin_password`
//! - `DOJO_RATE_LIMIT`: replaces `server.rate_limit` (0 disables)

use dojo_core::{DojoError, GradeRequirement, GradeTable, StickerTable, StickerTier};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "dojo.toml";

/// Maximum configuration file size (1 MB).
const MAX_CONFIG_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Directory backups are written to when no output path is given.
    #[serde(default = "default_export_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Requests per second, 0 disables rate limiting.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Required as Bearer token on every endpoint except `/health`.
    #[serde(default)]
    pub admin_password: Option<String>,
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub grades: Vec<GradeRequirement>,
    #[serde(default)]
    pub stickers: Vec<StickerTier>,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("dojo.redb")
}

fn default_export_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_rate_limit() -> u32 {
    100
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: default_export_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            rate_limit: default_rate_limit(),
        }
    }
}

impl Config {
    /// Parse configuration text.
    pub fn from_toml(text: &str) -> Result<Self, DojoError> {
        toml::from_str(text).map_err(|e| DojoError::DeserializationError(format!("config: {}", e)))
    }

    /// Load `path`, falling back to defaults if it does not exist, then
    /// apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, DojoError> {
        let mut config = if path.exists() {
            let size = std::fs::metadata(path)
                .map_err(|e| DojoError::IoError(format!("config metadata: {}", e)))?
                .len();
            if size > MAX_CONFIG_SIZE {
                return Err(DojoError::DeserializationError(format!(
                    "config file is {} bytes, limit is {}",
                    size, MAX_CONFIG_SIZE
                )));
            }
            let text = std::fs::read_to_string(path)
                .map_err(|e| DojoError::IoError(format!("read config: {}", e)))?;
            tracing::debug!("Loaded configuration from {}", path.display());
            Self::from_toml(&text)?
        } else {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(password) = std::env::var("DOJO_ADMIN_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty())
        {
            self.auth.admin_password = Some(password);
        }
        if let Some(limit) = std::env::var("DOJO_RATE_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.server.rate_limit = limit;
        }
    }

    /// The configured grade table, or the built-in one.
    pub fn grade_table(&self) -> Result<GradeTable, DojoError> {
        if self.grades.is_empty() {
            Ok(GradeTable::standard())
        } else {
            GradeTable::new(self.grades.clone())
        }
    }

    /// The configured sticker table, or the built-in one.
    pub fn sticker_table(&self) -> Result<StickerTable, DojoError> {
        if self.stickers.is_empty() {
            Ok(StickerTable::standard())
        } else {
            StickerTable::new(self.stickers.clone())
        }
    }

    /// Admin password, treating an empty string as unset.
    pub fn admin_password(&self) -> Option<&str> {
        self.auth
            .admin_password
            .as_deref()
            .filter(|p| !p.is_empty())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").expect("parse");
        assert_eq!(config.database.path, PathBuf::from("dojo.redb"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.rate_limit, 100);
        assert!(config.admin_password().is_none());
        assert_eq!(config.grade_table().expect("grades"), GradeTable::standard());
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::from_toml(
            r#"
            [database]
            path = "/var/lib/dojo/dojo.redb"

            [server]
            port = 9000

            [auth]
            admin_password = ""

            [[stickers]]
            threshold = 0
            name = "Start"

            [[stickers]]
            threshold = 10
            name = "Zehn"
            "#,
        )
        .expect("parse");

        assert_eq!(config.database.path, PathBuf::from("/var/lib/dojo/dojo.redb"));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.admin_password().is_none());
        assert_eq!(config.sticker_table().expect("stickers").max_threshold(), 10);
    }

    #[test]
    fn invalid_sticker_table_rejected() {
        let config = Config::from_toml(
            r#"
            [[stickers]]
            threshold = 5
            name = "Late start"
            "#,
        )
        .expect("parse");
        assert!(matches!(
            config.sticker_table(),
            Err(DojoError::InvalidRules(_))
        ));
    }

    #[test]
    fn missing_file_is_default() {
        let temp = tempfile::tempdir().expect("temp dir");
        let config = Config::load(&temp.path().join("absent.toml")).expect("load");
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn malformed_file_is_error() {
        assert!(matches!(
            Config::from_toml("[server]\nport = \"eighty\""),
            Err(DojoError::DeserializationError(_))
        ));
    }
}
