use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite library database.
    database: String,
    pub netease: NeteaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeteaseConfig {
    /// Base URL of the Netease API gateway to proxy through.
    pub api_url: String,
    /// Connect/read timeout for outbound calls, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_token_expiry_hours")]
    pub token_expiry_hours: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Exact origin allowed by CORS in release builds.
    #[serde(default)]
    pub allowed_origin: Option<String>,
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_token_expiry_hours() -> u64 {
    24
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: "~/.local/share/netease-mirror/library.db".to_string(),
            netease: NeteaseConfig {
                api_url: "http://localhost:3000".to_string(),
                timeout_ms: default_timeout_ms(),
            },
            auth: AuthConfig {
                jwt_secret: "change-me".to_string(),
                token_expiry_hours: default_token_expiry_hours(),
            },
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .context(format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("netease-mirror").join("config.toml"))
    }

    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path().ok_or(eyre!("Config file not found"))?;

        Self::from_file(&config_path)
    }

    /// Create a default config file, unless one already exists
    pub fn create_default() -> Result<PathBuf> {
        let config_path = Self::config_path().ok_or(eyre!("No config directory available"))?;

        if config_path.exists() {
            return Err(eyre!(
                "Config file already exists: {}",
                config_path.display()
            ));
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context(format!(
                "Failed to create config directory: {}",
                parent.display()
            ))?;
        }

        let contents =
            toml::to_string_pretty(&Config::default()).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context(format!(
            "Failed to write config file: {}",
            config_path.display()
        ))?;

        Ok(config_path)
    }

    /// Expand ~ to home directory
    fn expand_path(&self, path: &str) -> PathBuf {
        if path.starts_with("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(&path[2..]);
            }
        }
        PathBuf::from(path)
    }

    /// Get expanded database path
    pub fn database_path(&self) -> PathBuf {
        self.expand_path(&self.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_full_config() {
        let contents = r#"
            database = "/tmp/library.db"

            [netease]
            api_url = "http://localhost:3000"
            timeout_ms = 5000

            [auth]
            jwt_secret = "secret"
            token_expiry_hours = 12

            [server]
            allowed_origin = "https://mirror.example.com"
        "#;

        let config: Config = toml::from_str(contents).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/library.db"));
        assert_eq!(config.netease.timeout_ms, 5000);
        assert_eq!(config.auth.token_expiry_hours, 12);
        assert_eq!(
            config.server.allowed_origin.as_deref(),
            Some("https://mirror.example.com")
        );
    }

    #[test]
    fn test_optional_sections_default() {
        let contents = r#"
            database = "/tmp/library.db"

            [netease]
            api_url = "http://localhost:3000"

            [auth]
            jwt_secret = "secret"
        "#;

        let config: Config = toml::from_str(contents).unwrap();
        assert_eq!(config.netease.timeout_ms, 10_000);
        assert_eq!(config.auth.token_expiry_hours, 24);
        assert_eq!(config.server.allowed_origin, None);
    }

    #[test]
    fn test_default_config_round_trips() {
        let contents = toml::to_string_pretty(&Config::default()).unwrap();
        let config: Config = toml::from_str(&contents).unwrap();
        assert_eq!(config.netease.api_url, "http://localhost:3000");
    }
}
