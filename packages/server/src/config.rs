//! Server configuration loaded from environment variables
//!
//! Every setting has a default except the API keys; missing keys only
//! disable the matching outbound client (calls fail with a logged error).
//!
//! | Variable | Default |
//! |---|---|
//! | `STUDYFORGE_BIND` | `127.0.0.1` |
//! | `STUDYFORGE_PORT` | `3001` |
//! | `STUDYFORGE_DB_PATH` | `~/.studyforge/database/studyforge.db` |
//! | `CORS_ALLOW_ORIGIN` | localhost dev origins |
//! | `OPENAI_API_KEY` | - |
//! | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
//! | `OPENAI_MODEL` | `gpt-4o-mini` |
//! | `TTS_API_KEY` / `TTS_BASE_URL` | - / `https://texttospeech.googleapis.com` |
//! | `STORAGE_URL` / `STORAGE_API_KEY` / `STORAGE_BUCKET` | - / - / `recordings` |
//! | `HTTP_TIMEOUT_SECS` | `30` |

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://localhost:1420",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value '{value}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Failed to get home directory; set STUDYFORGE_DB_PATH")]
    NoHomeDir,
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub bucket: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub cors_origins: Vec<String>,
    pub http_timeout: Duration,
    pub chat: ChatConfig,
    pub speech: SpeechConfig,
    pub storage: StorageConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = match var("STUDYFORGE_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => dirs::home_dir()
                .ok_or(ConfigError::NoHomeDir)?
                .join(".studyforge")
                .join("database")
                .join("studyforge.db"),
        };

        let cors_origins = match var("CORS_ALLOW_ORIGIN") {
            Some(origins) => origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let timeout_secs: u64 = parse_or(&var, "HTTP_TIMEOUT_SECS", 30)?;

        Ok(Self {
            bind_address: var("STUDYFORGE_BIND").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&var, "STUDYFORGE_PORT", 3001)?,
            db_path,
            cors_origins,
            http_timeout: Duration::from_secs(timeout_secs),
            chat: ChatConfig {
                base_url: var("OPENAI_BASE_URL")
                    .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
                api_key: var("OPENAI_API_KEY"),
                model: var("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            },
            speech: SpeechConfig {
                base_url: var("TTS_BASE_URL")
                    .unwrap_or_else(|| "https://texttospeech.googleapis.com".to_string()),
                api_key: var("TTS_API_KEY"),
            },
            storage: StorageConfig {
                base_url: var("STORAGE_URL"),
                api_key: var("STORAGE_API_KEY"),
                bucket: var("STORAGE_BUCKET").unwrap_or_else(|| "recordings".to_string()),
            },
        })
    }

    /// `host:port` to bind the listener to
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("STUDYFORGE_DB_PATH", "/tmp/sf.db")]).unwrap();

        assert_eq!(config.socket_address(), "127.0.0.1:3001");
        assert_eq!(config.db_path, PathBuf::from("/tmp/sf.db"));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.chat.model, "gpt-4o-mini");
        assert!(config.chat.api_key.is_none());
        assert_eq!(config.storage.bucket, "recordings");
        assert_eq!(config.cors_origins.len(), DEFAULT_CORS_ORIGINS.len());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("STUDYFORGE_DB_PATH", "/tmp/sf.db"),
            ("STUDYFORGE_PORT", "8080"),
            ("STUDYFORGE_BIND", "0.0.0.0"),
            ("CORS_ALLOW_ORIGIN", "https://a.example, https://b.example"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
        .unwrap();

        assert_eq!(config.socket_address(), "0.0.0.0:8080");
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.chat.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let err = load(&[
            ("STUDYFORGE_DB_PATH", "/tmp/sf.db"),
            ("STUDYFORGE_PORT", "not-a-port"),
        ])
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "STUDYFORGE_PORT"
        ));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = load(&[("STUDYFORGE_DB_PATH", "/tmp/sf.db"), ("OPENAI_MODEL", "  ")]).unwrap();
        assert_eq!(config.chat.model, "gpt-4o-mini");
    }
}
