//! Server configuration management

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ApiError, Result};
use serde::{Deserialize, Serialize};

/// Where template records are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In process memory, empty on every start
    Memory,
    /// JSON files below `data_dir`
    Fs,
}

impl FromStr for StorageBackend {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "fs" | "filesystem" => Ok(StorageBackend::Fs),
            other => Err(ApiError::Config(format!(
                "Invalid STORAGE_BACKEND value: {}",
                other
            ))),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    pub storage_backend: StorageBackend,

    /// Root directory for the `fs` backend
    pub data_dir: PathBuf,

    /// Number of render results to memoize, 0 to disable
    pub render_cache_size: usize,

    /// Artificial delay before every save, in milliseconds
    pub save_latency_ms: u64,

    /// CORS allowed origins
    pub cors_origins: Vec<String>,

    /// Whether to enable debug logging
    pub debug: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host: var("HOST", "0.0.0.0"),
            port: var("PORT", "3000")
                .parse()
                .map_err(|_| ApiError::Config("Invalid PORT value".to_string()))?,
            storage_backend: var("STORAGE_BACKEND", "memory").parse()?,
            data_dir: PathBuf::from(var("DATA_DIR", "./data")),
            render_cache_size: var("RENDER_CACHE_SIZE", "128")
                .parse()
                .map_err(|_| ApiError::Config("Invalid RENDER_CACHE_SIZE value".to_string()))?,
            save_latency_ms: var("SAVE_LATENCY_MS", "0")
                .parse()
                .map_err(|_| ApiError::Config("Invalid SAVE_LATENCY_MS value".to_string()))?,
            cors_origins: var("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            debug: lookup("DEBUG")
                .map(|s| s.to_lowercase() == "true")
                .unwrap_or(false),
        })
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            storage_backend: StorageBackend::Memory,
            data_dir: PathBuf::from("./data"),
            render_cache_size: 128,
            save_latency_ms: 0,
            cors_origins: vec!["*".to_string()],
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.render_cache_size, 128);
        assert_eq!(config.save_latency_ms, 0);
        assert!(config.allows_any_origin());
        assert!(!config.debug);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("STORAGE_BACKEND", "fs"),
            ("DATA_DIR", "/var/lib/mailmake"),
            ("SAVE_LATENCY_MS", "250"),
            ("CORS_ORIGINS", "http://localhost:5173, https://mail.example.com"),
            ("DEBUG", "TRUE"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.storage_backend, StorageBackend::Fs);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/mailmake"));
        assert_eq!(config.save_latency_ms, 250);
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:5173", "https://mail.example.com"]
        );
        assert!(!config.allows_any_origin());
        assert!(config.debug);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(config_from(&[("PORT", "http")]), Err(ApiError::Config(_))));
        assert!(matches!(
            config_from(&[("STORAGE_BACKEND", "s3")]),
            Err(ApiError::Config(_))
        ));
    }
}
