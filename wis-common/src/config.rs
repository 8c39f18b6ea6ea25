//! Configuration loading and config file resolution
//!
//! Config file resolution priority order:
//! 1. Command-line argument (highest priority)
//! 2. `WIS_CONFIG` environment variable
//! 3. Platform config file (`~/.config/wis/config.toml`, then `/etc/wis/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is not fatal: the service warns and starts on defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CONFIG_ENV_VAR: &str = "WIS_CONFIG";
pub const PRIMARY_TOKEN_ENV_VAR: &str = "WIS_PRIMARY_TOKEN";
pub const SECONDARY_PAT_ENV_VAR: &str = "WIS_SECONDARY_PAT";

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Socket address the HTTP listener binds to
    pub bind_address: String,
    pub primary: PrimaryConfig,
    pub secondary: SecondaryConfig,
    pub products: ProductConfig,
    pub extraction: ExtractionConfig,
    pub logging: LoggingConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5740".to_string(),
            primary: PrimaryConfig::default(),
            secondary: SecondaryConfig::default(),
            products: ProductConfig::default(),
            extraction: ExtractionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Release ticket service connection
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PrimaryConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Attempts for transient failures (transport errors, 5xx)
    pub retry_attempts: u32,
    /// Delay added per retry, in milliseconds
    pub retry_backoff_ms: u64,
    pub bearer_token: Option<String>,
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: 30,
            retry_attempts: 3,
            retry_backoff_ms: 500,
            bearer_token: None,
        }
    }
}

/// Legacy tracker connection
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SecondaryConfig {
    pub base_url: String,
    /// Team project the saved queries and WIQL run against
    pub project: String,
    pub api_version: String,
    pub timeout_secs: u64,
    pub personal_access_token: Option<String>,
    /// Work items fetched per batch request
    pub batch_size: usize,
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            project: "OS".to_string(),
            api_version: "7.0".to_string(),
            timeout_secs: 60,
            personal_access_token: None,
            batch_size: 100,
        }
    }
}

/// Product settings used when fanning out to child bugs
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProductConfig {
    /// Client product → server product sharing the same servicing codebase
    pub client_server_mapping: BTreeMap<String, String>,
}

impl ProductConfig {
    /// The product itself followed by every aliased server product
    ///
    /// Keys match case-insensitively; each matching entry contributes its value.
    pub fn products_for(&self, product: &str) -> Vec<String> {
        let mut products = vec![product.to_string()];
        products.extend(
            self.client_server_mapping
                .iter()
                .filter(|(client, _)| client.eq_ignore_ascii_case(product))
                .map(|(_, server)| server.clone()),
        );
        products
    }
}

/// Payload extraction tuning
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Concurrent extraction workers per request
    pub max_concurrency: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { max_concurrency: 4 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level directive when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Check the settings the service cannot start without
    pub fn validate(&self) -> Result<()> {
        if self.primary.base_url.trim().is_empty() {
            return Err(Error::Config("primary.base_url must be set".to_string()));
        }
        if self.secondary.base_url.trim().is_empty() {
            return Err(Error::Config("secondary.base_url must be set".to_string()));
        }
        if self.extraction.max_concurrency == 0 {
            return Err(Error::Config(
                "extraction.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.secondary.batch_size == 0 {
            return Err(Error::Config("secondary.batch_size must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Overlay secrets supplied through the environment
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var(PRIMARY_TOKEN_ENV_VAR) {
            if !token.trim().is_empty() {
                self.primary.bearer_token = Some(token);
            }
        }
        if let Ok(pat) = std::env::var(SECONDARY_PAT_ENV_VAR) {
            if !pat.trim().is_empty() {
                self.secondary.personal_access_token = Some(pat);
            }
        }
    }
}

/// Pick the config file to load, if any
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config file
    default_config_paths().into_iter().find(|path| path.exists())
}

/// Platform config file candidates, most specific first
fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("wis").join("config.toml"));
    }
    if cfg!(unix) {
        paths.push(PathBuf::from("/etc/wis/config.toml"));
    }
    paths
}

/// Parse a TOML document into a `ServiceConfig`
pub fn parse_config(content: &str) -> Result<ServiceConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load configuration following the resolution priority order
///
/// Environment secret overrides are applied last.
pub fn load_config(cli_arg: Option<&Path>) -> Result<ServiceConfig> {
    let mut config = match resolve_config_path(cli_arg) {
        Some(path) if path.exists() => {
            let content = std::fs::read_to_string(&path)?;
            let config = parse_config(&content)?;
            info!("Loaded configuration from {}", path.display());
            config
        }
        Some(path) => {
            warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            );
            ServiceConfig::default()
        }
        None => {
            warn!("No config file found, using compiled defaults");
            ServiceConfig::default()
        }
    };

    config.apply_env_overrides();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products_for_without_mapping() {
        let products = ProductConfig::default().products_for("Windows 10 1607");
        assert_eq!(products, vec!["Windows 10 1607".to_string()]);
    }

    #[test]
    fn test_products_for_is_case_insensitive() {
        let mut mapping = BTreeMap::new();
        mapping.insert("Windows 10 1607".to_string(), "Windows Server 2016".to_string());
        mapping.insert("Windows 10 1809".to_string(), "Windows Server 2019".to_string());
        let config = ProductConfig {
            client_server_mapping: mapping,
        };

        assert_eq!(
            config.products_for("windows 10 1607"),
            vec!["windows 10 1607".to_string(), "Windows Server 2016".to_string()]
        );
        assert_eq!(config.products_for("Windows 11").len(), 1);
    }

    #[test]
    fn test_validate_requires_base_urls() {
        let mut config = ServiceConfig::default();
        assert!(config.validate().is_err());

        config.primary.base_url = "https://tickets.example".to_string();
        config.secondary.base_url = "https://tracker.example".to_string();
        assert!(config.validate().is_ok());

        config.extraction.max_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_partial_document_keeps_defaults() {
        let config = parse_config(
            r#"
            [primary]
            base_url = "https://tickets.example"
            "#,
        )
        .unwrap();

        assert_eq!(config.primary.base_url, "https://tickets.example");
        assert_eq!(config.primary.timeout_secs, 30);
        assert_eq!(config.secondary.batch_size, 100);
        assert_eq!(config.bind_address, "127.0.0.1:5740");
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        let err = parse_config("primary = [").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
