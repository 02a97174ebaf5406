//! Configuration management for the claim service
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use portal_common::Principal;
use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub api_host: String,

    /// API server port
    pub api_port: u16,

    /// Redis connection URL; in-memory storage when unset
    pub redis_url: Option<String>,

    /// Upper bound for `page_size` on listings
    pub max_page_size: u64,

    /// Principals granted `admin` at startup
    pub bootstrap_admins: Vec<Principal>,

    /// Winning entries imported at startup
    pub entries_seed_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Config {
            api_host: non_empty("PORTAL_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),

            api_port: non_empty("PORTAL_PORT")
                .unwrap_or_else(|| "8086".to_string())
                .parse()
                .context("Invalid PORTAL_PORT")?,

            redis_url: non_empty("REDIS_URL"),

            max_page_size: non_empty("MAX_PAGE_SIZE")
                .unwrap_or_else(|| "100".to_string())
                .parse()
                .context("Invalid MAX_PAGE_SIZE")?,

            bootstrap_admins: non_empty("BOOTSTRAP_ADMINS")
                .map(|raw| {
                    raw.split(',')
                        .filter(|s| !s.trim().is_empty())
                        .map(Principal::new)
                        .collect::<std::result::Result<Vec<_>, _>>()
                })
                .transpose()
                .context("Invalid BOOTSTRAP_ADMINS")?
                .unwrap_or_default(),

            entries_seed_path: non_empty("ENTRIES_SEED_PATH").map(PathBuf::from),
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            anyhow::bail!("PORTAL_PORT must be greater than 0");
        }

        if self.max_page_size == 0 {
            anyhow::bail!("MAX_PAGE_SIZE must be greater than 0");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup(&[])).expect("Failed to load config");

        assert_eq!(config.api_host, "0.0.0.0");
        assert_eq!(config.api_port, 8086);
        assert!(config.redis_url.is_none());
        assert_eq!(config.max_page_size, 100);
        assert!(config.bootstrap_admins.is_empty());
        assert!(config.entries_seed_path.is_none());
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORTAL_HOST", "127.0.0.1"),
            ("PORTAL_PORT", "9000"),
            ("REDIS_URL", "redis://127.0.0.1:6379"),
            ("MAX_PAGE_SIZE", "25"),
            ("BOOTSTRAP_ADMINS", "root, ops ,"),
            ("ENTRIES_SEED_PATH", "./seed/entries.json"),
        ]))
        .unwrap();

        assert_eq!(config.api_address(), "127.0.0.1:9000");
        assert_eq!(config.redis_url.as_deref(), Some("redis://127.0.0.1:6379"));
        assert_eq!(config.max_page_size, 25);
        let admins: Vec<&str> = config.bootstrap_admins.iter().map(|p| p.as_str()).collect();
        assert_eq!(admins, vec!["root", "ops"]);
        assert_eq!(
            config.entries_seed_path,
            Some(PathBuf::from("./seed/entries.json"))
        );
    }

    #[test]
    fn test_validate_invalid_values() {
        let err = Config::from_lookup(lookup(&[("PORTAL_PORT", "0")])).unwrap_err();
        assert!(err.to_string().contains("PORTAL_PORT must be greater than 0"));

        let err = Config::from_lookup(lookup(&[("MAX_PAGE_SIZE", "0")])).unwrap_err();
        assert!(err.to_string().contains("MAX_PAGE_SIZE"));

        let err = Config::from_lookup(lookup(&[("PORTAL_PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("Invalid PORTAL_PORT"));
    }
}
