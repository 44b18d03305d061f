//! Configuration loading and logging setup
//!
//! ```yaml
//! bind: 0.0.0.0:8080
//! prefix: /crud
//! auth_path: /auth
//! title: Back office
//! default_page_size: 25
//! session_ttl_days: 7
//! client_idle_minutes: 120
//! environment: prod
//! log_filter: admin=debug,tower_http=info
//! ```
//!
//! Every key is optional. `ADMIN_BIND`, `ADMIN_PREFIX`, `ADMIN_ENV` and
//! `ADMIN_LOG` override the file when set.

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Longest accepted login session (about a century)
pub const MAX_SESSION_TTL_DAYS: i64 = 36_500;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    /// Cookies are marked `Secure`
    Prod,
}

impl Environment {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "dev" | "development" => Some(Environment::Dev),
            "prod" | "production" => Some(Environment::Prod),
            _ => None,
        }
    }
}

/// Settings of the admin server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Address `serve` binds to
    pub bind: String,

    /// Path prefix of the CRUD screens
    pub prefix: String,

    /// Path prefix of the login/logout endpoints
    pub auth_path: String,

    /// Title shown in page headers
    pub title: String,

    pub default_page_size: usize,

    /// Lifetime of a login session
    pub session_ttl_days: i64,

    /// Client states idle for longer are dropped
    pub client_idle_minutes: u64,

    pub environment: Environment,

    /// `tracing_subscriber::EnvFilter` directives, used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            prefix: "/crud".to_string(),
            auth_path: "/auth".to_string(),
            title: "Admin".to_string(),
            default_page_size: crate::core::query::DEFAULT_PAGE_SIZE,
            session_ttl_days: 7,
            client_idle_minutes: 120,
            environment: Environment::Dev,
            log_filter: "info,admin=debug".to_string(),
        }
    }
}

impl AdminConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ADMIN_*` environment variables
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(bind) = lookup("ADMIN_BIND") {
            self.bind = bind;
        }
        if let Some(prefix) = lookup("ADMIN_PREFIX") {
            self.prefix = prefix;
        }
        if let Some(env) = lookup("ADMIN_ENV") {
            self.environment =
                Environment::parse(&env).ok_or_else(|| anyhow!("Unknown ADMIN_ENV value: {}", env))?;
        }
        if let Some(filter) = lookup("ADMIN_LOG") {
            self.log_filter = filter;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check path prefixes and numeric settings
    pub fn validate(&self) -> Result<()> {
        for (key, path) in [("prefix", &self.prefix), ("auth_path", &self.auth_path)] {
            if !path.starts_with('/') || path.len() < 2 || path.ends_with('/') {
                bail!("{} must start with '/' and not end with '/': {:?}", key, path);
            }
        }
        if self.prefix == self.auth_path {
            bail!("prefix and auth_path must differ");
        }
        if self.default_page_size == 0 {
            bail!("default_page_size must be positive");
        }
        if !(1..=MAX_SESSION_TTL_DAYS).contains(&self.session_ttl_days) {
            bail!(
                "session_ttl_days must be between 1 and {}: {}",
                MAX_SESSION_TTL_DAYS,
                self.session_ttl_days
            );
        }
        Ok(())
    }

    pub fn login_path(&self) -> String {
        format!("{}/login", self.auth_path)
    }

    pub fn logout_path(&self) -> String {
        format!("{}/logout", self.auth_path)
    }

    pub fn secure_cookies(&self) -> bool {
        self.environment == Environment::Prod
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session_ttl_days)
    }

    pub fn client_idle(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.client_idle_minutes.saturating_mul(60))
    }

    /// Install the global tracing subscriber
    ///
    /// `RUST_LOG` wins over `log_filter`. Fails if a subscriber is already set.
    pub fn init_tracing(&self) -> Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.log_filter))
            .map_err(|e| anyhow!("Invalid log filter {:?}: {}", self.log_filter, e))?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AdminConfig::default();
        assert_eq!(config.prefix, "/crud");
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.session_ttl(), chrono::Duration::days(7));
        assert_eq!(config.login_path(), "/auth/login");
        assert!(!config.secure_cookies());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_str_partial() {
        let config = AdminConfig::from_yaml_str(
            "prefix: /admin\ndefault_page_size: 25\nenvironment: prod\n",
        )
        .expect("config should parse");
        assert_eq!(config.prefix, "/admin");
        assert_eq!(config.default_page_size, 25);
        assert_eq!(config.bind, "127.0.0.1:3000");
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_invalid_prefix_rejected() {
        assert!(AdminConfig::from_yaml_str("prefix: crud\n").is_err());
        assert!(AdminConfig::from_yaml_str("prefix: /crud/\n").is_err());
        assert!(AdminConfig::from_yaml_str("auth_path: /crud\n").is_err());
        assert!(AdminConfig::from_yaml_str("default_page_size: 0\n").is_err());
    }

    #[test]
    fn test_session_ttl_is_bounded() {
        assert!(AdminConfig::from_yaml_str("session_ttl_days: 0\n").is_err());
        assert!(AdminConfig::from_yaml_str("session_ttl_days: 36501\n").is_err());
        assert!(AdminConfig::from_yaml_str("session_ttl_days: 9223372036854775807\n").is_err());

        let config = AdminConfig::from_yaml_str("session_ttl_days: 36500\n")
            .expect("config should parse");
        assert_eq!(config.session_ttl(), chrono::Duration::days(MAX_SESSION_TTL_DAYS));
    }

    #[test]
    fn test_client_idle_saturates() {
        let config = AdminConfig {
            client_idle_minutes: u64::MAX,
            ..Default::default()
        };
        assert_eq!(config.client_idle(), std::time::Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file should be created");
        writeln!(file, "title: Back office\nsession_ttl_days: 1").expect("write should succeed");

        let config = AdminConfig::from_yaml_file(file.path()).expect("config should load");
        assert_eq!(config.title, "Back office");
        assert_eq!(config.session_ttl(), chrono::Duration::days(1));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("ADMIN_PREFIX", "/backoffice"), ("ADMIN_ENV", "production")]);
        let config = AdminConfig::default()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .expect("overrides should apply");
        assert_eq!(config.prefix, "/backoffice");
        assert_eq!(config.environment, Environment::Prod);

        let bad: HashMap<&str, &str> = HashMap::from([("ADMIN_ENV", "staging")]);
        assert!(
            AdminConfig::default()
                .with_overrides(|key| bad.get(key).map(|v| v.to_string()))
                .is_err()
        );
    }
}
