//! API configuration
//!
//! Loaded from an optional `config/ledger.toml` and then from `API__*`
//! environment variables, which win. Nested keys use a double underscore,
//! e.g. `API__BILLING__INVOICE_DUE_DAYS=14` or `API__DATABASE__LOCK_TIMEOUT_MS=2000`.

use serde::Deserialize;

use domain_billing::BillingConfig;
use infra_db::DatabaseConfig;

/// Default location of the configuration file, without extension
pub const DEFAULT_CONFIG_FILE: &str = "config/ledger";

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Connection pool settings
    pub database: DatabaseConfig,
    /// Log level
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Ledger settings handed to the billing service
    pub billing: BillingConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database: DatabaseConfig::default(),
            log_level: "info".to_string(),
            log_json: false,
            billing: BillingConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from the default file and the environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::load(DEFAULT_CONFIG_FILE)
    }

    /// Loads configuration from `file` (optional) and the environment
    pub fn load(file: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix("API")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Checks the settings that cannot be defaulted safely
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(config::ConfigError::Message("jwt_secret must not be empty".into()));
        }
        self.database
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        self.billing
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;

    #[test]
    fn test_defaults_are_valid() {
        let config = ApiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.billing.currency, Currency::INR);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ApiConfig::load("does/not/exist").unwrap();
        assert_eq!(config.jwt_expiration_secs, 3600);
        assert_eq!(config.billing.invoice_number_attempts, 3);
    }

    #[test]
    fn test_inverted_pool_bounds_are_rejected() {
        let config = ApiConfig {
            database: DatabaseConfig {
                max_connections: 1,
                min_connections: 4,
                ..DatabaseConfig::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_secret_is_rejected() {
        let config = ApiConfig {
            jwt_secret: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
