//! API configuration

use serde::Deserialize;

use core_kernel::{CoreError, Currency, Timezone};
use domain_case::BillingSettings;

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
    /// Database URL
    pub database_url: String,
    /// Upper bound of the database pool
    pub db_max_connections: u32,
    /// Log level
    pub log_level: String,
    /// Billing currency (ISO 4217 code)
    pub currency: Currency,
    /// Branch timezone (IANA name), used for "today"
    pub timezone: Timezone,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/mortuary".to_string(),
            db_max_connections: 10,
            log_level: "info".to_string(),
            currency: Currency::GHS,
            timezone: Timezone::default(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Rejects settings the server cannot run with
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(CoreError::configuration("jwt_secret", "must not be empty"));
        }
        if self.jwt_expiration_secs == 0 {
            return Err(CoreError::configuration("jwt_expiration_secs", "must be positive"));
        }
        if self.db_max_connections == 0 {
            return Err(CoreError::configuration("db_max_connections", "must be positive"));
        }
        if self.database_url.trim().is_empty() {
            return Err(CoreError::configuration("database_url", "must not be empty"));
        }
        Ok(())
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn billing(&self) -> BillingSettings {
        BillingSettings {
            currency: self.currency,
            timezone: self.timezone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.currency, Currency::GHS);
        assert_eq!(config.timezone.to_string(), "Africa/Accra");
    }

    #[test]
    fn test_validate_rejects_blank_secret() {
        let config = ApiConfig {
            jwt_secret: "  ".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CoreError::Configuration { setting, .. }) if setting == "jwt_secret"
        ));
        assert!(ApiConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_source_keeps_defaults() {
        let config: ApiConfig = config::Config::builder()
            .set_override("port", 9090)
            .unwrap()
            .set_override("currency", "NGN")
            .unwrap()
            .set_override("timezone", "Africa/Lagos")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.billing().currency, Currency::NGN);
        assert_eq!(config.billing().timezone.to_string(), "Africa/Lagos");
    }
}
