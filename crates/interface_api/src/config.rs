//! API configuration

use std::time::Duration;

use serde::Deserialize;

use core_kernel::CoreError;
use domain_claims::attachment::{DEFAULT_PUBLIC_PREFIX, MAX_ATTACHMENT_BYTES};
use domain_claims::AttachmentPolicy;
use infra_db::{DatabaseConfig, DEFAULT_DATABASE_URL};

/// Room left in a request body for the multipart envelope and text fields
const FORM_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// API configuration
///
/// Loaded from `API_*` environment variables; anything unset keeps its
/// default.
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
    /// Upper bound on pooled database connections
    pub db_max_connections: u32,
    /// Connections kept open while idle
    pub db_min_connections: u32,
    /// Seconds a request waits for a pooled connection
    pub db_connect_timeout_secs: u64,
    /// Log level
    pub log_level: String,
    /// Directory uploaded attachments are written to
    pub upload_root: String,
    /// URL prefix attachments are served under
    pub public_prefix: String,
    /// Largest accepted attachment in bytes
    pub max_upload_bytes: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: 10,
            db_min_connections: 2,
            db_connect_timeout_secs: 30,
            log_level: "info".to_string(),
            upload_root: "uploads".to_string(),
            public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
            max_upload_bytes: MAX_ATTACHMENT_BYTES,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Rejects settings the server cannot run with
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(CoreError::configuration("jwt_secret must not be empty"));
        }
        if self.db_max_connections == 0 || self.db_min_connections > self.db_max_connections {
            return Err(CoreError::configuration(format!(
                "db_min_connections ({}) must not exceed a positive db_max_connections ({})",
                self.db_min_connections, self.db_max_connections
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(CoreError::configuration("max_upload_bytes must be positive"));
        }
        if !self.public_prefix.starts_with('/') || self.public_prefix.trim_end_matches('/').is_empty() {
            return Err(CoreError::configuration(format!(
                "public_prefix must be an absolute path below the root, got '{}'",
                self.public_prefix
            )));
        }
        Ok(())
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Pool settings for the claim store
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.database_url)
            .max_connections(self.db_max_connections)
            .min_connections(self.db_min_connections)
            .connect_timeout(Duration::from_secs(self.db_connect_timeout_secs))
    }

    /// Upload rules derived from this configuration
    pub fn attachment_policy(&self) -> AttachmentPolicy {
        AttachmentPolicy::default()
            .max_bytes(self.max_upload_bytes)
            .public_prefix(self.public_prefix.clone())
    }

    /// Route prefix attachments are served under, without a trailing slash
    pub fn public_route(&self) -> &str {
        self.public_prefix.trim_end_matches('/')
    }

    /// Request body limit for claim forms
    ///
    /// Twice the attachment limit, so a moderately oversized file still
    /// reaches the attachment validator and gets a field-level error.
    pub fn body_limit(&self) -> usize {
        (self.max_upload_bytes.saturating_mul(2) + FORM_OVERHEAD_BYTES) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ApiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.attachment_policy(), AttachmentPolicy::default());
    }

    #[test]
    fn test_rejects_empty_secret() {
        let config = ApiConfig {
            jwt_secret: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Configuration(_))));
    }

    #[test]
    fn test_database_config_carries_pool_settings() {
        let config = ApiConfig {
            database_url: "postgres://db/claims".to_string(),
            db_max_connections: 25,
            db_min_connections: 5,
            db_connect_timeout_secs: 4,
            ..Default::default()
        };

        let db = config.database_config();
        assert_eq!(db.url, "postgres://db/claims");
        assert_eq!(db.max_connections, 25);
        assert_eq!(db.min_connections, 5);
        assert_eq!(db.connect_timeout, Duration::from_secs(4));
    }

    #[test]
    fn test_default_pool_matches_database_defaults() {
        assert_eq!(ApiConfig::default().database_config(), DatabaseConfig::default());
    }

    #[test]
    fn test_rejects_min_connections_above_max() {
        let config = ApiConfig {
            db_max_connections: 2,
            db_min_connections: 3,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Configuration(_))));
    }

    #[test]
    fn test_rejects_root_public_prefix() {
        let config = ApiConfig {
            public_prefix: "/".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_body_limit_leaves_room_for_oversized_files() {
        let config = ApiConfig::default();
        assert!(config.body_limit() as u64 > config.max_upload_bytes + 1);
    }
}
