//! Environment configuration for different deployment stages

use std::env;
use std::num::ParseIntError;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};
use tracing::Level;

/// Default upper bound for a single uploaded image: 15 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;

const DEFAULT_PORT: u16 = 5000;

/// Limits applied to the upload endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadConfig {
    /// Largest accepted image payload in bytes
    pub max_upload_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development,
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Port the HTTP server listens on (`PORT`, defaults to 5000)
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is set but is not a valid port number
    pub fn port(&self) -> Result<u16, ParseIntError> {
        env::var("PORT").map_or(Ok(DEFAULT_PORT), |p| p.trim().parse())
    }

    /// Returns the images table name for the environment
    ///
    /// # Panics
    ///
    /// Panics if the `IMAGES_TABLE_NAME` environment variable is not set in production or staging
    #[must_use]
    pub fn images_table_name(&self) -> String {
        match self {
            Self::Production | Self::Staging => env::var("IMAGES_TABLE_NAME")
                .expect("IMAGES_TABLE_NAME environment variable is not set"),
            Self::Development => {
                env::var("IMAGES_TABLE_NAME").unwrap_or_else(|_| "images".to_string())
            }
        }
    }

    /// Returns the scans table name for the environment
    ///
    /// # Panics
    ///
    /// Panics if the `SCANS_TABLE_NAME` environment variable is not set in production or staging
    #[must_use]
    pub fn scans_table_name(&self) -> String {
        match self {
            Self::Production | Self::Staging => env::var("SCANS_TABLE_NAME")
                .expect("SCANS_TABLE_NAME environment variable is not set"),
            Self::Development => {
                env::var("SCANS_TABLE_NAME").unwrap_or_else(|_| "scans".to_string())
            }
        }
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development | Self::Staging)
    }

    /// Returns the document store endpoint to use instead of the regular AWS one
    ///
    /// `DATABASE_URL` wins everywhere; development falls back to `LocalStack`.
    #[must_use]
    pub fn database_url(&self) -> Option<String> {
        let configured = env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        match self {
            Self::Production | Self::Staging => configured,
            Self::Development => {
                Some(configured.unwrap_or_else(|| "http://localhost:4566".to_string()))
            }
        }
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut config_builder = aws_config::load_defaults(BehaviorVersion::latest())
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.database_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }

    /// Upload limits (`MAX_UPLOAD_BYTES`, defaults to 15 MiB)
    ///
    /// Unparsable or zero values fall back to the default.
    #[must_use]
    pub fn upload_config(&self) -> UploadConfig {
        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
            .filter(|&val| val > 0)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        UploadConfig { max_upload_bytes }
    }

    /// Maximum time a single request may take end to end
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    /// Default log level when `RUST_LOG` is not set
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development => Level::DEBUG,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_environment_from_env() {
        // Test development (default)
        env::remove_var("APP_ENV");
        assert_eq!(Environment::from_env(), Environment::Development);

        env::set_var("APP_ENV", " Staging ");
        assert_eq!(Environment::from_env(), Environment::Staging);

        env::set_var("APP_ENV", "production");
        assert_eq!(Environment::from_env(), Environment::Production);

        env::remove_var("APP_ENV");
    }

    #[test]
    #[serial]
    #[should_panic(expected = "Invalid environment: invalid")]
    fn test_invalid_environment() {
        env::set_var("APP_ENV", "invalid");
        let result = std::panic::catch_unwind(Environment::from_env);
        env::remove_var("APP_ENV");
        if let Err(panic) = result {
            std::panic::resume_unwind(panic);
        }
    }

    #[test]
    #[serial]
    fn test_port() {
        env::remove_var("PORT");
        assert_eq!(Environment::Development.port().unwrap(), 5000);

        env::set_var("PORT", "8080");
        assert_eq!(Environment::Production.port().unwrap(), 8080);

        env::set_var("PORT", "not-a-port");
        assert!(Environment::Development.port().is_err());

        env::remove_var("PORT");
    }

    #[test]
    #[serial]
    fn test_upload_config() {
        env::remove_var("MAX_UPLOAD_BYTES");
        assert_eq!(
            Environment::Development.upload_config().max_upload_bytes,
            15_728_640
        );

        env::set_var("MAX_UPLOAD_BYTES", "1024");
        assert_eq!(Environment::Staging.upload_config().max_upload_bytes, 1024);

        // Invalid values fall back to the default
        env::set_var("MAX_UPLOAD_BYTES", "lots");
        assert_eq!(
            Environment::Production.upload_config(),
            UploadConfig::default()
        );
        env::set_var("MAX_UPLOAD_BYTES", "0");
        assert_eq!(
            Environment::Production.upload_config(),
            UploadConfig::default()
        );

        env::remove_var("MAX_UPLOAD_BYTES");
    }

    #[test]
    #[serial]
    fn test_database_url() {
        env::remove_var("DATABASE_URL");
        assert_eq!(
            Environment::Development.database_url().as_deref(),
            Some("http://localhost:4566")
        );
        assert_eq!(Environment::Production.database_url(), None);

        env::set_var("DATABASE_URL", "http://dynamodb.internal:8000");
        assert_eq!(
            Environment::Production.database_url().as_deref(),
            Some("http://dynamodb.internal:8000")
        );
        assert_eq!(
            Environment::Development.database_url().as_deref(),
            Some("http://dynamodb.internal:8000")
        );

        env::remove_var("DATABASE_URL");
    }

    #[test]
    #[serial]
    fn test_images_table_name_defaults_in_development() {
        env::remove_var("IMAGES_TABLE_NAME");
        assert_eq!(Environment::Development.images_table_name(), "images");

        env::set_var("IMAGES_TABLE_NAME", "scans");
        assert_eq!(Environment::Staging.images_table_name(), "scans");

        env::remove_var("IMAGES_TABLE_NAME");
    }

    #[test]
    #[serial]
    fn test_scans_table_name_defaults_in_development() {
        env::remove_var("SCANS_TABLE_NAME");
        assert_eq!(Environment::Development.scans_table_name(), "scans");

        env::set_var("SCANS_TABLE_NAME", "mycoscan-scans");
        assert_eq!(Environment::Production.scans_table_name(), "mycoscan-scans");

        env::remove_var("SCANS_TABLE_NAME");
    }

    #[test]
    fn test_show_api_docs() {
        assert!(Environment::Development.show_api_docs());
        assert!(Environment::Staging.show_api_docs());
        assert!(!Environment::Production.show_api_docs());
    }
}
