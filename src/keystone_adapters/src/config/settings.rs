use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use keystone_application::DispatcherSettings;
use keystone_core::{TokenPolicy, Topic};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::constants::{DEFAULT_CONFIGURATION_DIR, DEFAULT_ENVIRONMENT, env};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeystoneSettings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub tokens: TokenSettings,
    pub outbox: OutboxSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Public origin that confirmation links point at.
    pub base_url: String,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub max_transaction_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenSettings {
    pub signing_key: Secret<String>,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutboxSettings {
    pub topics: Vec<String>,
    pub batch_size: u32,
    pub poll_interval_ms: u64,
    /// Webhook receiving outbox batches. Without one, batches stay in process.
    pub webhook_url: Option<String>,
    pub webhook_timeout_ms: u64,
}

impl KeystoneSettings {
    /// Load `base.json` and `<APP_ENVIRONMENT>.json` from the configuration
    /// directory, then apply `KEYSTONE__*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let directory = std::env::var(env::CONFIGURATION_DIR_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIGURATION_DIR));
        let environment = std::env::var(env::APP_ENVIRONMENT_ENV_VAR)
            .unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string());

        Self::load_from(&directory, &environment)
    }

    pub fn load_from(directory: &Path, environment: &str) -> Result<Self, ConfigError> {
        let settings: KeystoneSettings = config::Config::builder()
            .add_source(config::File::from(directory.join("base")).required(true))
            .add_source(config::File::from(directory.join(environment)).required(false))
            .add_source(
                config::Environment::with_prefix(env::ENV_PREFIX)
                    .prefix_separator(env::ENV_SEPARATOR)
                    .separator(env::ENV_SEPARATOR)
                    .list_separator(",")
                    .with_list_parse_key("application.allowed_origins")
                    .with_list_parse_key("outbox.topics")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigError::Load(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tokens.signing_key.expose_secret().is_empty() {
            return Err(ConfigError::Invalid("tokens.signing_key is empty".to_string()));
        }
        if self.tokens.access_ttl_seconds <= 0 || self.tokens.refresh_ttl_seconds <= 0 {
            return Err(ConfigError::Invalid("token TTLs must be positive".to_string()));
        }
        if self.outbox.batch_size == 0 {
            return Err(ConfigError::Invalid("outbox.batch_size must be positive".to_string()));
        }
        if self.database.max_transaction_attempts == 0 {
            return Err(ConfigError::Invalid(
                "database.max_transaction_attempts must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn address(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.application.host, self.application.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("listen address: {e}")))
    }

    pub fn token_policy(&self) -> TokenPolicy {
        TokenPolicy {
            access_ttl: chrono::Duration::seconds(self.tokens.access_ttl_seconds),
            refresh_ttl: chrono::Duration::seconds(self.tokens.refresh_ttl_seconds),
        }
    }

    pub fn dispatcher_settings(&self) -> DispatcherSettings {
        DispatcherSettings {
            topics: self.outbox.topics.iter().cloned().map(Topic::new).collect(),
            batch_size: self.outbox.batch_size,
            interval: Duration::from_millis(self.outbox.poll_interval_ms),
        }
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_millis(self.outbox.webhook_timeout_ms)
    }
}
