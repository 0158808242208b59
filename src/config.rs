use config::{ConfigError, Environment, Source};
use serde::Deserialize;
use std::time::Duration;

/// What the data fetcher does when one CRM collection cannot be retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchFailureMode {
    /// Leave the collection out of the result and log a warning.
    Skip,
    /// Abort the whole fetch with an upstream error.
    Fail,
}

/// Process configuration, resolved once at startup from the environment
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,

    pub enable_redis: bool,
    pub redis_url: String,

    pub hubspot_client_id: String,
    pub hubspot_client_secret: String,
    pub hubspot_redirect_uri: String,
    pub hubspot_authorize_url: String,
    pub hubspot_token_url: String,
    pub hubspot_api_base_url: String,
    pub hubspot_scopes: String,
    pub hubspot_fetch_failure_mode: FetchFailureMode,

    pub oauth_cache_ttl_seconds: u64,
    pub http_timeout_seconds: u64,
}

impl Config {
    /// Load `.env` (if any) and read the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Ok(Self::load(Environment::default())?)
    }

    pub(crate) fn load<S>(source: S) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let config: Config = config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8000)?
            .set_default("enable_redis", false)?
            .set_default("redis_url", "redis://localhost:6379")?
            .set_default("hubspot_client_id", "")?
            .set_default("hubspot_client_secret", "")?
            .set_default(
                "hubspot_redirect_uri",
                "http://localhost:8000/integrations/hubspot/oauth2callback",
            )?
            .set_default(
                "hubspot_authorize_url",
                "https://app.hubspot.com/oauth/authorize",
            )?
            .set_default("hubspot_token_url", "https://api.hubapi.com/oauth/v1/token")?
            .set_default("hubspot_api_base_url", "https://api.hubapi.com")?
            .set_default(
                "hubspot_scopes",
                "crm.objects.contacts.read crm.objects.companies.read",
            )?
            .set_default("hubspot_fetch_failure_mode", "skip")?
            .set_default("oauth_cache_ttl_seconds", 600)?
            .set_default("http_timeout_seconds", 30)?
            .add_source(source)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.hubspot_client_id.trim().is_empty() {
            return Err(ConfigError::Message(
                "HUBSPOT_CLIENT_ID must be set".to_string(),
            ));
        }
        if self.hubspot_client_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "HUBSPOT_CLIENT_SECRET must be set".to_string(),
            ));
        }
        if self.oauth_cache_ttl_seconds == 0 {
            return Err(ConfigError::Message(
                "OAUTH_CACHE_TTL_SECONDS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn oauth_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.oauth_cache_ttl_seconds)
    }

    pub fn scopes(&self) -> Vec<String> {
        self.hubspot_scopes
            .split_whitespace()
            .map(|s| s.to_string())
            .collect()
    }
}
