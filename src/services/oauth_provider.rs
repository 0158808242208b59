/// OAuth Provider
/// Builds authorization URLs and performs the server-to-server code exchange
use crate::config::Config;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, info};
use url::Url;

/// OAuth provider configuration
#[derive(Debug, Clone)]
pub struct OAuthProviderConfig {
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
    pub redirect_uri: String,
}

/// OAuth provider trait
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Get provider name
    fn name(&self) -> &str;

    /// Authorization URL carrying the already-encoded `state` parameter
    fn authorization_url(&self, state: &str) -> AppResult<String>;

    /// Exchange an authorization code for the provider's raw token response
    async fn exchange_code(&self, code: &str) -> AppResult<Value>;
}

/// Authorization-code provider speaking plain form-encoded OAuth2
pub struct BaseOAuthProvider {
    config: OAuthProviderConfig,
    client: Client,
}

impl BaseOAuthProvider {
    pub fn new(config: OAuthProviderConfig, client: Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl OAuthProvider for BaseOAuthProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn authorization_url(&self, state: &str) -> AppResult<String> {
        let scope_str = self.config.scopes.join(" ");
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("state", state),
            ("scope", scope_str.as_str()),
        ];

        let url = Url::parse_with_params(&self.config.authorize_url, &params)
            .map_err(|e| AppError::Internal(format!("Failed to build auth URL: {}", e)))?;

        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> AppResult<Value> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code),
        ];

        debug!("Exchanging code for token with {}", self.config.name);

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!("Token exchange failed: {}", e);
                AppError::ExternalServiceError(format!("Token exchange failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Token exchange failed: {} - {}", status, error_text);
            return Err(AppError::ExternalServiceError(format!(
                "Token exchange failed: {} - {}",
                status, error_text
            )));
        }

        let token_response: Value = response.json().await.map_err(|e| {
            error!("Failed to parse token response: {}", e);
            AppError::ExternalServiceError(format!("Failed to parse token response: {}", e))
        })?;

        if !token_response
            .get("access_token")
            .is_some_and(|token| token.is_string())
        {
            error!("Token response from {} has no access_token", self.config.name);
            return Err(AppError::ExternalServiceError(
                "Token response did not include an access_token".to_string(),
            ));
        }

        debug!("Token exchange successful for {}", self.config.name);
        Ok(token_response)
    }
}

/// Create HubSpot OAuth provider
pub fn create_hubspot_provider(config: &Config, client: Client) -> BaseOAuthProvider {
    let provider_config = OAuthProviderConfig {
        name: "hubspot".to_string(),
        client_id: config.hubspot_client_id.clone(),
        client_secret: config.hubspot_client_secret.clone(),
        authorize_url: config.hubspot_authorize_url.clone(),
        token_url: config.hubspot_token_url.clone(),
        scopes: config.scopes(),
        redirect_uri: config.hubspot_redirect_uri.clone(),
    };

    info!("HubSpot OAuth provider configured");
    BaseOAuthProvider::new(provider_config, client)
}
