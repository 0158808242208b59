/// OAuth Manager
/// Drives the authorization-code handshake: state issue, callback validation,
/// code exchange and single-use credential hand-off
use super::oauth_provider::OAuthProvider;
use crate::cache::{credentials_key, state_key, KeyValueStore};
use crate::error::{AppError, AppResult};
use crate::models::{OAuthCallbackQuery, OAuthStateRecord};
use base64::{
    alphabet,
    engine::{general_purpose::GeneralPurposeConfig, DecodePaddingMode, GeneralPurpose},
    Engine as _,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// URL-safe base64 that pads on encode and accepts either form on decode
const STATE_ENCODING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const STATE_MISMATCH: &str = "State does not match.";

/// OAuth Manager - one per integration provider
pub struct OAuthManager {
    provider: Arc<dyn OAuthProvider>,
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl OAuthManager {
    pub fn new(
        provider: Arc<dyn OAuthProvider>,
        store: Arc<dyn KeyValueStore>,
        ttl: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            ttl,
        }
    }

    /// Generate state parameter
    fn generate_state() -> String {
        use rand::Rng;
        let mut rng = rand::rng();
        let random_bytes: Vec<u8> = (0..32).map(|_| rng.random()).collect();
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
    }

    fn encode_state(record: &OAuthStateRecord) -> AppResult<String> {
        let json = serde_json::to_vec(record)?;
        Ok(STATE_ENCODING.encode(json))
    }

    fn decode_state(encoded: &str) -> AppResult<OAuthStateRecord> {
        let bytes = STATE_ENCODING
            .decode(encoded.trim())
            .map_err(|_| AppError::BadRequest("Invalid state parameter.".to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| AppError::BadRequest("Invalid state parameter.".to_string()))
    }

    /// Issue a fresh state for `(org_id, user_id)` and return the provider's
    /// authorization URL. A previous pending state for the same pair is replaced.
    pub async fn initiate_login(&self, user_id: &str, org_id: &str) -> AppResult<String> {
        if user_id.trim().is_empty() || org_id.trim().is_empty() {
            return Err(AppError::BadRequest(
                "user_id and org_id are required.".to_string(),
            ));
        }

        let record = OAuthStateRecord {
            state: Self::generate_state(),
            user_id: user_id.to_string(),
            org_id: org_id.to_string(),
        };
        let encoded_state = Self::encode_state(&record)?;

        self.store
            .put(
                &state_key(org_id, user_id),
                &serde_json::to_string(&record)?,
                self.ttl,
            )
            .await?;

        let auth_url = self.provider.authorization_url(&encoded_state)?;

        info!(
            "OAuth login initiated for provider {} (org: {}, user: {})",
            self.provider.name(),
            org_id,
            user_id
        );
        Ok(auth_url)
    }

    /// Handle the provider redirect. On success the token response is cached
    /// for the credential accessor; the pending state is always consumed once
    /// it has been matched.
    pub async fn handle_callback(&self, query: &OAuthCallbackQuery) -> AppResult<()> {
        if let Some(error) = query.error.as_ref().filter(|e| !e.is_empty()) {
            let detail = query
                .error_description
                .clone()
                .unwrap_or_else(|| error.clone());
            warn!(
                "{} authorization declined: {} ({})",
                self.provider.name(),
                error,
                detail
            );
            return Err(AppError::BadRequest(detail));
        }

        let encoded_state = query
            .state
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("Missing state parameter.".to_string()))?;
        let code = query
            .code
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("Missing authorization code.".to_string()))?;

        let returned = Self::decode_state(encoded_state)?;
        let key = state_key(&returned.org_id, &returned.user_id);

        let saved_state = match self.store.get(&key).await? {
            Some(saved) => serde_json::from_str::<OAuthStateRecord>(&saved).ok(),
            None => None,
        };

        // Absent and mismatched records are rejected identically.
        if !saved_state.is_some_and(|saved| saved.state == returned.state) {
            warn!(
                "OAuth state rejected for org {} user {}",
                returned.org_id, returned.user_id
            );
            return Err(AppError::BadRequest(STATE_MISMATCH.to_string()));
        }

        debug!(
            "State validated for org {} user {}, exchanging code",
            returned.org_id, returned.user_id
        );

        let (token_response, deleted) =
            tokio::join!(self.provider.exchange_code(code), self.store.delete(&key));
        deleted?;
        let token_response = token_response?;

        self.store
            .put(
                &credentials_key(&returned.org_id, &returned.user_id),
                &serde_json::to_string(&token_response)?,
                self.ttl,
            )
            .await?;

        info!(
            "OAuth callback completed for provider {} (org: {}, user: {})",
            self.provider.name(),
            returned.org_id,
            returned.user_id
        );
        Ok(())
    }

    /// Hand out the cached credentials for `(org_id, user_id)` exactly once
    pub async fn take_credentials(&self, user_id: &str, org_id: &str) -> AppResult<Value> {
        let credentials = self
            .store
            .take(&credentials_key(org_id, user_id))
            .await?
            .ok_or_else(|| AppError::BadRequest("No credentials found.".to_string()))?;

        let credentials: Value = serde_json::from_str(&credentials)?;
        debug!("Credentials consumed for org {} user {}", org_id, user_id);
        Ok(credentials)
    }
}
