//! Shared fixtures for router-level tests
use crate::cache::MemoryStore;
use crate::config::{Config, FetchFailureMode};
use crate::{build_state, create_app, AppState};
use axum::{body::Body, http::Response, Router};
use http_body_util::BodyExt;
use std::sync::Arc;
use wiremock::MockServer;

pub struct TestApp {
    /// Stands in for both the HubSpot token endpoint and the CRM API
    pub server: MockServer,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn router(&self) -> Router {
        create_app(self.state.clone())
    }
}

pub fn test_config(server_uri: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        enable_redis: false,
        redis_url: String::new(),
        hubspot_client_id: "test_client_id".to_string(),
        hubspot_client_secret: "test_client_secret".to_string(),
        hubspot_redirect_uri: "http://localhost:8000/integrations/hubspot/oauth2callback"
            .to_string(),
        hubspot_authorize_url: format!("{}/oauth/authorize", server_uri),
        hubspot_token_url: format!("{}/oauth/v1/token", server_uri),
        hubspot_api_base_url: server_uri.to_string(),
        hubspot_scopes: "crm.objects.contacts.read crm.objects.companies.read".to_string(),
        hubspot_fetch_failure_mode: FetchFailureMode::Skip,
        oauth_cache_ttl_seconds: 600,
        http_timeout_seconds: 5,
    }
}

pub async fn test_app() -> TestApp {
    let server = MockServer::start().await;
    let config = test_config(&server.uri());
    let state = build_state(config, Arc::new(MemoryStore::new()), reqwest::Client::new());
    TestApp {
        server,
        state: Arc::new(state),
    }
}

pub async fn read_body(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}
