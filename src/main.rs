mod cache;
mod config;
mod error;
mod models;
mod routes;
mod services;
#[cfg(test)]
mod test_utils;

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::cache::{KeyValueStore, MemoryStore, RedisStore};
use crate::config::Config;
use crate::services::oauth_provider::create_hubspot_provider;
use crate::services::{HubSpotItemsService, OAuthManager};

#[derive(Clone)]
pub struct AppState {
    // Short-lived OAuth state and credentials
    pub store: Arc<dyn KeyValueStore>,
    pub hubspot_oauth: Arc<OAuthManager>,
    pub hubspot_items: Arc<HubSpotItemsService>,
}

/// Wire services over a store and a shared HTTP client
pub fn build_state(
    config: Config,
    store: Arc<dyn KeyValueStore>,
    http_client: reqwest::Client,
) -> AppState {
    let provider = create_hubspot_provider(&config, http_client.clone());
    let hubspot_oauth = OAuthManager::new(
        Arc::new(provider),
        store.clone(),
        config.oauth_cache_ttl(),
    );
    let hubspot_items = HubSpotItemsService::new(
        http_client,
        config.hubspot_api_base_url.clone(),
        config.hubspot_fetch_failure_mode,
    );

    AppState {
        store,
        hubspot_oauth: Arc::new(hubspot_oauth),
        hubspot_items: Arc::new(hubspot_items),
    }
}

pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/health", routes::health::create_routes())
        .nest("/integrations/hubspot", routes::hubspot::create_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive().max_age(Duration::from_secs(3600))),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; RUST_LOG accepts directives like `hubspot_integration=debug`
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting HubSpot integration service");

    // Load configuration from environment
    let config = Config::from_env()?;
    info!("Configuration loaded from environment");

    let store: Arc<dyn KeyValueStore> = if config.enable_redis {
        let store = RedisStore::new(&config.redis_url)?;
        info!("Redis cache configured");
        Arc::new(store)
    } else {
        info!("Redis disabled, using in-memory cache");
        Arc::new(MemoryStore::new())
    };

    let http_client = reqwest::Client::builder()
        .pool_max_idle_per_host(10)
        .tcp_nodelay(true)
        .timeout(Duration::from_secs(config.http_timeout_seconds))
        .build()?;
    info!("HTTP client initialized");

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    let state = Arc::new(build_state(config, store, http_client));
    let app = create_app(state);

    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
