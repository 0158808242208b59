/// HubSpot integration routes
/// Authorization, OAuth callback, credential hand-off and item loading
use axum::{
    extract::{Query, State},
    response::{Html, Json},
    routing::{get, post},
    Form, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::AppResult;
use crate::models::{IntegrationItem, IntegrationUserForm, LoadItemsForm, OAuthCallbackQuery};
use crate::AppState;

/// Rendered in the authorization popup; closing it tells the opener the flow finished
pub const CLOSE_WINDOW_HTML: &str = r#"
<html>
    <script>
        window.close();
    </script>
</html>
"#;

pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/authorize", post(authorize))
        .route("/oauth2callback", get(oauth2callback))
        .route("/credentials", post(credentials))
        .route("/load", post(load_items))
}

async fn authorize(
    State(state): State<Arc<AppState>>,
    Form(form): Form<IntegrationUserForm>,
) -> AppResult<Json<String>> {
    let url = state
        .hubspot_oauth
        .initiate_login(&form.user_id, &form.org_id)
        .await?;
    Ok(Json(url))
}

async fn oauth2callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OAuthCallbackQuery>,
) -> AppResult<Html<&'static str>> {
    debug!("HubSpot OAuth callback received");

    state
        .hubspot_oauth
        .handle_callback(&query)
        .await
        .map_err(|e| {
            error!("HubSpot OAuth callback failed: {}", e);
            e
        })?;

    Ok(Html(CLOSE_WINDOW_HTML))
}

async fn credentials(
    State(state): State<Arc<AppState>>,
    Form(form): Form<IntegrationUserForm>,
) -> AppResult<Json<Value>> {
    let credentials = state
        .hubspot_oauth
        .take_credentials(&form.user_id, &form.org_id)
        .await?;
    Ok(Json(credentials))
}

async fn load_items(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoadItemsForm>,
) -> AppResult<Json<Vec<IntegrationItem>>> {
    let items = state.hubspot_items.get_items(&form.credentials).await?;
    Ok(Json(items))
}
