use serde::{Deserialize, Serialize};

/// State bound to one authorization redirect, echoed back on the callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthStateRecord {
    pub state: String,
    pub user_id: String,
    pub org_id: String,
}

/// Query parameters HubSpot appends to the redirect URI
#[derive(Debug, Default, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Form body identifying whose flow is being driven
#[derive(Debug, Deserialize)]
pub struct IntegrationUserForm {
    pub user_id: String,
    pub org_id: String,
}

/// Form body carrying a credential blob returned by the credentials endpoint
#[derive(Debug, Deserialize)]
pub struct LoadItemsForm {
    pub credentials: String,
}
