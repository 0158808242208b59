pub mod hubspot_items;
pub mod oauth_manager;
pub mod oauth_provider;

pub use hubspot_items::HubSpotItemsService;
pub use oauth_manager::OAuthManager;
