pub mod integration_item;
pub mod oauth_state;

pub use integration_item::IntegrationItem;
pub use oauth_state::{IntegrationUserForm, LoadItemsForm, OAuthCallbackQuery, OAuthStateRecord};
