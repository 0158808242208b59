pub mod health;
pub mod hubspot;
