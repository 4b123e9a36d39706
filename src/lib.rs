pub mod ai_service;
pub mod app_config;
pub mod error;
pub mod image_service;
pub mod models;
pub mod routes;
pub mod schemas;
pub mod store;

pub use ai_service::AIService;
pub use error::ApiError;
pub use image_service::ImageService;
pub use models::{Itinerary, Message, MessageRole};
pub use store::TravelStore;

use anyhow::Result;

/// Connect to a Turso database using HTTP API
pub async fn connect_turso(database_url: &str, auth_token: &str) -> Result<TravelStore> {
    let store = TravelStore::new(database_url.to_string(), auth_token.to_string());
    store.initialize().await?;
    Ok(store)
}
