use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

pub const MIN_ITINERARY_DAYS: u32 = 1;
pub const MAX_ITINERARY_DAYS: u32 = 14;

/// Parse a request body against an endpoint's input shape. Any structural
/// mismatch (missing field, wrong type) is a validation failure before any
/// side effect occurs.
pub fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|_| ApiError::validation("Invalid input"))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

impl ChatRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.message.trim().is_empty() {
            return Err(ApiError::validation("Message is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct InsertItinerary {
    pub destination: String,
    pub content: Value,
}

impl InsertItinerary {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.destination.trim().is_empty() {
            return Err(ApiError::validation("Invalid input"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateItineraryRequest {
    pub city: String,
    pub days: u32,
    pub preferences: Option<String>,
}

impl GenerateItineraryRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.city.trim().is_empty() {
            return Err(ApiError::validation("City is required"));
        }
        if !(MIN_ITINERARY_DAYS..=MAX_ITINERARY_DAYS).contains(&self.days) {
            return Err(ApiError::validation("Days must be between 1 and 14"));
        }
        Ok(())
    }
}
