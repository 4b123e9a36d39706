use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures_util::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::ai_service::AIService;
use crate::error::ApiError;
use crate::image_service::ImageService;
use crate::models::{Itinerary, Message, MessageRole};
use crate::schemas::{self, ChatRequest, GenerateItineraryRequest, InsertItinerary};
use crate::store::TravelStore;

const TRAVEL_SEARCH_SYSTEM_PROMPT: &str = "You are a travel assistant. Return a JSON object with: summary (string), country (string), coordinates ({lat, lon}), weather (short description of typical weather), and attractions (array of {name, description, rating (number 1-5)}). Do not use unknown as country.";

const CHAT_SYSTEM_PROMPT: &str = "You are a helpful travel assistant. Help users plan their trips and answer questions about destinations.";

const ITINERARY_SYSTEM_PROMPT: &str = "You are a travel assistant that produces day-by-day trip itineraries as JSON.";

/// Attraction image enrichment is capped to bound latency and external
/// call volume per search.
const MAX_ENRICHED_ATTRACTIONS: usize = 3;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TravelStore>,
    pub ai: Arc<AIService>,
    pub images: Arc<ImageService>,
}

async fn health_check() -> impl IntoResponse {
    "Travel API is running"
}

// --- Travel search ---

#[derive(Debug, Deserialize)]
struct TravelSearchParams {
    city: Option<String>,
}

/// Fan out image lookups over the first few attractions; each lookup is
/// independent and best-effort.
async fn enrich_attractions(images: &ImageService, city: &str, attractions: Vec<Value>) -> Vec<Value> {
    let lookups = attractions
        .into_iter()
        .take(MAX_ENRICHED_ATTRACTIONS)
        .map(|mut attraction| async move {
            let name = attraction
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let image = images.get_image(&format!("{} {}", city, name)).await;

            if let Some(obj) = attraction.as_object_mut() {
                obj.insert(
                    "image".to_string(),
                    image.map(Value::String).unwrap_or(Value::Null),
                );
            }
            attraction
        });

    join_all(lookups).await
}

async fn travel_search(
    State(state): State<AppState>,
    Query(params): Query<TravelSearchParams>,
) -> Result<Json<Value>, ApiError> {
    let city = params
        .city
        .as_deref()
        .map(str::trim)
        .filter(|city| !city.is_empty())
        .ok_or_else(|| ApiError::validation("City is required"))?;

    let city_image = state.images.get_image(city).await;

    let mut data = state
        .ai
        .complete_json(TRAVEL_SEARCH_SYSTEM_PROMPT, &format!("Tell me about {}", city))
        .await
        .map_err(|e| {
            error!("Travel search completion failed: {:#}", e);
            ApiError::upstream("Failed to fetch travel info")
        })?;

    // Only the fields the contract requires are checked; everything else
    // passes through opaquely.
    let summary_ok = data.get("summary").is_some_and(Value::is_string);
    let coordinates_ok = data.get("coordinates").is_some_and(|c| {
        c.get("lat").is_some_and(Value::is_number) && c.get("lon").is_some_and(Value::is_number)
    });
    if !summary_ok || !coordinates_ok {
        error!("Travel search completion missing required fields");
        return Err(ApiError::upstream("Failed to fetch travel info"));
    }

    let attractions = data
        .get("attractions")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let enriched = enrich_attractions(&state.images, city, attractions).await;

    if let Some(obj) = data.as_object_mut() {
        obj.insert(
            "cityImage".to_string(),
            city_image.map(Value::String).unwrap_or(Value::Null),
        );
        obj.insert("attractions".to_string(), Value::Array(enriched));
        obj.entry("weather").or_insert(Value::Null);
    }

    Ok(Json(data))
}

// --- Chat ---

async fn chat_send(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let request: ChatRequest = schemas::parse_body(body)?;
    request.validate()?;

    state
        .store
        .create_message(MessageRole::User, &request.message)
        .await
        .map_err(|e| {
            error!("Failed to persist user message: {:#}", e);
            ApiError::persistence("Chat failed")
        })?;

    // The user message stays behind if the completion fails; a turn with no
    // reply is an accepted, observable partial state.
    let reply = state
        .ai
        .complete_text(CHAT_SYSTEM_PROMPT, &request.message)
        .await
        .map_err(|e| {
            error!("Chat completion failed: {:#}", e);
            ApiError::upstream("Chat failed")
        })?;

    let message = state
        .store
        .create_message(MessageRole::Assistant, &reply)
        .await
        .map_err(|e| {
            error!("Failed to persist assistant message: {:#}", e);
            ApiError::persistence("Chat failed")
        })?;

    Ok(Json(json!({
        "role": message.role,
        "content": message.content,
    })))
}

async fn chat_history(State(state): State<AppState>) -> Result<Json<Vec<Message>>, ApiError> {
    state.store.list_messages().await.map(Json).map_err(|e| {
        error!("Failed to load chat history: {:#}", e);
        ApiError::persistence("Failed to load chat history")
    })
}

// --- Itineraries ---

async fn list_itineraries(
    State(state): State<AppState>,
) -> Result<Json<Vec<Itinerary>>, ApiError> {
    state.store.list_itineraries().await.map(Json).map_err(|e| {
        error!("Failed to list itineraries: {:#}", e);
        ApiError::persistence("Failed to load itineraries")
    })
}

async fn create_itinerary(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let request: InsertItinerary = schemas::parse_body(body)?;
    request.validate()?;

    let item = state
        .store
        .create_itinerary(&request.destination, &request.content)
        .await
        .map_err(|e| {
            error!("Failed to create itinerary: {:#}", e);
            ApiError::persistence("Failed to create itinerary")
        })?;

    Ok((StatusCode::CREATED, Json(item)))
}

async fn generate_itinerary(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Itinerary>, ApiError> {
    let request: GenerateItineraryRequest = schemas::parse_body(body)?;
    request.validate()?;

    let preferences = request.preferences.as_deref().unwrap_or("General");
    let prompt = format!(
        "Create a {}-day itinerary for {}. Preferences: {}. Return JSON with structure: {{ \"destination\": \"{}\", \"content\": {{ \"days\": [{{\"day\": 1, \"title\": \"...\", \"activities\": [...]}}] }} }}",
        request.days, request.city, preferences, request.city
    );

    let result = state
        .ai
        .complete_json(ITINERARY_SYSTEM_PROMPT, &prompt)
        .await
        .map_err(|e| {
            error!("Itinerary generation failed: {:#}", e);
            ApiError::upstream("Failed to generate itinerary")
        })?;

    let content = result.get("content").cloned().ok_or_else(|| {
        error!("Generated itinerary is missing its content document");
        ApiError::upstream("Failed to generate itinerary")
    })?;

    let saved = state
        .store
        .create_itinerary(&request.city, &content)
        .await
        .map_err(|e| {
            error!("Failed to persist generated itinerary: {:#}", e);
            ApiError::persistence("Failed to generate itinerary")
        })?;

    Ok(Json(saved))
}

async fn get_itinerary(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Itinerary>, ApiError> {
    match state.store.get_itinerary(id).await {
        Ok(Some(item)) => Ok(Json(item)),
        Ok(None) => Err(ApiError::not_found("Not found")),
        Err(e) => {
            error!("Failed to load itinerary {}: {:#}", id, e);
            Err(ApiError::persistence("Failed to load itinerary"))
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/travel/search", get(travel_search))
        .route("/chat", post(chat_send))
        .route("/chat/history", get(chat_history))
        .route("/itineraries", get(list_itineraries).post(create_itinerary))
        .route("/itineraries/generate", post(generate_itinerary))
        .route("/itineraries/{id}", get(get_itinerary));

    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .nest("/api", api)
        .with_state(state)
}
