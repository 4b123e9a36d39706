use anyhow::Result;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use travel_api::ai_service::AIService;
use travel_api::app_config::AppConfig;
use travel_api::image_service::ImageService;
use travel_api::routes::{self, AppState};

/// -----------------------------
/// MAIN
/// -----------------------------
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load + validate env ONCE
    let config = AppConfig::load()?;

    info!("Starting Travel API server...");

    // Initialize Turso store
    let store = Arc::new(travel_api::connect_turso(&config.turso_db_url, &config.turso_auth_token).await?);
    info!("✓ Store ready");

    // Initialize AI service
    let ai = Arc::new(AIService::new(
        config.openai_model.clone(),
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
    ));

    // Initialize image enrichment (optional)
    if config.unsplash_access_key.is_none() {
        info!("UNSPLASH_ACCESS_KEY not set; image enrichment disabled");
    }
    let images = Arc::new(ImageService::new(config.unsplash_access_key.clone()));

    let state = AppState { store, ai, images };

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    info!("🚀 Server ready on {}", addr);
    info!("🤖 Model: {}", config.openai_model);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
