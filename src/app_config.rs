use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    // --- Server ---
    pub port: String,

    // --- Turso ---
    pub turso_db_url: String,
    pub turso_auth_token: String,

    // --- AI ---
    pub openai_model: String,
    pub openai_api_key: String,
    pub openai_base_url: String,

    // --- Unsplash (optional, enrichment only) ---
    pub unsplash_access_key: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        // dotenv belongs HERE, nowhere else
        dotenvy::dotenv().ok();

        Ok(Self {
            port: env::var("PORT").unwrap_or_else(|_| "3001".into()),

            turso_db_url: env::var("TURSO_DATABASE_URL")
                .context("TURSO_DATABASE_URL missing")?,
            turso_auth_token: env::var("TURSO_AUTH_TOKEN")
                .context("TURSO_AUTH_TOKEN missing")?,

            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-5.1".into()),
            openai_api_key: env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY missing")?,
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),

            unsplash_access_key: env::var("UNSPLASH_ACCESS_KEY").ok(),
        })
    }
}
