use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::{Itinerary, Message, MessageRole};

#[derive(Debug, Deserialize)]
struct TursoResponse {
    results: Vec<QueryResult>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    columns: Option<Vec<String>>,
    rows: Option<Vec<Vec<Value>>>,
}

/// Doubles single quotes for embedding a value in a SQL string literal.
fn escape(value: &str) -> String {
    value.replace('\'', "''")
}

/// Turso encodes integer cells as strings in the HTTP API; accept both.
fn cell_i64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn cell_timestamp(value: &Value) -> Result<DateTime<Utc>> {
    let raw = value.as_str().unwrap_or("");
    Ok(DateTime::parse_from_rfc3339(raw)
        .context("Failed to parse timestamp")?
        .with_timezone(&Utc))
}

pub struct TravelStore {
    client: Client,
    database_url: String,
    auth_token: String,
}

impl TravelStore {
    /// Creates a new TravelStore with HTTP API connection
    pub fn new(database_url: String, auth_token: String) -> Self {
        Self {
            client: Client::new(),
            database_url: database_url.replace("libsql://", "https://"),
            // Trim whitespace and carriage returns from the auth token
            auth_token: auth_token.trim().to_string(),
        }
    }

    async fn execute_sql(&self, sql: &str) -> Result<TursoResponse> {
        let url = format!("{}/v2/pipeline", self.database_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.auth_token))
            .json(&json!({
                "requests": [{"type": "execute", "stmt": {"sql": sql}}]
            }))
            .send()
            .await
            .context("Failed to send request to Turso")?;

        if !response.status().is_success() {
            let status = response.status();
            let text: String = response.text().await.unwrap_or_default();
            anyhow::bail!("Turso request failed with status {}: {}", status, text);
        }

        let json_response: Value = response.json().await?;
        let results = json_response["results"]
            .as_array()
            .context("Invalid response format")?;

        Ok(TursoResponse {
            results: results
                .iter()
                .map(|r| QueryResult {
                    columns: r["response"]["result"]["cols"]
                        .as_array()
                        .map(|cols| {
                            cols.iter()
                                .filter_map(|c| c["name"].as_str().map(String::from))
                                .collect()
                        }),
                    rows: r["response"]["result"]["rows"]
                        .as_array()
                        .map(|rows| {
                            rows.iter()
                                .map(|row| {
                                    row.as_array()
                                        .unwrap_or(&vec![])
                                        .iter()
                                        .map(|v| v["value"].clone())
                                        .collect()
                                })
                                .collect()
                        }),
                })
                .collect(),
        })
    }

    fn first_row(response: &TursoResponse) -> Option<&Vec<Value>> {
        response
            .results
            .first()
            .and_then(|result| result.rows.as_ref())
            .and_then(|rows| rows.first())
    }

    /// Initialize the database schema
    pub async fn initialize(&self) -> Result<()> {
        self.execute_sql(
            "CREATE TABLE IF NOT EXISTS itineraries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                destination TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .await?;

        self.execute_sql(
            "CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .await?;

        Ok(())
    }

    /// Persist a new itinerary; id and timestamp are assigned here, never
    /// by the caller.
    pub async fn create_itinerary(&self, destination: &str, content: &Value) -> Result<Itinerary> {
        let created_at = Utc::now();
        let content_text = serde_json::to_string(content)?;

        let sql = format!(
            "INSERT INTO itineraries (destination, content, created_at) VALUES ('{}', '{}', '{}') RETURNING id",
            escape(destination),
            escape(&content_text),
            created_at.to_rfc3339()
        );

        let response = self.execute_sql(&sql).await?;
        let id = Self::first_row(&response)
            .and_then(|row| row.first())
            .and_then(cell_i64)
            .context("Insert did not return an itinerary id")?;

        Ok(Itinerary {
            id,
            destination: destination.to_string(),
            content: content.clone(),
            created_at,
        })
    }

    /// Point lookup by id; absence is `None`, not an error.
    pub async fn get_itinerary(&self, id: i64) -> Result<Option<Itinerary>> {
        let sql = format!(
            "SELECT id, destination, content, created_at FROM itineraries WHERE id = {}",
            id
        );

        let response = self.execute_sql(&sql).await?;

        match Self::first_row(&response) {
            Some(row) => Ok(Some(Self::itinerary_from_row(row)?)),
            None => Ok(None),
        }
    }

    /// All itineraries, newest first
    pub async fn list_itineraries(&self) -> Result<Vec<Itinerary>> {
        let sql =
            "SELECT id, destination, content, created_at FROM itineraries ORDER BY created_at DESC";
        let response = self.execute_sql(sql).await?;
        let mut itineraries = Vec::new();

        if let Some(result) = response.results.first() {
            if let Some(rows) = &result.rows {
                for row in rows {
                    itineraries.push(Self::itinerary_from_row(row)?);
                }
            }
        }

        Ok(itineraries)
    }

    /// Append a message to the global chat log
    pub async fn create_message(&self, role: MessageRole, content: &str) -> Result<Message> {
        let created_at = Utc::now();

        let sql = format!(
            "INSERT INTO messages (role, content, created_at) VALUES ('{}', '{}', '{}') RETURNING id",
            role.as_str(),
            escape(content),
            created_at.to_rfc3339()
        );

        let response = self.execute_sql(&sql).await?;
        let id = Self::first_row(&response)
            .and_then(|row| row.first())
            .and_then(cell_i64)
            .context("Insert did not return a message id")?;

        Ok(Message {
            id,
            role,
            content: content.to_string(),
            created_at,
        })
    }

    /// All messages in chronological order (oldest first)
    pub async fn list_messages(&self) -> Result<Vec<Message>> {
        let sql = "SELECT id, role, content, created_at FROM messages ORDER BY created_at ASC";
        let response = self.execute_sql(sql).await?;
        let mut messages = Vec::new();

        if let Some(result) = response.results.first() {
            if let Some(rows) = &result.rows {
                for row in rows {
                    let id = row
                        .first()
                        .and_then(cell_i64)
                        .context("Missing message id")?;
                    let role_str = row[1].as_str().unwrap_or("").to_string();
                    let content = row[2].as_str().unwrap_or("").to_string();

                    let role = MessageRole::from_str(&role_str)
                        .context(format!("Invalid role: {}", role_str))?;
                    let created_at = cell_timestamp(&row[3])?;

                    messages.push(Message {
                        id,
                        role,
                        content,
                        created_at,
                    });
                }
            }
        }

        Ok(messages)
    }

    fn itinerary_from_row(row: &[Value]) -> Result<Itinerary> {
        let id = row
            .first()
            .and_then(cell_i64)
            .context("Missing itinerary id")?;
        let destination = row[1].as_str().unwrap_or("").to_string();
        let content_text = row[2].as_str().unwrap_or("");
        let content: Value =
            serde_json::from_str(content_text).context("Failed to parse itinerary content")?;
        let created_at = cell_timestamp(&row[3])?;

        Ok(Itinerary {
            id,
            destination,
            content,
            created_at,
        })
    }
}
