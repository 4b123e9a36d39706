use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::error;

/// Substituted when the provider returns an empty free-text completion.
pub const FALLBACK_REPLY: &str = "I couldn't generate a response.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AIMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<AIMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// -----------------------------
/// AI Service (OpenAI compatible)
/// -----------------------------
pub struct AIService {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl AIService {
    pub fn new(model: String, api_key: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("travel-api/1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            model,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// One attempt against the chat-completions endpoint; returns the first
    /// choice's content, which the provider may omit.
    async fn chat_completion(
        &self,
        system: &str,
        user: &str,
        json_mode: bool,
    ) -> Result<Option<String>> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                AIMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                AIMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: 0.7,
            max_tokens: 1024,
            response_format: json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Chat completion request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Chat completion API error {}: {}", status, body);
            anyhow::bail!("Chat completion failed with status {}", status);
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response JSON")?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }

    /// Structured mode: the completion is constrained to a single JSON
    /// document and parsed before being handed back.
    pub async fn complete_json(&self, system: &str, user: &str) -> Result<Value> {
        let content = self
            .chat_completion(system, user, true)
            .await?
            .context("No chat completion choices")?;

        serde_json::from_str(&content).context("Chat completion returned invalid JSON")
    }

    /// Free-text mode: empty provider output degrades to a fixed fallback
    /// string rather than an empty reply.
    pub async fn complete_text(&self, system: &str, user: &str) -> Result<String> {
        let content = self.chat_completion(system, user, false).await?;

        Ok(match content {
            Some(text) if !text.trim().is_empty() => text,
            _ => FALLBACK_REPLY.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    fn service(server: &MockServer) -> AIService {
        AIService::new(
            "gpt-5.1".to_string(),
            "test-key".to_string(),
            server.base_url(),
        )
    }

    #[tokio::test]
    async fn structured_mode_parses_json_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .body_includes("\"response_format\"");
                then.status(200).json_body(json!({
                    "choices": [{"message": {"content": "{\"summary\":\"A city\"}"}}]
                }));
            })
            .await;

        let value = service(&server)
            .complete_json("system", "Tell me about Lisbon")
            .await
            .unwrap();

        assert_eq!(value["summary"], "A city");
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn structured_mode_rejects_unparseable_content() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({
                    "choices": [{"message": {"content": "not json at all"}}]
                }));
            })
            .await;

        let result = service(&server).complete_json("system", "user").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn free_text_substitutes_fallback_for_empty_content() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200)
                    .json_body(json!({"choices": [{"message": {}}]}));
            })
            .await;

        let reply = service(&server).complete_text("system", "user").await.unwrap();
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn upstream_error_surfaces_as_err() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(429).body("rate limited");
            })
            .await;

        assert!(service(&server).complete_text("system", "user").await.is_err());
    }
}
