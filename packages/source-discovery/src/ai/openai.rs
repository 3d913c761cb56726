//! OpenAI implementation of the text-generation trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use source_discovery::ai::OpenAIGenerator;
//!
//! let generator = OpenAIGenerator::from_env()?.with_model("gpt-4o-mini");
//! let discovery = SourceDiscovery::new(searcher, fetcher, generator);
//! ```

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DiscoveryError, Result};
use crate::traits::generator::{parse_structured, GenerationRequest, TextGenerator};

const SYSTEM_PROMPT: &str =
    "You label web sources for election research. Respond only with JSON matching the schema.";

/// Chat-completions generator using `response_format: json_schema`.
pub struct OpenAIGenerator {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    strict: bool,
    schema: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    refusal: Option<String>,
}

impl OpenAIGenerator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: SecretString::from(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| DiscoveryError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set the chat model (default: gpt-4o-mini).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_request<'a>(&'a self, request: &'a GenerationRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: 0.0,
            max_tokens: request.max_tokens,
            response_format: ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: request.task_type.as_str(),
                    strict: true,
                    schema: &request.response_schema,
                },
            },
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAIGenerator {
    async fn generate_structured(&self, request: &GenerationRequest) -> Result<serde_json::Value> {
        debug!(
            task = request.task_type.as_str(),
            model = %self.model,
            prompt_len = request.prompt.len(),
            "OpenAI structured generation"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&self.chat_request(request))
            .send()
            .await
            .map_err(|e| DiscoveryError::Generation(Box::new(e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::Generation(
                format!("OpenAI error {}: {}", status, error_text).into(),
            ));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| DiscoveryError::Generation(Box::new(e)))?;

        let message = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| DiscoveryError::Generation("No response from OpenAI".into()))?;

        if let Some(refusal) = message.refusal {
            return Err(DiscoveryError::Generation(
                format!("OpenAI refused: {}", refusal).into(),
            ));
        }

        let content = message
            .content
            .ok_or_else(|| DiscoveryError::Generation("Empty response from OpenAI".into()))?;

        parse_structured(&content, request.allow_repair)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
