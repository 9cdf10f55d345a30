use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;

use super::{join_url, request_error, status_error, Provider};

/// Gemini client for the Generative Language API
#[derive(Debug)]
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL including the version segment
    endpoint: String,
    /// Model used for connection tests
    model: String,
}

/// `generateContent` request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    /// Model name, part of the URL rather than the body
    #[serde(skip)]
    model: String,

    /// System prompt to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,

    /// Conversation turns
    contents: Vec<GeminiContent>,

    /// Sampling and output settings
    generation_config: GenerationConfig,
}

/// A content block made of text parts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// `application/json` makes the model answer with a JSON document
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// `generateContent` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage information
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GeminiRequest {
    /// Create a new request for a model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_instruction: None,
            contents: Vec::new(),
            generation_config: GenerationConfig::default(),
        }
    }

    /// Set the system instruction
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system_instruction = Some(GeminiContent {
            role: None,
            parts: vec![GeminiPart { text: system.into() }],
        });
        self
    }

    /// Add a user turn
    pub fn add_user_text(mut self, text: impl Into<String>) -> Self {
        self.contents.push(GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart { text: text.into() }],
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.generation_config.temperature = Some(temperature);
        self
    }

    /// Ask for a JSON document as the answer
    pub fn json_output(mut self) -> Self {
        self.generation_config.response_mime_type = Some("application/json".to_string());
        self
    }

    /// Cap the answer length
    pub fn max_output_tokens(mut self, max_tokens: u32) -> Self {
        self.generation_config.max_output_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Gemini {
    /// Create a new Gemini client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    fn api_url(&self, model: &str) -> String {
        join_url(&self.endpoint, &format!("models/{}:generateContent", model))
    }
}

#[async_trait]
impl Provider for Gemini {
    type Request = GeminiRequest;
    type Response = GeminiResponse;

    async fn complete(&self, request: GeminiRequest) -> Result<GeminiResponse, ProviderError> {
        let response = self
            .client
            .post(self.api_url(request.model()))
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error("Gemini", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Gemini API error ({}): {}", status, error_text);
            return Err(status_error(status, error_text));
        }

        response
            .json::<GeminiResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Gemini response: {}", e)))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = GeminiRequest::new(&self.model)
            .add_user_text("Hello")
            .max_output_tokens(10);
        self.complete(request).await?;
        Ok(())
    }

    fn extract_text(response: &GeminiResponse) -> String {
        response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}
