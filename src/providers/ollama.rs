use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;

use super::{join_url, request_error, status_error, Provider};

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model used for connection tests
    model: String,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Format to return a response in
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the Ollama API
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    #[serde(default)]
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            format: None,
            stream: Some(false),
        }
    }

    /// Set the system message
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }

    /// Cap the number of generated tokens
    pub fn num_predict(mut self, num_predict: u32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).num_predict = Some(num_predict);
        self
    }

    /// Set the response format (`json`)
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

impl Ollama {
    /// Create a new Ollama client from a complete base URL
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                // Ollama uses HTTP/1.1
                .http1_only()
                .build()
                .unwrap_or_default(),
            model: model.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Parse a response body, falling back to the last complete line of a streamed answer
    fn parse_body(body: &str) -> Result<GenerationResponse, ProviderError> {
        match serde_json::from_str::<GenerationResponse>(body) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                debug!("Ollama response is not a single object, trying line-delimited: {}", e);
                let mut text = String::new();
                let mut parsed_any = false;
                for line in body.lines().filter(|l| !l.trim().is_empty()) {
                    let chunk: GenerationResponse = serde_json::from_str(line).map_err(|e| {
                        ProviderError::ParseError(format!("Ollama response: {}", e))
                    })?;
                    text.push_str(&chunk.response);
                    parsed_any = true;
                }
                if !parsed_any {
                    return Err(ProviderError::ParseError(format!("Ollama response: {}", e)));
                }
                Ok(GenerationResponse {
                    model: String::new(),
                    response: text,
                    done: true,
                    prompt_eval_count: None,
                    eval_count: None,
                })
            }
        }
    }
}

#[async_trait]
impl Provider for Ollama {
    type Request = GenerationRequest;
    type Response = GenerationResponse;

    async fn complete(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = join_url(&self.base_url, "api/generate");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error("Ollama", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| request_error("Ollama", e))?;

        if !status.is_success() {
            error!("Ollama API error ({}): {}", status, body);
            return Err(status_error(status, body));
        }

        Self::parse_body(&body)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = GenerationRequest::new(&self.model, "Hello").num_predict(10);
        self.complete(request).await?;
        Ok(())
    }

    fn extract_text(response: &GenerationResponse) -> String {
        response.response.clone()
    }
}
