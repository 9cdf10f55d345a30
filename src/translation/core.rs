/*!
 * Core translation service implementation.
 *
 * This module contains the main TranslationService struct, which sends one
 * file at a time to the configured provider, retries transient failures and
 * cleans up the answer.
 */

use async_trait::async_trait;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::{Duration, Instant};
use url::Url;

use crate::app_config::{TranslationConfig, TranslationProvider as ConfigTranslationProvider};
use crate::errors::{ProviderError, TranslationError};
use crate::language_utils::SupportLanguage;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::gemini::{Gemini, GeminiRequest};
use crate::providers::mock::{MockProvider, MockRequest};
use crate::providers::ollama::{GenerationRequest, Ollama};
use crate::providers::openai::{OpenAI, OpenAIRequest};
use crate::providers::Provider;

use super::backend::TranslationBackend;
use super::prompts::KindInstructions;

/// A markdown fence wrapped around the whole answer
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_+.-]*[ \t]*\r?\n(.*?)\r?\n?```\s*$").expect("valid fence regex")
});

/// Remove a code fence surrounding the whole text, if there is one
pub fn strip_code_fences(text: &str) -> String {
    match CODE_FENCE.captures(text) {
        Some(caps) => caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
        None => text.to_string(),
    }
}

/// Normalize an endpoint into a base URL without a trailing slash
fn parse_endpoint(endpoint: &str) -> Result<String, TranslationError> {
    if endpoint.trim().is_empty() {
        return Err(TranslationError::Configuration(
            "Endpoint cannot be empty".to_string(),
        ));
    }

    let with_scheme = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    };

    let url = Url::parse(&with_scheme).map_err(|e| {
        TranslationError::Configuration(format!("Invalid endpoint '{}': {}", endpoint, e))
    })?;
    if url.host_str().is_none() {
        return Err(TranslationError::Configuration(format!(
            "Invalid host in endpoint: {}",
            endpoint
        )));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Translation provider implementation variants
#[derive(Debug)]
enum TranslationProviderImpl {
    /// Google Gemini
    Gemini { client: Gemini },

    /// Ollama LLM service
    Ollama { client: Ollama },

    /// OpenAI API service
    OpenAI { client: OpenAI },

    /// LM Studio local server (OpenAI-compatible)
    LMStudio { client: OpenAI },

    /// Anthropic API service
    Anthropic { client: Anthropic },

    /// Scripted provider
    Mock { client: MockProvider },
}

/// Translation service backed by one configured provider
#[derive(Debug)]
pub struct TranslationService {
    /// Provider implementation
    provider: TranslationProviderImpl,

    /// Configuration for the translation service
    pub config: TranslationConfig,
}

impl TranslationService {
    /// Create a new translation service with the given configuration
    pub fn new(config: TranslationConfig) -> Result<Self, TranslationError> {
        let endpoint = parse_endpoint(&config.get_endpoint())?;
        let model = config.get_model();
        let timeout = config.get_timeout_secs();

        let provider = match config.provider {
            ConfigTranslationProvider::Gemini => TranslationProviderImpl::Gemini {
                client: Gemini::new(config.get_api_key(), endpoint, model, timeout),
            },
            ConfigTranslationProvider::Ollama => TranslationProviderImpl::Ollama {
                client: Ollama::new(endpoint, model, timeout),
            },
            ConfigTranslationProvider::OpenAI => TranslationProviderImpl::OpenAI {
                client: OpenAI::new(config.get_api_key(), endpoint, model, timeout),
            },
            ConfigTranslationProvider::LMStudio => {
                // LM Studio often doesn't require an API key; use a default if empty
                let api_key = {
                    let k = config.get_api_key();
                    if k.is_empty() { "lm-studio".to_string() } else { k }
                };
                TranslationProviderImpl::LMStudio {
                    client: OpenAI::new(api_key, endpoint, model, timeout),
                }
            }
            ConfigTranslationProvider::Anthropic => TranslationProviderImpl::Anthropic {
                client: Anthropic::new(config.get_api_key(), endpoint, model, timeout),
            },
        };

        Ok(Self { provider, config })
    }

    /// Service answering from a scripted provider
    pub fn with_mock(config: TranslationConfig, client: MockProvider) -> Self {
        Self {
            provider: TranslationProviderImpl::Mock { client },
            config,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        match &self.provider {
            TranslationProviderImpl::Gemini { .. } => "Gemini",
            TranslationProviderImpl::Ollama { .. } => "Ollama",
            TranslationProviderImpl::OpenAI { .. } => "OpenAI",
            TranslationProviderImpl::LMStudio { .. } => "LM Studio",
            TranslationProviderImpl::Anthropic { .. } => "Anthropic",
            TranslationProviderImpl::Mock { .. } => "Mock",
        }
    }

    /// Test the connection to the translation provider
    pub async fn test_connection(&self) -> Result<(), TranslationError> {
        let result = match &self.provider {
            TranslationProviderImpl::Gemini { client } => client.test_connection().await,
            TranslationProviderImpl::Ollama { client } => client.test_connection().await,
            TranslationProviderImpl::OpenAI { client }
            | TranslationProviderImpl::LMStudio { client } => client.test_connection().await,
            TranslationProviderImpl::Anthropic { client } => client.test_connection().await,
            TranslationProviderImpl::Mock { client } => client.test_connection().await,
        };
        result.map_err(TranslationError::from)
    }

    /// Translate one file's content, retrying transient provider failures
    pub async fn translate_content(
        &self,
        content: &str,
        instructions: &KindInstructions,
        target: SupportLanguage,
    ) -> Result<String, TranslationError> {
        let instructions = match self.config.common.temperature {
            Some(t) => instructions.clone().with_temperature(t),
            None => instructions.clone(),
        };

        let attempts = self.config.common.retry_count.saturating_add(1);
        let mut attempt: u32 = 0;

        loop {
            let start_time = Instant::now();
            match self.request_once(content, &instructions, target).await {
                Ok(text) => {
                    debug!(
                        "{} answered in {:?} ({} chars)",
                        self.provider_name(),
                        start_time.elapsed(),
                        text.len()
                    );
                    return Self::finish_answer(text, &instructions);
                }
                Err(e) if e.is_transient() && attempt + 1 < attempts => {
                    let backoff = self
                        .config
                        .common
                        .retry_backoff_ms
                        .saturating_mul(1u64 << attempt.min(16));
                    warn!(
                        "{} request failed (attempt {}/{}): {}. Retrying in {}ms",
                        self.provider_name(),
                        attempt + 1,
                        attempts,
                        e,
                        backoff
                    );
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Post-process a raw answer
    fn finish_answer(text: String, instructions: &KindInstructions) -> Result<String, TranslationError> {
        let text = if instructions.strip_code_fences {
            strip_code_fences(&text)
        } else {
            text
        };

        if text.trim().is_empty() {
            return Err(TranslationError::EmptyResponse);
        }
        Ok(text)
    }

    async fn request_once(
        &self,
        content: &str,
        instructions: &KindInstructions,
        target: SupportLanguage,
    ) -> Result<String, ProviderError> {
        let model = self.config.get_model();

        match &self.provider {
            TranslationProviderImpl::Gemini { client } => {
                let mut request = GeminiRequest::new(model)
                    .system(&instructions.system_prompt)
                    .add_user_text(content)
                    .temperature(instructions.temperature);
                if instructions.wants_json() {
                    request = request.json_output();
                }
                let response = client.complete(request).await?;
                Ok(Gemini::extract_text(&response))
            }
            TranslationProviderImpl::Ollama { client } => {
                let mut request = GenerationRequest::new(model, content)
                    .system(&instructions.system_prompt)
                    .temperature(instructions.temperature);
                if instructions.wants_json() {
                    request = request.format("json");
                }
                let response = client.complete(request).await?;
                Ok(Ollama::extract_text(&response))
            }
            TranslationProviderImpl::OpenAI { client }
            | TranslationProviderImpl::LMStudio { client } => {
                let mut request = OpenAIRequest::new(model)
                    .add_message("system", &instructions.system_prompt)
                    .add_message("user", content)
                    .temperature(instructions.temperature);
                if instructions.wants_json() {
                    request = request.json_output();
                }
                let response = client.complete(request).await?;
                Ok(OpenAI::extract_text(&response))
            }
            TranslationProviderImpl::Anthropic { client } => {
                let max_tokens = self.max_tokens_for_model(&model);
                let request = AnthropicRequest::new(model, max_tokens)
                    .system(&instructions.system_prompt)
                    .add_message("user", content)
                    .temperature(instructions.temperature);
                let response = client.complete(request).await?;
                Ok(Anthropic::extract_text(&response))
            }
            TranslationProviderImpl::Mock { client } => {
                let request = MockRequest {
                    system_prompt: instructions.system_prompt.clone(),
                    content: content.to_string(),
                    target_language: target.display_name().to_string(),
                    json_output: instructions.wants_json(),
                };
                let response = client.complete(request).await?;
                Ok(MockProvider::extract_text(&response))
            }
        }
    }

    /// Get the maximum number of output tokens for a given model
    fn max_tokens_for_model(&self, model: &str) -> u32 {
        match model {
            m if m.starts_with("claude-3-5") || m.starts_with("claude-3-7") => 8192,
            m if m.starts_with("claude-3") => 4096,
            m if m.starts_with("claude-") => 16384,
            _ => 4096,
        }
    }
}

#[async_trait]
impl TranslationBackend for TranslationService {
    async fn translate(
        &self,
        content: &str,
        instructions: &KindInstructions,
        _source: SupportLanguage,
        target: SupportLanguage,
    ) -> Result<String, TranslationError> {
        self.translate_content(content, instructions, target).await
    }
}
