/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for various LLM providers:
 * - Gemini: Google Generative Language API
 * - Ollama: Local LLM server
 * - OpenAI: OpenAI API and compatible servers such as LM Studio
 * - Anthropic: Anthropic API integration
 * - Mock: scripted provider for tests
 */

use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably in the translation service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Send a minimal request to check the endpoint, model and credentials
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Map a transport failure from reqwest
pub(crate) fn request_error(provider: &str, e: reqwest::Error) -> ProviderError {
    if e.is_timeout() || e.is_connect() {
        ProviderError::ConnectionError(format!("{}: {}", provider, e))
    } else {
        ProviderError::RequestFailed(format!("{}: {}", provider, e))
    }
}

/// Map a non-success HTTP status and its body
pub(crate) fn status_error(status: StatusCode, body: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationError(body),
        429 => ProviderError::RateLimitExceeded(body),
        code => ProviderError::ApiError {
            status_code: code,
            message: body,
        },
    }
}

/// Join a base URL and a path without doubling slashes
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod ollama;
pub mod openai;
