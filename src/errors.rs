/*!
 * Error types for the mcat application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether a retry has a reasonable chance of succeeding
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }
}

/// Errors that can occur while reading or writing addon archives
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The byte stream is not a readable zip container
    #[error("Malformed archive: {0}")]
    MalformedArchive(String),

    /// The entry uses a compression method we cannot decode
    #[error("Unsupported compression method {method} for entry '{path}'")]
    UnsupportedCompression {
        /// Entry path
        path: String,
        /// Raw method id from the header
        method: u16,
    },

    /// Decompressed data does not match the recorded checksum or size
    #[error("Corrupt entry '{path}': {reason}")]
    CorruptEntry {
        /// Entry path
        path: String,
        /// What went wrong
        reason: String,
    },

    /// No entry with this path exists in the archive
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    /// The output would need ZIP64 structures
    #[error("Archive too large: {0}")]
    TooLarge(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The backend answered but produced nothing usable
    #[error("Empty or unusable response from translation backend")]
    EmptyResponse,

    /// The translation service could not be set up
    #[error("Translation configuration error: {0}")]
    Configuration(String),
}

/// Errors raised by translation job operations
#[derive(Error, Debug)]
pub enum JobError {
    /// Error from archive handling
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// The path is not part of the current job
    #[error("No translatable entry with path '{0}'")]
    UnknownEntry(String),

    /// The job was reset or replaced after the entry was claimed
    #[error("'{0}' belongs to a job that was reset or replaced")]
    Superseded(String),

    /// Another run is still in flight for this job
    #[error("A translation run is already in progress")]
    RunInFlight,

    /// The operation needs the original archive, which is not loaded
    #[error("Original archive '{0}' is not loaded, please supply it again")]
    ReuploadRequired(String),

    /// Auto detection was requested as the target language
    #[error("Auto Detect cannot be used as the target language")]
    AutoTarget,

    /// The snapshot store failed
    #[error("Persistence error: {0}")]
    Persistence(String),
}
