//! Error types for Assist Guard

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, GuardError>;

/// Guard error types
///
/// Only [`GuardError::EmptyQuery`] ever escapes
/// [`AssistantPipeline::handle`](crate::pipeline::AssistantPipeline::handle).
/// Model-side failures are absorbed into a fallback response.
#[derive(Debug, Error)]
pub enum GuardError {
    /// The caller sent no query (client input error)
    #[error("Query is required")]
    EmptyQuery,

    /// Configuration error (malformed rule pattern, bad config file)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The model backend answered with an error or an unusable body
    #[error("Model error: {0}")]
    ModelError(String),

    /// The model call did not finish in time
    #[error("Model call timed out after {0}ms")]
    ModelTimeout(u64),

    /// No model backend is configured
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// TOML config parse error
    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// HTTP error (when the OpenAI client is enabled)
    #[cfg(feature = "openai")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl GuardError {
    /// Whether the error was caused by the caller's input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(self, GuardError::EmptyQuery)
    }
}
