//! Model invocation
//!
//! The pipeline only sees [`ModelClient`]. Any error it returns, including a
//! timeout imposed by the caller, sends the request down the fallback path.

use crate::error::{GuardError, Result};
use crate::types::SamplingParams;
use async_trait::async_trait;

/// Sends a composed prompt to a language model
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Run one completion and return the raw response text
    async fn invoke(&self, prompt: &str, params: &SamplingParams) -> Result<String>;

    /// Whether a real backend is behind this client
    fn is_configured(&self) -> bool {
        true
    }
}

/// Client used when no backend is configured; every call fails
#[derive(Debug, Clone, Default)]
pub struct UnavailableClient;

#[async_trait]
impl ModelClient for UnavailableClient {
    async fn invoke(&self, _prompt: &str, _params: &SamplingParams) -> Result<String> {
        Err(GuardError::ModelUnavailable(
            "no model API key configured".to_string(),
        ))
    }

    fn is_configured(&self) -> bool {
        false
    }
}

#[cfg(feature = "openai")]
pub use openai::{ApiType, OpenAiClient, OpenAiSettings};

#[cfg(feature = "openai")]
mod openai {
    use super::ModelClient;
    use crate::error::{GuardError, Result};
    use crate::types::SamplingParams;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use tracing::debug;

    const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

    /// Flavor of the chat-completions endpoint
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum ApiType {
        /// api.openai.com or a compatible server, bearer auth
        #[default]
        OpenAi,
        /// Azure OpenAI deployment, `api-key` header
        Azure,
    }

    impl ApiType {
        /// `"azure"` (any case) selects Azure; anything else is standard
        pub fn from_env_value(value: &str) -> Self {
            if value.trim().eq_ignore_ascii_case("azure") {
                ApiType::Azure
            } else {
                ApiType::OpenAi
            }
        }
    }

    /// Connection settings
    #[derive(Clone)]
    pub struct OpenAiSettings {
        pub api_key: String,
        pub api_type: ApiType,
        /// Endpoint base; required for Azure
        pub api_base: Option<String>,
        /// Azure `api-version` query parameter
        pub api_version: String,
        /// Model id, or deployment name for Azure
        pub model: String,
    }

    impl std::fmt::Debug for OpenAiSettings {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("OpenAiSettings")
                .field("api_key", &"<redacted>")
                .field("api_type", &self.api_type)
                .field("api_base", &self.api_base)
                .field("api_version", &self.api_version)
                .field("model", &self.model)
                .finish()
        }
    }

    impl OpenAiSettings {
        /// Chat-completions URL for these settings
        pub fn endpoint(&self) -> Result<String> {
            match self.api_type {
                ApiType::OpenAi => {
                    let base = self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
                    Ok(format!("{}/chat/completions", base.trim_end_matches('/')))
                }
                ApiType::Azure => {
                    let base = self.api_base.as_deref().ok_or_else(|| {
                        GuardError::ConfigError("Azure OpenAI requires an API base URL".into())
                    })?;
                    Ok(format!(
                        "{}/openai/deployments/{}/chat/completions?api-version={}",
                        base.trim_end_matches('/'),
                        self.model,
                        self.api_version
                    ))
                }
            }
        }
    }

    /// OpenAI / Azure OpenAI chat-completions client
    pub struct OpenAiClient {
        http: reqwest::Client,
        settings: OpenAiSettings,
        endpoint: String,
    }

    impl OpenAiClient {
        pub fn new(settings: OpenAiSettings) -> Result<Self> {
            let endpoint = settings.endpoint()?;
            Ok(Self {
                http: reqwest::Client::new(),
                settings,
                endpoint,
            })
        }

        pub fn settings(&self) -> &OpenAiSettings {
            &self.settings
        }
    }

    #[derive(Debug, Deserialize)]
    struct ChatResponse {
        #[serde(default)]
        choices: Vec<Choice>,
    }

    #[derive(Debug, Deserialize)]
    struct Choice {
        message: ChoiceMessage,
    }

    #[derive(Debug, Deserialize)]
    struct ChoiceMessage {
        content: Option<String>,
    }

    fn request_body(model: &str, prompt: &str, params: &SamplingParams) -> serde_json::Value {
        serde_json::json!({
            "model": model,
            "messages": [{ "role": "system", "content": prompt }],
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        })
    }

    fn first_content(body: ChatResponse) -> Result<String> {
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GuardError::ModelError("response has no message content".into()))
    }

    #[async_trait]
    impl ModelClient for OpenAiClient {
        async fn invoke(&self, prompt: &str, params: &SamplingParams) -> Result<String> {
            let body = request_body(&self.settings.model, prompt, params);

            let request = self.http.post(&self.endpoint).json(&body);
            let request = match self.settings.api_type {
                ApiType::OpenAi => request.bearer_auth(&self.settings.api_key),
                ApiType::Azure => request.header("api-key", &self.settings.api_key),
            };

            debug!(
                model = %self.settings.model,
                temperature = params.temperature,
                max_tokens = params.max_tokens,
                "Invoking chat completions"
            );

            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(GuardError::ModelError(format!("API error {}: {}", status, text)));
            }

            let body: ChatResponse = response.json().await?;
            first_content(body)
        }
    }

}
