//! Core types for Assist Guard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Which demo assistant a request is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantKind {
    /// Subscription billing support
    Billing,
    /// HR leave-management support
    Hr,
}

impl std::fmt::Display for AssistantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssistantKind::Billing => write!(f, "billing"),
            AssistantKind::Hr => write!(f, "hr"),
        }
    }
}

/// Response mode requested from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Labeled, numbered analysis before the answer
    Reasoning,
    /// Direct answer
    Standard,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Reasoning => write!(f, "reasoning"),
            Mode::Standard => write!(f, "standard"),
        }
    }
}

/// How trusted context and the user query are laid out in a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayeringStrategy {
    /// Context, instructions and query concatenated with no barrier.
    /// The weak baseline, kept for comparing defenses.
    Flat,
    /// Separate system-context, security-rule and user-query sections
    Layered,
}

impl std::fmt::Display for LayeringStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayeringStrategy::Flat => write!(f, "flat"),
            LayeringStrategy::Layered => write!(f, "layered"),
        }
    }
}

/// Caller override for the prompt shape
///
/// Wire names follow the transport: `cot`, `standard`, `original`, `secured`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromptType {
    /// Force reasoning mode
    #[serde(rename = "cot", alias = "reasoning")]
    Reasoning,
    /// Force standard mode
    #[serde(rename = "standard")]
    Standard,
    /// Force flat layering
    #[serde(rename = "original", alias = "flat")]
    Original,
    /// Force layered layering
    #[serde(rename = "secured", alias = "layered")]
    Secured,
}

impl PromptType {
    /// Mode this override forces, if it is a mode override
    pub fn mode(self) -> Option<Mode> {
        match self {
            PromptType::Reasoning => Some(Mode::Reasoning),
            PromptType::Standard => Some(Mode::Standard),
            PromptType::Original | PromptType::Secured => None,
        }
    }

    /// Layering this override forces, if it is a layering override
    pub fn layering(self) -> Option<LayeringStrategy> {
        match self {
            PromptType::Original => Some(LayeringStrategy::Flat),
            PromptType::Secured => Some(LayeringStrategy::Layered),
            PromptType::Reasoning | PromptType::Standard => None,
        }
    }

    /// Label echoed to the caller for a mode
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Reasoning => PromptType::Reasoning,
            Mode::Standard => PromptType::Standard,
        }
    }

    /// Label echoed to the caller for a layering strategy
    pub fn for_layering(layering: LayeringStrategy) -> Self {
        match layering {
            LayeringStrategy::Flat => PromptType::Original,
            LayeringStrategy::Layered => PromptType::Secured,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PromptType::Reasoning => "cot",
            PromptType::Standard => "standard",
            PromptType::Original => "original",
            PromptType::Secured => "secured",
        }
    }
}

impl FromStr for PromptType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cot" | "reasoning" => Ok(PromptType::Reasoning),
            "standard" => Ok(PromptType::Standard),
            "original" | "flat" => Ok(PromptType::Original),
            "secured" | "layered" => Ok(PromptType::Secured),
            other => Err(format!("unknown prompt type: {}", other)),
        }
    }
}

impl std::fmt::Display for PromptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sampling parameters handed to the model client
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Sampling temperature
    pub temperature: f32,
    /// Output token budget
    pub max_tokens: u32,
}

impl SamplingParams {
    /// Defaults for reasoning mode: cooler and longer
    pub fn reasoning() -> Self {
        Self {
            temperature: 0.5,
            max_tokens: 1200,
        }
    }

    /// Defaults for standard mode
    pub fn standard() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 800,
        }
    }
}

/// Per-request context for logging and audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Unique request ID
    pub request_id: Uuid,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        }
    }
}

impl RequestContext {
    /// Create a new context with a fresh request ID
    pub fn new() -> Self {
        Self::default()
    }
}

/// Audit log entry, one per handled request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Request context
    pub context: RequestContext,
    /// Assistant that handled the request
    pub assistant: AssistantKind,
    /// Mode the prompt was composed in
    pub mode: Mode,
    /// Layering the prompt was composed with
    pub layering: LayeringStrategy,
    /// Hash of the raw query
    pub query_hash: String,
    /// Fallback text was used instead of a model answer
    pub fallback: bool,
    /// An injection rule matched the query
    pub injection_attempt: bool,
    /// A sensitive-data rule matched the response
    pub contained_sensitive_info: bool,
    /// Ids of injection rules that matched the query
    pub injection_rules: Vec<String>,
    /// Ids of sensitive-data rules that fired on the response
    pub redaction_rules: Vec<String>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_type_parsing() {
        assert_eq!("cot".parse::<PromptType>(), Ok(PromptType::Reasoning));
        assert_eq!("Reasoning".parse::<PromptType>(), Ok(PromptType::Reasoning));
        assert_eq!("standard".parse::<PromptType>(), Ok(PromptType::Standard));
        assert_eq!("original".parse::<PromptType>(), Ok(PromptType::Original));
        assert_eq!("layered".parse::<PromptType>(), Ok(PromptType::Secured));
        assert!("verbose".parse::<PromptType>().is_err());
    }

    #[test]
    fn test_prompt_type_axes() {
        assert_eq!(PromptType::Reasoning.mode(), Some(Mode::Reasoning));
        assert_eq!(PromptType::Reasoning.layering(), None);
        assert_eq!(PromptType::Original.layering(), Some(LayeringStrategy::Flat));
        assert_eq!(PromptType::Secured.mode(), None);
    }

    #[test]
    fn test_prompt_type_wire_names() {
        let json = serde_json::to_string(&PromptType::Reasoning).unwrap();
        assert_eq!(json, "\"cot\"");
        let parsed: PromptType = serde_json::from_str("\"secured\"").unwrap();
        assert_eq!(parsed, PromptType::Secured);
    }

    #[test]
    fn test_reasoning_sampling_is_cooler_and_longer() {
        let reasoning = SamplingParams::reasoning();
        let standard = SamplingParams::standard();
        assert!(reasoning.temperature < standard.temperature);
        assert!(reasoning.max_tokens > standard.max_tokens);
    }
}
