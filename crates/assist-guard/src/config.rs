//! Configuration for Assist Guard

use crate::error::Result;
use crate::types::{AssistantKind, LayeringStrategy, Mode, SamplingParams};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for the pipeline
///
/// Every section has defaults, so a TOML file only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Query sanitizer configuration
    pub sanitizer: SanitizerConfig,
    /// Response filter configuration
    pub filter: FilterConfig,
    /// Sampling parameters per mode
    pub sampling: SamplingConfig,
    /// Billing assistant profile
    pub billing: AssistantProfile,
    /// HR assistant profile
    pub hr: AssistantProfile,
    /// Model call configuration
    pub model: ModelConfig,
    /// Audit configuration
    pub audit: AuditConfig,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            sanitizer: SanitizerConfig::default(),
            filter: FilterConfig::default(),
            sampling: SamplingConfig::default(),
            billing: AssistantProfile::billing(),
            hr: AssistantProfile::hr(),
            model: ModelConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl GuardConfig {
    /// Parse a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Profile for an assistant
    pub fn profile(&self, assistant: AssistantKind) -> &AssistantProfile {
        match assistant {
            AssistantKind::Billing => &self.billing,
            AssistantKind::Hr => &self.hr,
        }
    }
}

/// Query sanitizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Token written over every injection match
    pub sentinel: String,
    /// Extra injection patterns, evaluated after the built-in table
    pub custom_patterns: Vec<String>,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            sentinel: "[filtered]".to_string(),
            custom_patterns: vec![],
        }
    }
}

/// Response filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Token written over every sensitive match
    pub redaction_token: String,
    /// Extra sensitive-data patterns, evaluated after the built-in table
    pub custom_patterns: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            redaction_token: "[REDACTED]".to_string(),
            custom_patterns: vec![],
        }
    }
}

/// Sampling parameters per mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub reasoning: SamplingParams,
    pub standard: SamplingParams,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            reasoning: SamplingParams::reasoning(),
            standard: SamplingParams::standard(),
        }
    }
}

impl SamplingConfig {
    pub fn for_mode(&self, mode: Mode) -> SamplingParams {
        match mode {
            Mode::Reasoning => self.reasoning,
            Mode::Standard => self.standard,
        }
    }
}

/// Per-assistant prompt defaults
///
/// A profile section present in a config file replaces the built-in profile
/// as a whole; keys it leaves out take the layered, standard-mode defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantProfile {
    /// Layering used when the caller does not override it
    pub layering: LayeringStrategy,
    /// Let the complexity classifier pick reasoning mode.
    /// When off, the assistant answers in standard mode unless overridden.
    pub adaptive_reasoning: bool,
}

impl Default for AssistantProfile {
    fn default() -> Self {
        Self {
            layering: LayeringStrategy::Layered,
            adaptive_reasoning: false,
        }
    }
}

impl AssistantProfile {
    /// Billing defaults: flat prompt, classifier-driven mode
    pub fn billing() -> Self {
        Self {
            layering: LayeringStrategy::Flat,
            adaptive_reasoning: true,
        }
    }

    /// HR defaults: layered prompt, standard mode
    pub fn hr() -> Self {
        Self {
            layering: LayeringStrategy::Layered,
            adaptive_reasoning: false,
        }
    }
}

/// Model call configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Deadline for one model call; on expiry the fallback text is used
    pub timeout_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}

/// Audit logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Enable audit logging
    pub enabled: bool,
    /// Log a truncated copy of the query (vs. just its hash)
    pub log_content: bool,
    /// Append JSON lines to this file
    pub log_file: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_content: false, // Privacy by default
            log_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GuardConfig::default();
        assert_eq!(config.sanitizer.sentinel, "[filtered]");
        assert_eq!(config.filter.redaction_token, "[REDACTED]");
        assert_eq!(config.billing.layering, LayeringStrategy::Flat);
        assert!(config.billing.adaptive_reasoning);
        assert_eq!(config.hr.layering, LayeringStrategy::Layered);
        assert!(!config.hr.adaptive_reasoning);
        assert_eq!(config.sampling.for_mode(Mode::Reasoning).max_tokens, 1200);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GuardConfig::from_toml_str(
            r#"
            [sanitizer]
            custom_patterns = ["pretend to be"]

            [billing]
            layering = "layered"
            adaptive_reasoning = true

            [model]
            timeout_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.sanitizer.sentinel, "[filtered]");
        assert_eq!(config.sanitizer.custom_patterns, vec!["pretend to be"]);
        assert_eq!(config.billing.layering, LayeringStrategy::Layered);
        assert!(config.billing.adaptive_reasoning);
        assert_eq!(config.hr.layering, LayeringStrategy::Layered);
        assert_eq!(config.model.timeout_ms, 500);
        assert_eq!(config.sampling.for_mode(Mode::Standard).temperature, 0.7);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(GuardConfig::from_toml_str("[sanitizer\nsentinel = 1").is_err());
    }
}
