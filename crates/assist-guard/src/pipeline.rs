//! Request orchestration
//!
//! ```text
//! query ─► sanitize ─► classify ─► compose ─► invoke ──┬─► analyze ─► filter ─► response
//!                                                      │
//!                                        error/timeout └─► fallback text
//! ```

use crate::analysis::ResponseAnalyzer;
use crate::audit::{hash_content, AuditLogger};
use crate::client::ModelClient;
use crate::complexity::{ClassificationResult, ComplexityClassifier};
use crate::config::GuardConfig;
use crate::context::PromptContext;
use crate::error::{GuardError, Result};
use crate::fallback::FallbackGenerator;
use crate::filter::ResponseFilter;
use crate::injection::QuerySanitizer;
use crate::prompt::{ComposedPrompt, PromptComposer};
use crate::types::{
    AssistantKind, AuditEntry, LayeringStrategy, Mode, PromptType, RequestContext,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// One assistant request
#[derive(Debug, Clone)]
pub struct AssistantRequest {
    /// Raw user query
    pub query: String,
    /// Optional caller override
    pub prompt_type: Option<PromptType>,
    /// Trusted context; also selects the assistant
    pub context: PromptContext,
}

impl AssistantRequest {
    pub fn billing(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            prompt_type: None,
            context: PromptContext::Billing(Default::default()),
        }
    }

    pub fn hr(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            prompt_type: None,
            context: PromptContext::Hr(Default::default()),
        }
    }

    pub fn with_prompt_type(mut self, prompt_type: PromptType) -> Self {
        self.prompt_type = Some(prompt_type);
        self
    }
}

/// Numbered reasoning steps, already filtered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReasoningAnalysis {
    pub steps: Vec<String>,
}

/// Security flags reported with every response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityFlags {
    /// An injection rule matched the query
    pub injection_attempt: bool,
    /// The response filter redacted something
    pub contained_sensitive_info: bool,
}

/// Outcome of one request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantResponse {
    /// Sanitized query
    pub query: String,
    /// Effective override label: mode for billing, layering for HR
    pub prompt_type: PromptType,
    pub mode: Mode,
    pub layering: LayeringStrategy,
    /// Filtered response text
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ReasoningAnalysis>,
    /// Offline text was used instead of a model answer
    pub fallback: bool,
    pub security_flags: SecurityFlags,
    /// Classifier verdict, when the classifier ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClassificationResult>,
}

/// The full prompt-safety pipeline
///
/// Every rule table is compiled once in [`AssistantPipeline::new`]. The
/// pipeline holds no per-request state, so one instance serves concurrent
/// requests.
pub struct AssistantPipeline {
    config: GuardConfig,
    sanitizer: QuerySanitizer,
    classifier: ComplexityClassifier,
    composer: PromptComposer,
    analyzer: ResponseAnalyzer,
    filter: ResponseFilter,
    audit: AuditLogger,
    client: Arc<dyn ModelClient>,
}

impl AssistantPipeline {
    /// Build the pipeline; malformed patterns fail here with `ConfigError`
    pub fn new(config: GuardConfig, client: Arc<dyn ModelClient>) -> Result<Self> {
        Ok(Self {
            sanitizer: QuerySanitizer::new(&config.sanitizer)?,
            classifier: ComplexityClassifier::new()?,
            composer: PromptComposer::new(config.sampling.clone()),
            analyzer: ResponseAnalyzer::new()?,
            filter: ResponseFilter::new(&config.filter)?,
            audit: AuditLogger::new(config.audit.clone()),
            client,
            config,
        })
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Whether a real model backend is configured
    pub fn model_configured(&self) -> bool {
        self.client.is_configured()
    }

    /// Handle one request
    ///
    /// Fails only with [`GuardError::EmptyQuery`]. Model errors and timeouts
    /// are absorbed: the fallback text goes through the same analysis and
    /// filtering as a model answer.
    pub async fn handle(&self, request: AssistantRequest) -> Result<AssistantResponse> {
        if request.query.trim().is_empty() {
            return Err(GuardError::EmptyQuery);
        }

        let start = Instant::now();
        let ctx = RequestContext::new();
        let assistant = request.context.assistant();
        let profile = self.config.profile(assistant);

        let sanitized = self.sanitizer.sanitize(&request.query);

        let layering = request
            .prompt_type
            .and_then(PromptType::layering)
            .unwrap_or(profile.layering);

        let (mode, classification) = match request.prompt_type.and_then(PromptType::mode) {
            Some(mode) => (mode, None),
            None if profile.adaptive_reasoning => {
                let verdict = self.classifier.classify(sanitized.text());
                (verdict.mode(), Some(verdict))
            }
            None => (Mode::Standard, None),
        };

        debug!(
            request_id = %ctx.request_id,
            assistant = %assistant,
            mode = %mode,
            layering = %layering,
            injection = sanitized.injection_detected(),
            "Composing prompt"
        );

        let prompt = self
            .composer
            .compose(mode, layering, &request.context, &sanitized);

        let (raw, fallback) = match self.invoke(&prompt).await {
            Ok(text) => (text, false),
            Err(e) => {
                warn!(
                    request_id = %ctx.request_id,
                    error = %e,
                    "Model call failed, using fallback response"
                );
                let text =
                    FallbackGenerator::generate(&request.context, mode, layering, &sanitized);
                (text, true)
            }
        };

        let analyzed = self.analyzer.analyze(&raw, mode);

        let answer = self.filter.filter(&analyzed.final_answer, &request.context);
        let mut redaction_rules: BTreeSet<String> = answer.redacted_rule_ids;
        let mut contained_sensitive_info = answer.sensitive_info_found;

        let analysis = analyzed.reasoning_steps.map(|steps| {
            let steps = steps
                .iter()
                .map(|step| {
                    let filtered = self.filter.filter(step, &request.context);
                    contained_sensitive_info |= filtered.sensitive_info_found;
                    redaction_rules.extend(filtered.redacted_rule_ids);
                    filtered.text
                })
                .collect();
            ReasoningAnalysis { steps }
        });

        let prompt_type = match assistant {
            AssistantKind::Billing => PromptType::for_mode(mode),
            AssistantKind::Hr => PromptType::for_layering(layering),
        };

        let entry = AuditEntry {
            context: ctx,
            assistant,
            mode,
            layering,
            query_hash: hash_content(&request.query),
            fallback,
            injection_attempt: sanitized.injection_detected(),
            contained_sensitive_info,
            injection_rules: sanitized.matched_rule_ids().iter().cloned().collect(),
            redaction_rules: redaction_rules.into_iter().collect(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        };
        self.audit.log(&entry, sanitized.text());

        Ok(AssistantResponse {
            query: sanitized.text().to_string(),
            prompt_type,
            mode,
            layering,
            response: answer.text,
            analysis,
            fallback,
            security_flags: SecurityFlags {
                injection_attempt: sanitized.injection_detected(),
                contained_sensitive_info,
            },
            classification,
        })
    }

    async fn invoke(&self, prompt: &ComposedPrompt) -> Result<String> {
        let timeout_ms = self.config.model.timeout_ms;
        let params = prompt.sampling();
        let call = self.client.invoke(prompt.as_str(), &params);

        match tokio::time::timeout(Duration::from_millis(timeout_ms), call).await {
            Ok(result) => result,
            Err(_) => Err(GuardError::ModelTimeout(timeout_ms)),
        }
    }
}
