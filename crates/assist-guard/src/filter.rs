//! Sensitive-data redaction for model output
//!
//! Safety net for leaks the prompt layering failed to prevent. Runs on every
//! response, including fallback text.

use crate::config::FilterConfig;
use crate::context::PromptContext;
use crate::error::Result;
use crate::rules::{self, PatternMatcher, Rule, RuleCategory, RuleDef};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Generic credential phrasing, evaluated after the per-subject rule
pub static SENSITIVE_RULES: &[RuleDef] = &[
    RuleDef {
        id: "password_is",
        category: RuleCategory::SensitiveCredential,
        pattern: r"password is \w+",
    },
    RuleDef {
        id: "your_password_is",
        category: RuleCategory::SensitiveCredential,
        pattern: r"your password is",
    },
    RuleDef {
        id: "credentials_are",
        category: RuleCategory::SensitiveCredential,
        pattern: r"credentials are",
    },
    RuleDef {
        id: "login_with",
        category: RuleCategory::SensitiveCredential,
        pattern: r"login with \w+",
    },
    RuleDef {
        id: "account_password",
        category: RuleCategory::SensitiveCredential,
        pattern: r"account password",
    },
];

/// Upper bound on redaction passes over one response
const MAX_PASSES: usize = 4;

/// Id of the rule built from the request's trusted context
pub const SUBJECT_CREDENTIAL_RULE: &str = "subject_credential";

/// Response after redaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredResponse {
    pub text: String,
    pub sensitive_info_found: bool,
    pub redacted_rule_ids: BTreeSet<String>,
}

/// Response filter
pub struct ResponseFilter {
    redaction_token: String,
    rules: Vec<Rule>,
}

impl ResponseFilter {
    /// Compile the generic table plus any custom patterns
    pub fn new(config: &FilterConfig) -> Result<Self> {
        let mut rules = rules::compile(SENSITIVE_RULES)?;
        rules.extend(rules::compile_custom(
            "custom_sensitive",
            RuleCategory::SensitiveCredential,
            &config.custom_patterns,
        )?);

        Ok(Self {
            redaction_token: config.redaction_token.clone(),
            rules,
        })
    }

    /// Redact credentials from `response`
    ///
    /// The rule table is assembled per request: the subject's derived
    /// credential first, then the generic rules. Each rule sees the text
    /// already redacted by the ones before it, so every distinct leak is caught.
    /// Passes repeat until none fires, since a redaction token can join the
    /// text around it into a new match.
    pub fn filter(&self, response: &str, context: &PromptContext) -> FilteredResponse {
        let subject_rule = context.subject_credential().and_then(|credential| {
            Rule::literal(
                SUBJECT_CREDENTIAL_RULE,
                RuleCategory::SensitiveCredential,
                &credential,
            )
            .map_err(|e| warn!(error = %e, "Skipping subject credential rule"))
            .ok()
        });
        let rules: Vec<&Rule> = subject_rule.iter().chain(self.rules.iter()).collect();

        let mut text = response.to_string();
        let mut redacted_rule_ids = BTreeSet::new();

        for _ in 0..MAX_PASSES {
            let pass = PatternMatcher::redact(&text, rules.iter().copied(), &self.redaction_token);
            if pass.rule_ids.is_empty() {
                break;
            }
            text = pass.text;
            redacted_rule_ids.extend(pass.rule_ids);
        }

        if PatternMatcher::count_matches(&text, rules.iter().copied()) > 0 {
            warn!(passes = MAX_PASSES, "Redaction did not settle");
        }

        FilteredResponse {
            sensitive_info_found: !redacted_rule_ids.is_empty(),
            text,
            redacted_rule_ids,
        }
    }
}
