//! Ordered regular-expression rule tables and the matcher that runs them
//!
//! Rules are declared as data ([`RuleDef`]) and compiled once, when a
//! component is built. A pattern that fails to compile is reported as
//! [`GuardError::ConfigError`] at that point; evaluating compiled rules never
//! fails. Every rule matches case-insensitively.

use crate::error::{GuardError, Result};
use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Category tag carried by every rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleCategory {
    /// Instruction-override or persona-reassignment phrasing
    Injection,
    /// Signals that a query involves arithmetic on money or time
    CalculationIndicator,
    /// Signals that a query turns on policy terms
    PolicyIndicator,
    /// Credentials or secrets that must not reach the caller
    SensitiveCredential,
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleCategory::Injection => write!(f, "injection"),
            RuleCategory::CalculationIndicator => write!(f, "calculation-indicator"),
            RuleCategory::PolicyIndicator => write!(f, "policy-indicator"),
            RuleCategory::SensitiveCredential => write!(f, "sensitive-credential"),
        }
    }
}

/// A declarative rule entry, compiled by [`compile`]
#[derive(Debug, Clone, Copy)]
pub struct RuleDef {
    /// Short, snake_case identifier reported in results and logs
    pub id: &'static str,
    /// Family the rule belongs to
    pub category: RuleCategory,
    /// Regular expression source
    pub pattern: &'static str,
}

/// A compiled rule
#[derive(Debug, Clone)]
pub struct Rule {
    id: String,
    category: RuleCategory,
    regex: Regex,
}

impl Rule {
    /// Compile a rule from a regular expression
    pub fn new(id: impl Into<String>, category: RuleCategory, pattern: &str) -> Result<Self> {
        let id = id.into();
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                GuardError::ConfigError(format!("rule `{}` has an invalid pattern: {}", id, e))
            })?;

        Ok(Self {
            id,
            category,
            regex,
        })
    }

    /// Compile a rule that matches `text` literally
    pub fn literal(id: impl Into<String>, category: RuleCategory, text: &str) -> Result<Self> {
        Self::new(id, category, &regex::escape(text))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> RuleCategory {
        self.category
    }

    /// Whether the rule matches anywhere in `text`
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Number of non-overlapping matches in `text`
    pub fn occurrences(&self, text: &str) -> usize {
        self.regex.find_iter(text).count()
    }

    /// Replace every match with `token`, taken verbatim
    fn replace_all(&self, text: &str, token: &str) -> String {
        self.regex.replace_all(text, NoExpand(token)).into_owned()
    }
}

/// Compile a table of rule definitions, preserving declaration order
pub fn compile(defs: &[RuleDef]) -> Result<Vec<Rule>> {
    defs.iter()
        .map(|def| Rule::new(def.id, def.category, def.pattern))
        .collect()
}

/// Compile caller-supplied patterns, numbering them `<prefix>_<n>`
pub fn compile_custom(
    prefix: &str,
    category: RuleCategory,
    patterns: &[String],
) -> Result<Vec<Rule>> {
    patterns
        .iter()
        .enumerate()
        .map(|(i, pattern)| Rule::new(format!("{}_{}", prefix, i + 1), category, pattern))
        .collect()
}

/// Outcome of evaluating one rule against a text
#[derive(Debug, Clone)]
pub struct RuleMatch<'r> {
    /// The rule that was evaluated
    pub rule: &'r Rule,
    /// Whether it matched at least once
    pub matched: bool,
    /// Non-overlapping match count for this rule alone
    pub occurrences: usize,
}

/// Text after progressive redaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redacted {
    /// Text with every match replaced
    pub text: String,
    /// Ids of the rules that matched the text they were applied to
    pub rule_ids: BTreeSet<String>,
}

/// Evaluates ordered rule tables against text
///
/// Rule order is declaration order. It only matters for [`PatternMatcher::redact`],
/// where each rule sees the output of the rules before it.
pub struct PatternMatcher;

impl PatternMatcher {
    /// Evaluate every rule independently, in order
    pub fn evaluate<'r, I>(text: &str, rules: I) -> Vec<RuleMatch<'r>>
    where
        I: IntoIterator<Item = &'r Rule>,
    {
        rules
            .into_iter()
            .map(|rule| {
                let occurrences = rule.occurrences(text);
                RuleMatch {
                    rule,
                    matched: occurrences > 0,
                    occurrences,
                }
            })
            .collect()
    }

    /// Number of rules that match `text`
    pub fn count_matches<'r, I>(text: &str, rules: I) -> usize
    where
        I: IntoIterator<Item = &'r Rule>,
    {
        rules.into_iter().filter(|rule| rule.is_match(text)).count()
    }

    /// Ids of the rules that match `text`
    pub fn matched_ids<'r, I>(text: &str, rules: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'r Rule>,
    {
        rules
            .into_iter()
            .filter(|rule| rule.is_match(text))
            .map(|rule| rule.id().to_string())
            .collect()
    }

    /// Replace every match of every rule with `token`, rule by rule
    ///
    /// Each rule runs over the text already rewritten by the previous rules,
    /// so an earlier redaction can hide text a later rule would have matched.
    pub fn redact<'r, I>(text: &str, rules: I, token: &str) -> Redacted
    where
        I: IntoIterator<Item = &'r Rule>,
    {
        let mut current = text.to_string();
        let mut rule_ids = BTreeSet::new();

        for rule in rules {
            if rule.is_match(&current) {
                debug!(rule = rule.id(), category = %rule.category(), "Rule fired");
                current = rule.replace_all(&current, token);
                rule_ids.insert(rule.id().to_string());
            }
        }

        Redacted {
            text: current,
            rule_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFS: &[RuleDef] = &[
        RuleDef {
            id: "alpha",
            category: RuleCategory::Injection,
            pattern: r"alpha \w+",
        },
        RuleDef {
            id: "beta",
            category: RuleCategory::Injection,
            pattern: "beta",
        },
    ];

    #[test]
    fn test_malformed_pattern_is_config_error() {
        let err = Rule::new("broken", RuleCategory::Injection, "(unclosed").unwrap_err();
        assert!(matches!(err, GuardError::ConfigError(_)));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let rules = compile(DEFS).unwrap();
        assert_eq!(PatternMatcher::count_matches("ALPHA one, Beta", &rules), 2);
    }

    #[test]
    fn test_evaluate_reports_each_rule_in_order() {
        let rules = compile(DEFS).unwrap();
        let results = PatternMatcher::evaluate("beta beta", &rules);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].rule.id(), "alpha");
        assert!(!results[0].matched);
        assert_eq!(results[1].rule.id(), "beta");
        assert!(results[1].matched);
        assert_eq!(results[1].occurrences, 2);
    }

    #[test]
    fn test_overlapping_rules_reported_independently() {
        let rules = compile(DEFS).unwrap();
        let ids = PatternMatcher::matched_ids("alpha beta", &rules);
        assert!(ids.contains("alpha"));
        assert!(ids.contains("beta"));
    }

    #[test]
    fn test_earlier_redaction_masks_later_rule() {
        let rules = compile(DEFS).unwrap();
        let redacted = PatternMatcher::redact("say alpha beta now", &rules, "[x]");

        // "alpha beta" is consumed by the first rule, so "beta" never fires
        assert_eq!(redacted.text, "say [x] now");
        assert_eq!(redacted.rule_ids.len(), 1);
        assert!(redacted.rule_ids.contains("alpha"));
    }

    #[test]
    fn test_redact_replaces_every_occurrence() {
        let rules = compile(DEFS).unwrap();
        let redacted = PatternMatcher::redact("beta and BETA", &rules, "[x]");
        assert_eq!(redacted.text, "[x] and [x]");
    }

    #[test]
    fn test_token_is_not_expanded() {
        let rule = Rule::new("beta", RuleCategory::Injection, "(beta)").unwrap();
        let redacted = PatternMatcher::redact("beta", [&rule], "$1");
        assert_eq!(redacted.text, "$1");
    }

    #[test]
    fn test_literal_rule_escapes_metacharacters() {
        let rule = Rule::literal("secret", RuleCategory::SensitiveCredential, "a.b+c!").unwrap();
        assert!(rule.is_match("xx A.B+C! yy"));
        assert!(!rule.is_match("aXbbc!"));
    }

    #[test]
    fn test_compile_custom_numbers_rules() {
        let rules = compile_custom(
            "custom_injection",
            RuleCategory::Injection,
            &["foo".to_string(), "bar".to_string()],
        )
        .unwrap();
        assert_eq!(rules[0].id(), "custom_injection_1");
        assert_eq!(rules[1].id(), "custom_injection_2");
        assert!(rules.iter().all(|r| r.category() == RuleCategory::Injection));
    }

    #[test]
    fn test_category_display() {
        let rules = compile(DEFS).unwrap();
        assert_eq!(rules[0].category().to_string(), "injection");
        assert_eq!(
            RuleCategory::SensitiveCredential.to_string(),
            "sensitive-credential"
        );
    }
}
