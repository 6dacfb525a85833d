//! Query complexity classification
//!
//! Picks reasoning mode when a query mixes money arithmetic and policy terms,
//! or leans heavily on either. Nothing else (length, punctuation) counts.

use crate::error::Result;
use crate::rules::{self, PatternMatcher, Rule, RuleCategory, RuleDef};
use crate::types::Mode;
use serde::Serialize;

/// Calculation indicators
pub static CALCULATION_RULES: &[RuleDef] = &[
    RuleDef {
        id: "how_much",
        category: RuleCategory::CalculationIndicator,
        pattern: r"how much",
    },
    RuleDef {
        id: "calculate",
        category: RuleCategory::CalculationIndicator,
        pattern: r"calculate",
    },
    RuleDef {
        id: "prorate",
        category: RuleCategory::CalculationIndicator,
        pattern: r"prorate",
    },
    RuleDef {
        id: "refund",
        category: RuleCategory::CalculationIndicator,
        pattern: r"refund",
    },
    RuleDef {
        id: "currency_amount",
        category: RuleCategory::CalculationIndicator,
        pattern: r"\$\d+",
    },
    RuleDef {
        id: "percent",
        category: RuleCategory::CalculationIndicator,
        pattern: r"percent",
    },
    RuleDef {
        id: "discount",
        category: RuleCategory::CalculationIndicator,
        pattern: r"discount",
    },
    RuleDef {
        id: "difference",
        category: RuleCategory::CalculationIndicator,
        pattern: r"difference",
    },
];

/// Policy indicators
pub static POLICY_RULES: &[RuleDef] = &[
    RuleDef {
        id: "eligible",
        category: RuleCategory::PolicyIndicator,
        pattern: r"eligible",
    },
    RuleDef {
        id: "policy",
        category: RuleCategory::PolicyIndicator,
        pattern: r"policy",
    },
    RuleDef {
        id: "terms",
        category: RuleCategory::PolicyIndicator,
        pattern: r"terms",
    },
    RuleDef {
        id: "conditions",
        category: RuleCategory::PolicyIndicator,
        pattern: r"conditions",
    },
    RuleDef {
        id: "allowed",
        category: RuleCategory::PolicyIndicator,
        pattern: r"allowed",
    },
    RuleDef {
        id: "exception",
        category: RuleCategory::PolicyIndicator,
        pattern: r"exception",
    },
];

/// Classifier verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub use_reasoning_mode: bool,
    /// Number of calculation rules that matched
    pub calc_match_count: usize,
    /// Number of policy rules that matched
    pub policy_match_count: usize,
}

impl ClassificationResult {
    pub fn mode(&self) -> Mode {
        if self.use_reasoning_mode {
            Mode::Reasoning
        } else {
            Mode::Standard
        }
    }
}

/// Complexity classifier
pub struct ComplexityClassifier {
    calculation: Vec<Rule>,
    policy: Vec<Rule>,
}

impl ComplexityClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            calculation: rules::compile(CALCULATION_RULES)?,
            policy: rules::compile(POLICY_RULES)?,
        })
    }

    /// Classify a sanitized query
    pub fn classify(&self, query: &str) -> ClassificationResult {
        let calc = PatternMatcher::count_matches(query, &self.calculation);
        let policy = PatternMatcher::count_matches(query, &self.policy);

        ClassificationResult {
            use_reasoning_mode: calc >= 2 || policy >= 2 || (calc >= 1 && policy >= 1),
            calc_match_count: calc,
            policy_match_count: policy,
        }
    }
}
