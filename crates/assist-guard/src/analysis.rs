//! Reasoning-trace extraction from model responses

use crate::error::{GuardError, Result};
use crate::prompt::ANALYSIS_MARKER;
use crate::types::Mode;
use regex::Regex;
use serde::Serialize;

/// `"12. text"`: ASCII digits, a period, one whitespace character
const STEP_PREFIX: &str = r"^[0-9]+\.\s";

/// A response split into answer text and optional reasoning steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedResponse {
    /// The full response text
    pub final_answer: String,
    /// Numbered steps found after the analysis marker
    pub reasoning_steps: Option<Vec<String>>,
}

/// Splits reasoning traces out of responses
pub struct ResponseAnalyzer {
    step_prefix: Regex,
}

impl ResponseAnalyzer {
    pub fn new() -> Result<Self> {
        let step_prefix = Regex::new(STEP_PREFIX)
            .map_err(|e| GuardError::ConfigError(format!("step prefix pattern: {}", e)))?;
        Ok(Self { step_prefix })
    }

    /// Extract the numbered analysis that follows [`ANALYSIS_MARKER`]
    ///
    /// Standard-mode responses and responses without the marker come back
    /// verbatim with no steps. After the marker, consecutive `N. text` lines
    /// are collected; blank lines are skipped and the first other line ends
    /// the list.
    pub fn analyze(&self, response: &str, mode: Mode) -> AnalyzedResponse {
        let reasoning_steps = match mode {
            Mode::Standard => None,
            Mode::Reasoning => response
                .split_once(ANALYSIS_MARKER)
                .map(|(_, after)| self.numbered_prefix(after)),
        };

        AnalyzedResponse {
            final_answer: response.to_string(),
            reasoning_steps,
        }
    }

    fn numbered_prefix(&self, text: &str) -> Vec<String> {
        let mut steps = Vec::new();

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match self.strip_number(line) {
                Some(step) => steps.push(step.trim().to_string()),
                None => break,
            }
        }

        steps
    }

    fn strip_number<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.step_prefix.find(line).map(|m| &line[m.end()..])
    }
}
