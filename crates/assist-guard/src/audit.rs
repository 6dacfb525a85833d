//! Request audit logging

use crate::config::AuditConfig;
use crate::error::Result;
use crate::types::AuditEntry;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Write;

use tracing::{info, warn};

/// Audit logger
pub struct AuditLogger {
    config: AuditConfig,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Record one handled request
    ///
    /// `query` is the sanitized query; it is only written when `log_content`
    /// is set, and then truncated.
    pub fn log(&self, entry: &AuditEntry, query: &str) {
        if !self.config.enabled {
            return;
        }

        let content = self
            .config
            .log_content
            .then(|| truncate(query, 200));

        if entry.injection_attempt || entry.contained_sensitive_info {
            warn!(
                request_id = %entry.context.request_id,
                assistant = %entry.assistant,
                injection_rules = ?entry.injection_rules,
                redaction_rules = ?entry.redaction_rules,
                "Security rules fired"
            );
        }

        info!(
            request_id = %entry.context.request_id,
            assistant = %entry.assistant,
            mode = %entry.mode,
            layering = %entry.layering,
            query_hash = %entry.query_hash,
            fallback = entry.fallback,
            injection_attempt = entry.injection_attempt,
            contained_sensitive_info = entry.contained_sensitive_info,
            processing_time_ms = entry.processing_time_ms,
            query = ?content,
            "Assistant audit"
        );

        if let Some(ref path) = self.config.log_file {
            if let Err(e) = append_json_line(path, entry) {
                warn!(path = %path, error = %e, "Failed to write audit log");
            }
        }
    }
}

fn append_json_line(path: &str, entry: &AuditEntry) -> Result<()> {
    let json = serde_json::to_string(entry)?;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{json}")?;
    Ok(())
}

/// Hash content for audit (privacy-preserving)
pub fn hash_content(content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// Truncate to at most `max_chars` characters
fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssistantKind, LayeringStrategy, Mode, RequestContext};

    fn entry() -> AuditEntry {
        AuditEntry {
            context: RequestContext::new(),
            assistant: AssistantKind::Hr,
            mode: Mode::Standard,
            layering: LayeringStrategy::Layered,
            query_hash: hash_content("what is my password"),
            fallback: true,
            injection_attempt: false,
            contained_sensitive_info: true,
            injection_rules: vec![],
            redaction_rules: vec!["password_is".to_string()],
            processing_time_ms: 4,
        }
    }

    #[test]
    fn test_hash_content() {
        let hash1 = hash_content("test");
        let hash2 = hash_content("test");
        let hash3 = hash_content("different");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a longer string", 10), "this is a ...");
        assert_eq!(truncate("héllo wörld", 4), "héll...");
    }

    #[test]
    fn test_audit_disabled() {
        let logger = AuditLogger::new(AuditConfig {
            enabled: false,
            ..Default::default()
        });
        assert!(!logger.enabled());

        // Should not panic when disabled
        logger.log(&entry(), "what is my password");
    }

    #[test]
    fn test_appends_json_lines() {
        let path = std::env::temp_dir().join(format!("assist-audit-{}.jsonl", uuid::Uuid::new_v4()));
        let logger = AuditLogger::new(AuditConfig {
            enabled: true,
            log_content: true,
            log_file: Some(path.to_string_lossy().into_owned()),
        });

        logger.log(&entry(), "first");
        logger.log(&entry(), "second");

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: AuditEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.assistant, AssistantKind::Hr);
        assert!(parsed.contained_sensitive_info);
        assert!(!lines[0].contains("what is my password"));

        let _ = std::fs::remove_file(&path);
    }
}
