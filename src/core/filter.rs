// LogViewer - core/filter.rs
//
// Attribute filter for log records. Both predicates are AND-combined.
// Core layer: pure logic, no I/O or UI dependencies.

use crate::core::model::{LogRecord, Severity};

/// Active filter for one file. Absent predicates match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Keep only records with exactly this severity.
    pub severity: Option<Severity>,

    /// Keep only records whose message contains this text (case-sensitive).
    pub content: Option<String>,
}

impl FilterState {
    /// Build a filter; an empty content string counts as "no content filter".
    pub fn new(severity: Option<Severity>, content: Option<&str>) -> Self {
        Self {
            severity,
            content: content.filter(|c| !c.is_empty()).map(str::to_string),
        }
    }

    /// Returns true if no predicates are active.
    pub fn is_empty(&self) -> bool {
        self.severity.is_none() && self.content.is_none()
    }

    /// Check a single record against every active predicate.
    pub fn matches(&self, record: &LogRecord) -> bool {
        if let Some(severity) = self.severity {
            if record.severity != severity {
                return false;
            }
        }
        if let Some(ref content) = self.content {
            if !record.message.contains(content.as_str()) {
                return false;
            }
        }
        true
    }

    /// Keep only the matching records, preserving their order.
    pub fn apply(&self, records: Vec<LogRecord>) -> Vec<LogRecord> {
        if self.is_empty() {
            return records;
        }
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}
