use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::checksum::fingerprint;
use super::detector::ChangeDetector;
use crate::table::{columns_of, Row, Value};

pub const MAX_AFFECTED_INDICES: usize = 20;
pub const DEFAULT_ERROR_MESSAGE: &str = "Transformation failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepStatus {
    #[default]
    Success,
    Warning,
    Error,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Success => "SUCCESS",
            StepStatus::Warning => "WARNING",
            StepStatus::Error => "ERROR",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            StepStatus::Success => "✓",
            StepStatus::Warning => "⚠",
            StepStatus::Error => "✗",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller-supplied metadata for one transformation step.
#[derive(Debug, Clone, Default)]
pub struct Step {
    pub function_name: String,
    pub rule_id: Option<String>,
    pub status: StepStatus,
    pub message: Option<String>,
}

impl Step {
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            ..Default::default()
        }
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    pub fn with_status(mut self, status: StepStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn warning(self, message: impl Into<String>) -> Self {
        self.with_status(StepStatus::Warning).with_message(message)
    }

    pub fn failed(self, message: impl Into<String>) -> Self {
        self.with_status(StepStatus::Error).with_message(message)
    }
}

/// Immutable record of one audited transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub step_id: String,
    pub function_name: String,
    #[serde(deserialize_with = "super::timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    pub rule_id: Option<String>,
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: Vec<String>,
    pub columns_after: Vec<String>,
    pub affected_row_indices: Vec<usize>,
    pub affected_row_count: usize,
    pub sample_before: Row,
    pub sample_after: Row,
    pub hash_before: String,
    pub hash_after: String,
    pub status: StepStatus,
    pub message: Option<String>,
}

impl AuditRecord {
    /// Diffs and fingerprints both snapshots regardless of `step.status`.
    pub fn build(step_id: impl Into<String>, step: Step, before: &[Row], after: &[Row]) -> Self {
        let changed = ChangeDetector::detect(before, after);

        let (sample_before, sample_after) = match changed.first() {
            Some(&idx) => (
                before.get(idx).cloned().unwrap_or_default(),
                after.get(idx).cloned().unwrap_or_default(),
            ),
            None => (Row::new(), Row::new()),
        };

        let message = match (step.status, step.message) {
            (StepStatus::Error, None) => Some(DEFAULT_ERROR_MESSAGE.to_string()),
            (StepStatus::Error, Some(m)) if m.trim().is_empty() => {
                Some(DEFAULT_ERROR_MESSAGE.to_string())
            }
            (_, message) => message,
        };

        Self {
            step_id: step_id.into(),
            function_name: step.function_name,
            timestamp: Utc::now(),
            rule_id: step.rule_id,
            rows_before: before.len(),
            rows_after: after.len(),
            columns_before: columns_of(before),
            columns_after: columns_of(after),
            affected_row_indices: changed.iter().take(MAX_AFFECTED_INDICES).copied().collect(),
            affected_row_count: changed.len(),
            sample_before,
            sample_after,
            hash_before: fingerprint(before),
            hash_after: fingerprint(after),
            status: step.status,
            message,
        }
    }

    pub fn has_changes(&self) -> bool {
        self.affected_row_count > 0
    }

    pub fn is_truncated(&self) -> bool {
        self.affected_row_count > self.affected_row_indices.len()
    }

    /// Sample columns whose value differs, as `(column, before, after)`.
    pub fn sample_changes(&self) -> Vec<(&str, &Value, &Value)> {
        self.sample_before
            .iter()
            .filter(|(column, _)| self.sample_after.contains(column))
            .map(|(column, old)| (column, old, self.sample_after.get(column)))
            .filter(|(_, old, new)| ChangeDetector::cell_changed(old, new))
            .collect()
    }
}

pub fn step_id(number: usize) -> String {
    format!("step_{:03}", number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&StepStatus::Success).unwrap(), "\"SUCCESS\"");
        assert_eq!(serde_json::to_string(&StepStatus::Warning).unwrap(), "\"WARNING\"");
        assert_eq!(serde_json::to_string(&StepStatus::Error).unwrap(), "\"ERROR\"");
    }

    #[test]
    fn test_step_id_format() {
        assert_eq!(step_id(1), "step_001");
        assert_eq!(step_id(42), "step_042");
        assert_eq!(step_id(1234), "step_1234");
    }

    #[test]
    fn test_build_single_change() {
        let before = vec![row!("name" => "  milk  ")];
        let after = vec![row!("name" => "milk")];

        let record = AuditRecord::build("step_001", Step::new("clean"), &before, &after);

        assert_eq!(record.affected_row_count, 1);
        assert_eq!(record.affected_row_indices, vec![0]);
        assert_eq!(record.sample_before, row!("name" => "  milk  "));
        assert_eq!(record.sample_after, row!("name" => "milk"));
        assert_eq!(record.columns_before, vec!["name"]);
        assert_eq!(record.status, StepStatus::Success);
        assert!(record.message.is_none());
    }

    #[test]
    fn test_build_no_changes() {
        let table = vec![row!("a" => 1), row!("a" => 2)];
        let record = AuditRecord::build("step_001", Step::new("noop"), &table, &table);

        assert_eq!(record.affected_row_count, 0);
        assert!(record.affected_row_indices.is_empty());
        assert!(record.sample_before.is_empty());
        assert!(record.sample_after.is_empty());
        assert_eq!(record.hash_before, record.hash_after);
        assert!(!record.has_changes());
    }

    #[test]
    fn test_build_truncates_indices() {
        let before: Vec<Row> = (0..25).map(|i| row!("v" => i as i64)).collect();
        let after: Vec<Row> = (0..25).map(|i| row!("v" => (i * 10 + 1) as i64)).collect();

        let record = AuditRecord::build("step_001", Step::new("scale"), &before, &after);

        assert_eq!(record.affected_row_count, 25);
        assert_eq!(record.affected_row_indices, (0..20).collect::<Vec<_>>());
        assert!(record.is_truncated());
    }

    #[test]
    fn test_build_row_count_change_samples() {
        let before = vec![row!("x" => 1)];
        let after = vec![row!("x" => 1), row!("x" => 2)];

        let record = AuditRecord::build("step_001", Step::new("append"), &before, &after);

        assert_eq!(record.affected_row_indices, vec![0, 1]);
        assert_eq!(record.sample_before, row!("x" => 1));
        assert_eq!(record.sample_after, row!("x" => 1));
        assert_eq!(record.rows_before, 1);
        assert_eq!(record.rows_after, 2);
    }

    #[test]
    fn test_build_into_empty_table() {
        let before = vec![row!("x" => 1)];
        let record = AuditRecord::build("step_001", Step::new("drop_all"), &before, &[]);

        assert_eq!(record.affected_row_indices, vec![0]);
        assert_eq!(record.sample_before, row!("x" => 1));
        assert!(record.sample_after.is_empty());
        assert!(record.columns_after.is_empty());
        assert_eq!(record.hash_after, "empty");
    }

    #[test]
    fn test_error_status_still_audited() {
        let table = vec![row!("a" => 1)];
        let step = Step::new("boom").with_rule("R1").failed("Transformation failed: bad");
        let record = AuditRecord::build("step_001", step, &table, &table);

        assert_eq!(record.status, StepStatus::Error);
        assert_eq!(record.message.as_deref(), Some("Transformation failed: bad"));
        assert_eq!(record.rule_id.as_deref(), Some("R1"));
        assert_eq!(record.hash_before, record.hash_after);
        assert_ne!(record.hash_before, "empty");
    }

    #[test]
    fn test_error_without_message_gets_default() {
        let step = Step::new("boom").with_status(StepStatus::Error);
        let record = AuditRecord::build("step_001", step, &[], &[]);
        assert_eq!(record.message.as_deref(), Some(DEFAULT_ERROR_MESSAGE));
    }

    #[test]
    fn test_sample_changes() {
        let before = vec![row!("id" => 1, "name" => "  A ", "city" => "X")];
        let after = vec![row!("id" => 1, "name" => "a", "city" => "X")];
        let record = AuditRecord::build("step_001", Step::new("clean"), &before, &after);

        let changes = record.sample_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].0, "name");
    }

    #[test]
    fn test_sample_changes_ignore_type_only_differences() {
        let before = vec![row!("qty" => 3, "name" => " A")];
        let after = vec![row!("qty" => "3", "name" => "A")];
        let record = AuditRecord::build("step_001", Step::new("clean"), &before, &after);

        let changes = record.sample_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].0, "name");
    }

    #[test]
    fn test_record_json_field_names() {
        let before = vec![row!("a" => 1)];
        let after = vec![row!("a" => 2)];
        let record = AuditRecord::build("step_001", Step::new("bump"), &before, &after);

        let json = serde_json::to_value(&record).unwrap();
        for key in [
            "step_id", "function_name", "timestamp", "rule_id", "rows_before", "rows_after",
            "columns_before", "columns_after", "affected_row_indices", "affected_row_count",
            "sample_before", "sample_after", "hash_before", "hash_after", "status", "message",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["affected_row_indices"], serde_json::json!([0]));
        assert_eq!(json["sample_after"], serde_json::json!({"a": 2}));
        assert_eq!(json["status"], "SUCCESS");
    }
}
