use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::record::{step_id, AuditRecord, Step, StepStatus};
use crate::table::Row;

pub const DEFAULT_PIPELINE_NAME: &str = "Unnamed_Pipeline";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSummary {
    pub pipeline: String,
    pub total_steps: usize,
    pub total_changes: usize,
    #[serde(deserialize_with = "super::timestamp::deserialize_option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "super::timestamp::deserialize_option")]
    pub end_time: Option<DateTime<Utc>>,
}

/// Append-only trail of records for one pipeline run.
///
/// Owned by a single caller. Parallel branches should each keep their own
/// log and combine them with [`AuditLog::merge`].
#[derive(Debug, Clone)]
pub struct AuditLog {
    pipeline_name: String,
    records: Vec<AuditRecord>,
    step_counter: usize,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_PIPELINE_NAME)
    }
}

impl AuditLog {
    pub fn new(pipeline_name: impl Into<String>) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            records: Vec::new(),
            step_counter: 0,
        }
    }

    /// Rebuilds a log from previously recorded steps. Numbering resumes
    /// after the highest loaded step number.
    pub fn from_records(pipeline_name: impl Into<String>, records: Vec<AuditRecord>) -> Self {
        let step_counter = records
            .iter()
            .filter_map(|r| step_number(&r.step_id))
            .max()
            .unwrap_or(0)
            .max(records.len());
        Self {
            pipeline_name: pipeline_name.into(),
            records,
            step_counter,
        }
    }

    pub fn pipeline_name(&self) -> &str {
        &self.pipeline_name
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn step_counter(&self) -> usize {
        self.step_counter
    }

    fn next_step_id(&mut self) -> String {
        self.step_counter += 1;
        step_id(self.step_counter)
    }

    /// Records one transformation: numbers the step, diffs and fingerprints
    /// both snapshots, and appends the result.
    pub fn log_transformation(&mut self, step: Step, before: &[Row], after: &[Row]) -> &AuditRecord {
        let id = self.next_step_id();
        let record = AuditRecord::build(id, step, before, after);

        if record.status == StepStatus::Error {
            warn!(
                "{} {} failed: {}",
                record.step_id,
                record.function_name,
                record.message.as_deref().unwrap_or_default()
            );
        } else {
            debug!(
                "{} {}: {} -> {} rows, {} changed ({} -> {})",
                record.step_id,
                record.function_name,
                record.rows_before,
                record.rows_after,
                record.affected_row_count,
                record.hash_before,
                record.hash_after
            );
        }

        self.push(record)
    }

    /// Appends a prebuilt record under the log's next step id. Whatever id
    /// the record carried is replaced.
    pub fn append(&mut self, mut record: AuditRecord) -> &AuditRecord {
        record.step_id = self.next_step_id();
        self.push(record)
    }

    fn push(&mut self, record: AuditRecord) -> &AuditRecord {
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    pub fn summary(&self) -> AuditSummary {
        AuditSummary {
            pipeline: self.pipeline_name.clone(),
            total_steps: self.records.len(),
            total_changes: self.records.iter().map(|r| r.affected_row_count).sum(),
            start_time: self.records.first().map(|r| r.timestamp),
            end_time: self.records.last().map(|r| r.timestamp),
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.step_counter = 0;
    }

    pub fn errors(&self) -> Vec<&AuditRecord> {
        self.records.iter().filter(|r| r.status == StepStatus::Error).collect()
    }

    pub fn by_function(&self, function_name: &str) -> Vec<&AuditRecord> {
        self.records.iter().filter(|r| r.function_name == function_name).collect()
    }

    /// Combines branch logs into a new log ordered by timestamp. Steps are
    /// renumbered so ids stay unique; the branch logs are left untouched.
    pub fn merge<'a>(
        pipeline_name: impl Into<String>,
        branches: impl IntoIterator<Item = &'a AuditLog>,
    ) -> Self {
        let mut records: Vec<AuditRecord> = branches
            .into_iter()
            .flat_map(|log| log.records.iter().cloned())
            .collect();
        records.sort_by_key(|r| r.timestamp);

        let mut merged = Self::new(pipeline_name);
        for record in records {
            merged.append(record);
        }
        merged
    }
}

fn step_number(step_id: &str) -> Option<usize> {
    step_id.strip_prefix("step_")?.parse().ok()
}
