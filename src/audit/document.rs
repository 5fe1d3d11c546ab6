use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, warn};

use super::log::{AuditLog, AuditSummary, DEFAULT_PIPELINE_NAME};
use super::record::AuditRecord;
use crate::error::{ProvenaError, Result};
use crate::VERSION;

/// Persisted form of an [`AuditLog`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditDocument {
    #[serde(default = "default_pipeline")]
    pub pipeline: String,
    #[serde(default = "Utc::now", deserialize_with = "super::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub provena_version: String,
    #[serde(default)]
    pub summary: AuditSummary,
    #[serde(default)]
    pub audit_trail: Vec<AuditRecord>,
}

fn default_pipeline() -> String {
    DEFAULT_PIPELINE_NAME.to_string()
}

/// Snapshot of the log's current state. The log is not modified.
pub fn export(log: &AuditLog) -> AuditDocument {
    AuditDocument {
        pipeline: log.pipeline_name().to_string(),
        created_at: Utc::now(),
        provena_version: VERSION.to_string(),
        summary: log.summary(),
        audit_trail: log.records().to_vec(),
    }
}

impl AuditDocument {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json_pretty()?)?;
        info!("Audit trail saved to {}", path.display());
        Ok(())
    }

    /// Parses a stored document. Only text that is not JSON at all is an
    /// error; JSON of an unexpected shape keeps whatever records are usable.
    pub fn from_json(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| ProvenaError::InvalidDocument(e.to_string()))?;

        match serde_json::from_value(value.clone()) {
            Ok(document) => Ok(document),
            Err(e) => {
                warn!("Audit document has an unexpected layout ({}), reading usable records only", e);
                Ok(Self::salvage(&value))
            }
        }
    }

    fn salvage(value: &serde_json::Value) -> Self {
        let pipeline = value
            .get("pipeline")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(default_pipeline);

        let records: Vec<&serde_json::Value> = value
            .get("audit_trail")
            .and_then(serde_json::Value::as_array)
            .map(|records| records.iter().collect())
            .unwrap_or_default();
        let audit_trail: Vec<AuditRecord> = records
            .iter()
            .filter_map(|record| serde_json::from_value((*record).clone()).ok())
            .collect();
        if audit_trail.len() < records.len() {
            warn!("Skipped {} unreadable audit records", records.len() - audit_trail.len());
        }

        let created_at = value
            .get("created_at")
            .and_then(serde_json::Value::as_str)
            .and_then(super::timestamp::parse_timestamp)
            .unwrap_or_else(Utc::now);
        let provena_version = value
            .get("provena_version")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();

        let log = AuditLog::from_records(pipeline, audit_trail);
        AuditDocument {
            pipeline: log.pipeline_name().to_string(),
            created_at,
            provena_version,
            summary: log.summary(),
            audit_trail: log.records().to_vec(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ProvenaError::FileNotFound(path.display().to_string()),
            _ => ProvenaError::Io(e),
        })?;
        Self::from_json(&content)
    }

    pub fn into_log(self) -> AuditLog {
        AuditLog::from_records(self.pipeline, self.audit_trail)
    }
}

impl AuditLog {
    pub fn export(&self) -> AuditDocument {
        export(self)
    }

    pub fn export_json(&self, path: impl AsRef<Path>) -> Result<()> {
        export(self).write_to(path)
    }

    pub fn from_document(document: AuditDocument) -> Self {
        document.into_log()
    }
}
