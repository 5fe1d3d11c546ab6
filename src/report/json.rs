use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::audit::{AuditLog, AuditRecord, AuditSummary};
use crate::error::Result;
use crate::VERSION;

#[derive(Debug, Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub provena_version: &'static str,
    pub report_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub metadata: ReportMetadata,
    pub pipeline: &'a str,
    pub summary: AuditSummary,
    pub steps: &'a [AuditRecord],
}

impl<'a> JsonReport<'a> {
    pub fn new(log: &'a AuditLog) -> Self {
        Self {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                provena_version: VERSION,
                report_type: "audit_trail",
            },
            pipeline: log.pipeline_name(),
            summary: log.summary(),
            steps: log.records(),
        }
    }
}

pub fn render_json(log: &AuditLog) -> Result<String> {
    Ok(serde_json::to_string_pretty(&JsonReport::new(log))?)
}

pub fn write_json_report(log: &AuditLog, path: impl AsRef<Path>) -> Result<String> {
    let json = render_json(log)?;
    fs::write(path, &json)?;
    Ok(json)
}
