use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::audit::AuditLog;
use crate::error::Result;

/// An [`AuditLog`] that exports itself to `<pipeline>_audit.json` when it
/// goes out of scope, on every exit path. Nothing is written for a log
/// without records.
pub struct PipelineScope {
    log: AuditLog,
    export_dir: PathBuf,
    exported: bool,
}

pub fn audit_pipeline(pipeline_name: impl Into<String>) -> PipelineScope {
    PipelineScope::new(pipeline_name)
}

impl PipelineScope {
    pub fn new(pipeline_name: impl Into<String>) -> Self {
        Self {
            log: AuditLog::new(pipeline_name),
            export_dir: PathBuf::from("."),
            exported: false,
        }
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn export_path(&self) -> PathBuf {
        self.export_dir.join(format!("{}_audit.json", self.log.pipeline_name()))
    }

    pub fn log(&self) -> &AuditLog {
        &self.log
    }

    /// Exports now instead of on drop. Returns the written path, or `None`
    /// when there was nothing to record.
    pub fn finish(mut self) -> Result<Option<PathBuf>> {
        self.exported = true;
        Self::write(&self.log, &self.export_path())
    }

    fn write(log: &AuditLog, path: &Path) -> Result<Option<PathBuf>> {
        if log.is_empty() {
            return Ok(None);
        }
        log.export_json(path)?;
        Ok(Some(path.to_path_buf()))
    }
}

impl Deref for PipelineScope {
    type Target = AuditLog;

    fn deref(&self) -> &AuditLog {
        &self.log
    }
}

impl DerefMut for PipelineScope {
    fn deref_mut(&mut self) -> &mut AuditLog {
        &mut self.log
    }
}

impl Drop for PipelineScope {
    fn drop(&mut self) {
        if self.exported {
            return;
        }
        let path = self.export_path();
        match Self::write(&self.log, &path) {
            Ok(Some(path)) => info!("Pipeline {} exported to {}", self.log.pipeline_name(), path.display()),
            Ok(None) => {}
            Err(e) => warn!("Failed to export audit trail to {}: {}", path.display(), e),
        }
    }
}
