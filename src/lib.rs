pub mod error;
pub mod table;
pub mod audit;
pub mod pipeline;
pub mod report;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{ProvenaError, Result};
pub use table::{Row, Table, Value};
pub use audit::{
    AuditLog, AuditRecord, AuditSummary, AuditDocument, Step, StepStatus,
    ChangeDetector, detect_changes, fingerprint, export,
};
pub use pipeline::{audit_trail, audit_pipeline, AuditedFn, PipelineScope};
pub use report::{render_terminal, render_json, write_json_report};
