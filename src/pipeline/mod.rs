mod scope;
mod wrapper;

pub use scope::{audit_pipeline, PipelineScope};
pub use wrapper::{audit_trail, AuditedFn};
