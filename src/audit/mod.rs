mod checksum;
mod detector;
mod document;
mod log;
mod record;
mod timestamp;

pub use checksum::{fingerprint, EMPTY_FINGERPRINT, FINGERPRINT_LEN, HASH_SAMPLE_ROWS};
pub use detector::{detect_changes, ChangeDetector};
pub use document::{export, AuditDocument};
pub use log::{AuditLog, AuditSummary, DEFAULT_PIPELINE_NAME};
pub use record::{step_id, AuditRecord, Step, StepStatus, DEFAULT_ERROR_MESSAGE, MAX_AFFECTED_INDICES};
pub use timestamp::parse_timestamp;
