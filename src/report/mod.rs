mod json;
mod terminal;

pub use json::{render_json, write_json_report, JsonReport, ReportMetadata};
pub use terminal::{render_terminal, StepTableRow};
