use colored::Colorize;
use tabled::settings::Style;
use tabled::Tabled;

use crate::audit::{AuditLog, AuditRecord, StepStatus};
use crate::table::Value;

const RULE_WIDTH: usize = 70;
const PREVIEW_INDICES: usize = 5;
const PREVIEW_VALUE_LEN: usize = 20;

#[derive(Debug, Clone, Tabled)]
pub struct StepTableRow {
    #[tabled(rename = "Step")]
    pub step: String,
    #[tabled(rename = "Function")]
    pub function: String,
    #[tabled(rename = "Rule")]
    pub rule: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Rows")]
    pub rows: String,
    #[tabled(rename = "Changed")]
    pub changed: String,
    #[tabled(rename = "Hash")]
    pub hash: String,
}

impl From<&AuditRecord> for StepTableRow {
    fn from(record: &AuditRecord) -> Self {
        let changed = if record.affected_row_count > 0 {
            record.affected_row_count.to_string()
        } else {
            "-".to_string()
        };

        let hash = if record.hash_before == record.hash_after {
            record.hash_after.clone()
        } else {
            format!("{} → {}", record.hash_before, record.hash_after)
        };

        StepTableRow {
            step: record.step_id.clone(),
            function: record.function_name.clone(),
            rule: record.rule_id.clone().unwrap_or_else(|| "-".to_string()),
            status: format!("{} {}", record.status.symbol(), record.status),
            rows: format!("{} → {}", record.rows_before, record.rows_after),
            changed,
            hash,
        }
    }
}

fn truncate_value(value: &Value, max_len: usize) -> String {
    let text = value.to_string();
    if text.chars().count() <= max_len {
        text
    } else {
        let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn format_indices(indices: &[usize]) -> String {
    let mut shown = indices
        .iter()
        .take(PREVIEW_INDICES)
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if indices.len() > PREVIEW_INDICES {
        shown.push_str(&format!(" (+{} more)", indices.len() - PREVIEW_INDICES));
    }
    shown
}

fn status_line(status: StepStatus) -> String {
    let text = format!("{} {}", status.symbol(), status);
    match status {
        StepStatus::Success => text.green().to_string(),
        StepStatus::Warning => text.yellow().to_string(),
        StepStatus::Error => text.red().to_string(),
    }
}

fn render_step(position: usize, record: &AuditRecord, lines: &mut Vec<String>) {
    lines.push(format!("\n[{}] {}", position, record.function_name.bold()));
    lines.push(format!("   • Status: {}", status_line(record.status)));
    lines.push(format!("   • Time: {}", record.timestamp.format("%H:%M:%S")));

    if let Some(rule) = &record.rule_id {
        lines.push(format!("   • Rule: {}", rule));
    }

    lines.push(format!("   • Rows: {} → {}", record.rows_before, record.rows_after));

    if record.has_changes() {
        lines.push(format!("   • Changed: {} rows", record.affected_row_count));

        if !record.affected_row_indices.is_empty() {
            lines.push(format!("   • Indices: [{}]", format_indices(&record.affected_row_indices)));
        }

        for (column, old, new) in record.sample_changes() {
            lines.push(format!(
                "   • Sample: {} = {} → {}",
                column,
                truncate_value(old, PREVIEW_VALUE_LEN),
                truncate_value(new, PREVIEW_VALUE_LEN)
            ));
        }
    }

    if let Some(message) = &record.message {
        lines.push(format!("   • Note: {}", message));
    }
}

/// Human-readable report of a whole log.
pub fn render_terminal(log: &AuditLog) -> String {
    let mut lines = Vec::new();
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);

    lines.push(heavy.clone());
    lines.push(format!("PROVENA AUDIT REPORT: {}", log.pipeline_name()).bold().to_string());
    lines.push(heavy.clone());

    let summary = log.summary();
    lines.push("\nSummary".to_string());
    lines.push(format!("   • Steps: {}", summary.total_steps));
    lines.push(format!("   • Total Changes: {} rows", summary.total_changes));
    if let Some(start) = summary.start_time {
        lines.push(format!("   • Started: {}", start.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    let errors = log.errors().len();
    if errors > 0 {
        lines.push(format!("   • Failed steps: {}", errors).red().to_string());
    }

    if !log.is_empty() {
        lines.push(String::new());
        let rows: Vec<StepTableRow> = log.records().iter().map(StepTableRow::from).collect();
        let mut table = tabled::Table::new(rows);
        table.with(Style::markdown());
        lines.push(table.to_string());
    }

    lines.push(light);

    for (i, record) in log.records().iter().enumerate() {
        render_step(i + 1, record, &mut lines);
    }

    lines.push(format!("\n{}", heavy));
    lines.push(format!("Export: {}_audit.json", log.pipeline_name()).dimmed().to_string());
    lines.push(heavy);

    lines.join("\n")
}
