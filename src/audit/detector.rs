use crate::table::{Row, Value};

/// Positional row comparison between two snapshots of the same table.
pub struct ChangeDetector;

impl ChangeDetector {
    /// Indices of rows that differ, ascending.
    ///
    /// A row-count change marks every position up to the longer length.
    /// Cells compare by canonical text, so `3` and `"3"` are equal; a null
    /// (or missing) cell only equals another null.
    pub fn detect(before: &[Row], after: &[Row]) -> Vec<usize> {
        if before.len() != after.len() {
            return (0..before.len().max(after.len())).collect();
        }

        before
            .iter()
            .zip(after.iter())
            .enumerate()
            .filter(|(_, (b, a))| Self::row_changed(b, a))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn row_changed(before: &Row, after: &Row) -> bool {
        let after_only = after.columns().filter(|c| !before.contains(c));
        before
            .columns()
            .chain(after_only)
            .any(|column| Self::cell_changed(before.get(column), after.get(column)))
    }

    pub fn cell_changed(old: &Value, new: &Value) -> bool {
        match (old.is_null(), new.is_null()) {
            (true, true) => false,
            (true, false) | (false, true) => true,
            (false, false) => old.render() != new.render(),
        }
    }
}

pub fn detect_changes(before: &[Row], after: &[Row]) -> Vec<usize> {
    ChangeDetector::detect(before, after)
}
