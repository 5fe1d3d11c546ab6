mod row;
mod value;

pub use row::Row;
pub use value::Value;

/// An ordered snapshot of rows. Position is meaningful.
pub type Table = Vec<Row>;

/// Column names of the first row, or nothing for an empty table.
pub fn columns_of(table: &[Row]) -> Vec<String> {
    table
        .first()
        .map(|row| row.columns().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Builds a [`Row`] from `column => value` pairs.
#[macro_export]
macro_rules! row {
    () => {
        $crate::table::Row::new()
    };
    ($($column:expr => $value:expr),+ $(,)?) => {
        $crate::table::Row::new()$(.with($column, $value))+
    };
}
