use sha2::{Digest, Sha256};

use crate::table::{columns_of, Row};

pub const EMPTY_FINGERPRINT: &str = "empty";
pub const HASH_SAMPLE_ROWS: usize = 10;
pub const FINGERPRINT_LEN: usize = 12;

/// Short SHA-256 fingerprint over a CSV rendering of the first
/// [`HASH_SAMPLE_ROWS`] rows, using the first row's columns as the field order.
///
/// Rows past the sample do not contribute, and a missing column hashes the
/// same as an explicit null.
pub fn fingerprint(table: &[Row]) -> String {
    if table.is_empty() {
        return EMPTY_FINGERPRINT.to_string();
    }

    let sample = serialize_sample(table).unwrap_or_default();
    let mut digest = sha256(&sample);
    digest.truncate(FINGERPRINT_LEN);
    digest
}

fn serialize_sample(table: &[Row]) -> Result<Vec<u8>, csv::Error> {
    let columns = columns_of(table);
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(&columns)?;
    for row in table.iter().take(HASH_SAMPLE_ROWS) {
        writer.write_record(columns.iter().map(|column| row.get(column).render()))?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

fn sha256(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    format!("{:x}", result)
}
