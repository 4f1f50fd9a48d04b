use tracklify_types::LogRecord;

use crate::error::FeedError;

/// Fixed export column order. Part of the contract: consumers key on these
/// names and positions regardless of locale.
pub const CSV_HEADER: [&str; 6] = [
    "Timestamp",
    "Device",
    "Application",
    "Window",
    "Content",
    "Severity",
];

/// Deterministic UTC timestamp rendering for exports
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Serialize records to CSV in the input order, one row per record.
///
/// Captured content is attacker-influenced free text, so fields containing a
/// comma, double quote, or newline are quoted and embedded quotes doubled
/// (RFC 4180). Absent optional fields render as empty strings. Output is
/// UTF-8 with LF line endings.
pub fn to_csv(records: &[LogRecord]) -> Result<String, FeedError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|e| FeedError::Export(e.to_string()))?;

    for record in records {
        writer
            .write_record([
                record.created_at.format(TIMESTAMP_FORMAT).to_string(),
                record.device_id.clone(),
                record.application.clone().unwrap_or_default(),
                record.window_title.clone().unwrap_or_default(),
                record.content.clone(),
                record
                    .severity
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
            ])
            .map_err(|e| FeedError::Export(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| FeedError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| FeedError::Export(e.to_string()))
}
