//! JSON output for parsed records.
//!
//! Serialises records (and optional summaries) as pretty-printed JSON
//! using Serde.

use std::io::Write;

use crate::core::log_record::LogRecord;
use crate::core::summary::ServiceSummary;
use crate::util::error::{GmesLogError, Result};

/// Write `records` to `writer` as a pretty-printed JSON array.
///
/// # Errors
/// Returns [`GmesLogError::Export`] if serialisation or the write fails.
pub fn write_json<W: Write>(records: &[LogRecord], writer: W) -> Result<()> {
    write_pretty(records, writer)?;
    tracing::debug!("Wrote {} records as JSON", records.len());
    Ok(())
}

/// Write `summaries` to `writer` as a pretty-printed JSON array.
pub fn write_summary_json<W: Write>(
    summaries: &[ServiceSummary],
    writer: W,
) -> Result<()> {
    write_pretty(summaries, writer)
}

fn write_pretty<T, W>(value: &T, writer: W) -> Result<()>
where
    T: serde::Serialize + ?Sized,
    W: Write,
{
    let mut writer = std::io::BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| GmesLogError::Export(format!("Failed to write JSON: {e}")))?;
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .map_err(|e| GmesLogError::Export(format!("Failed to flush JSON output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_record::LogLevel;

    #[test]
    fn test_json_uses_field_names_and_upper_case_levels() {
        let records = vec![LogRecord::builder(4, LogLevel::Exception)
            .business_name("SVC")
            .build()];
        let mut out = Vec::new();
        write_json(&records, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["line_number"], 4);
        assert_eq!(value[0]["log_level"], "EXCEPTION");
        assert_eq!(value[0]["business_name"], "SVC");
    }
}
