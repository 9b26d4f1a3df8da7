//! CSV output for parsed records.
//!
//! One row per record with every field as a column. Multi-line content is
//! kept intact inside a quoted cell.

use std::io::Write;

use crate::core::log_record::LogRecord;
use crate::core::summary::ServiceSummary;
use crate::util::error::{GmesLogError, Result};

/// Column headers, in row order.
pub const CSV_HEADERS: [&str; 21] = [
    "Line",
    "Level",
    "Timestamp",
    "BusinessName",
    "ExecTime",
    "TxnId",
    "MsgId",
    "ProcId",
    "MsgNo",
    "BcrId",
    "ReturnCode",
    "WorkType",
    "LineStop",
    "LinePass",
    "ErrorCode",
    "ErrorCodeDesc",
    "BarcodeLot",
    "ErrorDescription",
    "Content",
    "RawTimestamp",
    "Summary",
];

/// Write `records` to `writer` as CSV with a header row.
///
/// # Errors
/// Returns [`GmesLogError::Export`] if a row cannot be written.
pub fn write_csv<W: Write>(records: &[LogRecord], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    writer
        .write_record(CSV_HEADERS)
        .map_err(|e| GmesLogError::Export(format!("Failed to write CSV header: {e}")))?;

    for record in records {
        let line = record.line_number.to_string();
        writer
            .write_record([
                line.as_str(),
                record.log_level.as_str(),
                record.timestamp.as_str(),
                record.business_name.as_str(),
                record.exec_time.as_str(),
                record.txn_id.as_str(),
                record.msg_id.as_str(),
                record.proc_id.as_str(),
                record.msg_no.as_str(),
                record.bcr_id.as_str(),
                record.return_code.as_str(),
                record.work_type.as_str(),
                record.line_stop.as_str(),
                record.line_pass.as_str(),
                record.error_code.as_str(),
                record.error_code_desc.as_str(),
                record.barcode_lot.as_str(),
                record.error_description.as_str(),
                record.content.as_str(),
                record.raw_timestamp.as_str(),
                record.display_message(),
            ])
            .map_err(|e| GmesLogError::Export(format!("Failed to write CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| GmesLogError::Export(format!("Failed to flush CSV: {e}")))?;

    tracing::debug!("Wrote {} records as CSV", records.len());
    Ok(())
}

/// Write `summaries` to `writer` as CSV, one row per business name.
pub fn write_summary_csv<W: Write>(
    summaries: &[ServiceSummary],
    writer: W,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer
        .write_record([
            "BusinessName",
            "Count",
            "Exceptions",
            "AvgExecSecs",
            "MaxExecSecs",
            "FirstSeen",
            "LastSeen",
        ])
        .map_err(|e| GmesLogError::Export(format!("Failed to write CSV header: {e}")))?;

    for row in summaries {
        let average = row
            .average_exec_secs()
            .map(|avg| format!("{avg:.3}"))
            .unwrap_or_default();
        writer
            .write_record([
                row.business_name.clone(),
                row.count.to_string(),
                row.exception_count.to_string(),
                average,
                format!("{:.3}", row.max_exec_secs),
                row.first_seen.clone(),
                row.last_seen.clone(),
            ])
            .map_err(|e| GmesLogError::Export(format!("Failed to write CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| GmesLogError::Export(format!("Failed to flush CSV: {e}")))
}
