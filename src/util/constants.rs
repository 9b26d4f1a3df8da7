//! Application-wide constants for GmesLog.
//!
//! Centralising the log-format markers here keeps the scanner and the
//! extraction tables free of scattered string literals.

/// Start marker of a normal service-call session.
pub const SERVICE_MARKER: &str = "ExecuteService():";

/// Start marker of an exception-carrying service-call session. Only counts
/// when the same line also contains [`EXCEPTION_KEYWORD`].
pub const SERVICE_SYNC_MARKER: &str = "ExecuteServiceSync():";

/// Literal word that must accompany [`SERVICE_SYNC_MARKER`].
pub const EXCEPTION_KEYWORD: &str = "Exception";

/// Session line carrying the execution time.
pub const EXEC_TIME_KEY: &str = "exec.Time";

/// Session line carrying the transaction id.
pub const TXN_ID_KEY: &str = "TXN_ID";

/// Session lines containing this word are discarded.
pub const PARAMETER_KEY: &str = "Parameter";

/// Opening tag of the embedded tabular payload.
pub const DATASET_OPEN: &str = "<NewDataSet>";

/// Closing tag of the embedded tabular payload.
pub const DATASET_CLOSE: &str = "</NewDataSet>";

/// Line prefixes that start a stack-trace location line in exception text.
pub const LOCATION_TOKENS: &[&str] = &["위치", "at "];

/// Business name assigned to ELEMENT-form event lines.
pub const ELEMENT_EVENT_NAME: &str = "ELEMENT_EVENT";

/// Business name assigned to SENDDATA events without a process id.
pub const DEFAULT_EVENT_NAME: &str = "EVENT";

/// Barcode / lot tags in their fixed priority order.
pub const BARCODE_TAGS: &[&str] = &["BARCODE_NO", "BARCODE_VALUE", "LOT_ID", "LOTID"];

/// Minimum length of an accepted business-name candidate.
pub const MIN_BUSINESS_NAME_LEN: usize = 3;

/// Field keys that look like UPPER_SNAKE identifiers but are never
/// business names.
pub const RESERVED_FIELD_KEYS: &[&str] = &[
    "TXN_ID",
    "MSG_ID",
    "PROC_ID",
    "MSG_NO",
    "BCR_ID",
    "RETURN_CODE",
    "WORK_TYPE",
    "LINE_STOP",
    "LINE_PASS",
    "ERROR_CODE",
    "ERROR_CODE_DESC",
    "BARCODE_NO",
    "BARCODE_VALUE",
    "LOT_ID",
];

/// File name prefix of GMES log files (`LGE GMES_<TYPE>_<date>.log`).
pub const LOG_FILE_PREFIX: &str = "LGE GMES_";

/// File name extension of GMES log files.
pub const LOG_FILE_EXTENSION: &str = ".log";

/// Application display name used in log output.
pub const APP_NAME: &str = "GmesLog";

/// Application version string.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log file name used when `--log-file` points at a directory.
pub const LOG_FILE_NAME: &str = "gmeslog.log";

/// Maximum diagnostic log file size in bytes before rotation (5 MB).
pub const MAX_LOG_FILE_SIZE: u64 = 5 * 1024 * 1024;
