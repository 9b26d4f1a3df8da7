//! Canonical data structure for a single reconstructed GMES log entry.
//!
//! A record is produced either from one classified physical line or from
//! a whole multi-line service session. Records are assembled through
//! [`LogRecordBuilder`] and are never modified after they are emitted.

use std::fmt;

/// Classification outcome of a record.
///
/// `Error`, `Warn` and `Info` are only produced by the severity-keyword
/// scan applied to ambiguous lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Data,
    Event,
    Debug,
    Exception,
    Error,
    Warn,
    Info,
    #[default]
    Unknown,
}

impl LogLevel {
    /// Keyword vocabulary of the severity scan, in precedence order.
    const KEYWORDS: [(&'static str, LogLevel); 5] = [
        ("ERROR", LogLevel::Error),
        ("WARN", LogLevel::Warn),
        ("INFO", LogLevel::Info),
        ("DEBUG", LogLevel::Debug),
        ("EVENT", LogLevel::Event),
    ];

    /// Scan free text for a severity keyword (case-insensitive).
    /// Returns [`LogLevel::Unknown`] when none is present.
    pub fn detect(text: &str) -> LogLevel {
        let upper = text.to_uppercase();
        Self::KEYWORDS
            .iter()
            .find(|(keyword, _)| upper.contains(keyword))
            .map_or(LogLevel::Unknown, |(_, level)| *level)
    }

    /// Upper-case display name.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Data => "DATA",
            LogLevel::Event => "EVENT",
            LogLevel::Debug => "DEBUG",
            LogLevel::Exception => "EXCEPTION",
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structured GMES log entry.
///
/// String fields use the empty string for "not found"; none of them is
/// optional. The struct is `Clone` (for consumers that keep selections)
/// and `serde::Serialize` (for JSON and CSV output).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct LogRecord {
    /// 1-based line of the record's first physical line.
    pub line_number: usize,

    pub log_level: LogLevel,

    /// Canonical `HH:mm:ss` or `HH:mm:ss.fff`, or the original text when
    /// it could not be parsed.
    pub timestamp: String,

    /// Bracketed timestamp exactly as it appeared in the file.
    pub raw_timestamp: String,

    pub business_name: String,

    /// Normalised `SS[.fraction]` duration.
    pub exec_time: String,

    pub txn_id: String,
    pub msg_id: String,
    pub proc_id: String,

    // Event fields.
    pub bcr_id: String,
    pub return_code: String,
    pub msg_no: String,
    pub work_type: String,
    pub line_stop: String,
    pub line_pass: String,
    pub error_code: String,
    pub error_code_desc: String,

    /// First hit of the barcode / lot tags in priority order.
    pub barcode_lot: String,

    /// Free text following the payload of an exception session.
    pub error_description: String,

    /// Display text: metadata stripped, XML pretty-printed.
    pub content: String,
}

impl LogRecord {
    /// Start building a record anchored at `line_number`.
    pub fn builder(line_number: usize, log_level: LogLevel) -> LogRecordBuilder {
        LogRecordBuilder::new(line_number, log_level)
    }

    /// Returns a one-line summary suitable for a table column.
    pub fn display_message(&self) -> &str {
        let first = self.content.lines().next().unwrap_or("");
        if !first.is_empty() {
            first
        } else if !self.error_description.is_empty() {
            &self.error_description
        } else {
            "(no content)"
        }
    }
}

/// Field-by-field assembly of a [`LogRecord`].
///
/// Every setter takes `self` by value so a builder is consumed exactly
/// once by [`LogRecordBuilder::build`].
#[derive(Debug, Clone)]
pub struct LogRecordBuilder {
    record: LogRecord,
}

macro_rules! string_setters {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name(mut self, value: impl Into<String>) -> Self {
                self.record.$name = value.into();
                self
            }
        )*
    };
}

impl LogRecordBuilder {
    pub fn new(line_number: usize, log_level: LogLevel) -> Self {
        Self {
            record: LogRecord {
                line_number,
                log_level,
                ..LogRecord::default()
            },
        }
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.record.log_level = level;
        self
    }

    string_setters!(
        timestamp,
        raw_timestamp,
        business_name,
        exec_time,
        txn_id,
        msg_id,
        proc_id,
        bcr_id,
        return_code,
        msg_no,
        work_type,
        line_stop,
        line_pass,
        error_code,
        error_code_desc,
        barcode_lot,
        error_description,
        content,
    );

    /// Read access for enrichment steps that only fill empty fields.
    pub fn peek(&self) -> &LogRecord {
        &self.record
    }

    pub(crate) fn record_mut(&mut self) -> &mut LogRecord {
        &mut self.record
    }

    pub fn build(self) -> LogRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_keyword_precedence() {
        assert_eq!(LogLevel::detect("warn then error"), LogLevel::Error);
        assert_eq!(LogLevel::detect("Info: started"), LogLevel::Info);
        assert_eq!(LogLevel::detect("plain text"), LogLevel::Unknown);
    }

    #[test]
    fn test_builder_defaults_to_empty_strings() {
        let record = LogRecord::builder(7, LogLevel::Debug)
            .content("hello")
            .build();
        assert_eq!(record.line_number, 7);
        assert_eq!(record.log_level, LogLevel::Debug);
        assert_eq!(record.business_name, "");
        assert_eq!(record.display_message(), "hello");
    }

    #[test]
    fn test_level_serialises_upper_case() {
        let json = serde_json::to_string(&LogLevel::Exception).unwrap();
        assert_eq!(json, "\"EXCEPTION\"");
    }
}
