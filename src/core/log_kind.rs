//! GMES log file kinds and file-name detection.
//!
//! Plant-floor logs are written as `LGE GMES_<TYPE>_<date>.log`, one file
//! per type and day. The type decides which parser path a file takes.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::util::constants::{LOG_FILE_EXTENSION, LOG_FILE_PREFIX};
use crate::util::error::GmesLogError;

/// The `<TYPE>` of a GMES log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogKind {
    /// Service calls (`ExecuteService():` sessions) plus one-line DATA records.
    Data,
    /// ELEMENT / SENDDATA event lines.
    Event,
    /// Free-form timestamped debug lines.
    Debug,
    /// `ExecuteServiceSync():` sessions carrying an exception.
    Exception,
}

impl LogKind {
    pub const ALL: [LogKind; 4] = [
        LogKind::Data,
        LogKind::Event,
        LogKind::Debug,
        LogKind::Exception,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogKind::Data => "DATA",
            LogKind::Event => "EVENT",
            LogKind::Debug => "DEBUG",
            LogKind::Exception => "EXCEPTION",
        }
    }

    /// Detect the kind from a path's file name.
    pub fn from_path(path: &Path) -> Option<LogKind> {
        let name = path.file_name()?.to_str()?;
        LogFileName::parse(name).map(|f| f.kind)
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogKind {
    type Err = GmesLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        LogKind::ALL
            .into_iter()
            .find(|k| k.as_str() == upper)
            .ok_or_else(|| GmesLogError::UnknownLogKind(s.to_string()))
    }
}

/// Components of a recognised GMES log file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileName {
    pub kind: LogKind,
    /// The `<date>` token exactly as written (e.g. `20240601`).
    pub date: String,
}

impl LogFileName {
    /// Parse `LGE GMES_<TYPE>_<date>.log`. The type is case-insensitive;
    /// the extension may be upper or lower case.
    pub fn parse(file_name: &str) -> Option<LogFileName> {
        let rest = file_name.strip_prefix(LOG_FILE_PREFIX)?;
        let ext_start = rest.len().checked_sub(LOG_FILE_EXTENSION.len())?;
        if !rest.is_char_boundary(ext_start)
            || !rest[ext_start..].eq_ignore_ascii_case(LOG_FILE_EXTENSION)
        {
            return None;
        }
        let stem = &rest[..ext_start];
        let (kind, date) = stem.split_once('_')?;
        let kind = kind.parse().ok()?;
        Some(LogFileName {
            kind,
            date: date.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_name() {
        let parsed = LogFileName::parse("LGE GMES_EXCEPTION_20240601.log").unwrap();
        assert_eq!(parsed.kind, LogKind::Exception);
        assert_eq!(parsed.date, "20240601");
    }

    #[test]
    fn test_parse_file_name_case_insensitive_kind() {
        let parsed = LogFileName::parse("LGE GMES_data_2024-06-01.LOG").unwrap();
        assert_eq!(parsed.kind, LogKind::Data);
    }

    #[test]
    fn test_reject_foreign_names() {
        assert!(LogFileName::parse("app.log").is_none());
        assert!(LogFileName::parse("LGE GMES_TRACE_20240601.log").is_none());
        assert!(LogFileName::parse("LGE GMES_DATA_20240601.txt").is_none());
    }

    #[test]
    fn test_from_path() {
        let path = Path::new("/var/log/LGE GMES_EVENT_20240601.log");
        assert_eq!(LogKind::from_path(path), Some(LogKind::Event));
    }

    #[test]
    fn test_from_str_error() {
        let err = "trace".parse::<LogKind>().unwrap_err();
        assert!(err.to_string().contains("trace"));
    }
}
