//! Parser entry points.
//!
//! [`parse_file`] turns the full text of one GMES log file into its
//! ordered records. Files of different kinds take different paths:
//!
//! | Kind        | Path                                                   |
//! |-------------|--------------------------------------------------------|
//! | `DATA`      | service sessions, with one-line records in between     |
//! | `EXCEPTION` | exception sessions                                     |
//! | `EVENT`     | line classifier                                        |
//! | `DEBUG`     | line classifier                                        |
//!
//! Parsing keeps no state between calls, so files can be parsed on
//! separate threads and re-parsing the same text yields the same records.

use crate::core::classifier::classify_builder;
use crate::core::fields::enrich;
use crate::core::log_kind::LogKind;
use crate::core::log_record::{LogLevel, LogRecord};
use crate::core::session::{reconstruct, reconstruct_with, SessionKind};

/// Split text into physical lines. `\r\n`, `\r` and `\n` all terminate a
/// line; a terminator at the very end does not add an empty line.
pub fn split_lines(content: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let bytes = content.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&content[start..i]);
                start = i + 1;
            }
            b'\r' => {
                lines.push(&content[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < bytes.len() {
        lines.push(&content[start..]);
    }
    lines
}

/// Classify one line and fill its remaining fields from the line text.
fn classify_line(line: &str, line_number: usize) -> Option<LogRecord> {
    classify_builder(line, line_number).map(|builder| enrich(builder, line).build())
}

/// Parse the full text of a log file of the given kind.
pub fn parse_file(content: &str, kind: LogKind) -> Vec<LogRecord> {
    let lines = split_lines(content);
    let records = match kind {
        LogKind::Data => {
            reconstruct_with(&lines, SessionKind::Service, LogLevel::Data, classify_line)
        }
        LogKind::Exception => reconstruct(&lines, SessionKind::Exception, LogLevel::Exception),
        LogKind::Event | LogKind::Debug => classify_lines(&lines),
    };
    tracing::debug!(
        "Parsed {} {} records from {} lines",
        records.len(),
        kind,
        lines.len()
    );
    records
}

fn classify_lines(lines: &[&str]) -> Vec<LogRecord> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| classify_line(line, idx + 1))
        .collect()
}

/// Parse text whose kind is unknown.
///
/// Every line goes through the classifier; lines that only match the
/// DEBUG fallback are ambiguous and get their level from a severity
/// keyword scan instead (`UNKNOWN` when no keyword is present).
pub fn parse_lines(content: &str) -> Vec<LogRecord> {
    split_lines(content)
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| {
            let builder = classify_builder(line, idx + 1)?;
            let builder = if builder.peek().log_level == LogLevel::Debug {
                let level = LogLevel::detect(&builder.peek().content);
                builder.log_level(level)
            } else {
                builder
            };
            Some(enrich(builder, line).build())
        })
        .collect()
}
