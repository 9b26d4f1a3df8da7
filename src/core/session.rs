//! Session reconstructor.
//!
//! A single forward scan over the physical lines of a file that merges the
//! lines of one service call into one [`LogRecord`]. Two session kinds
//! share the same skeleton:
//!
//! - [`SessionKind::Service`] starts at `ExecuteService():` and ends after
//!   its `NewDataSet` payload.
//! - [`SessionKind::Exception`] starts at `ExecuteServiceSync():` on a line
//!   that also says `Exception`, and collects the error text that follows
//!   the payload.
//!
//! A session ends on a blank line (or, for exceptions, a dash separator)
//! only when the next physical line starts a new session or the file ends.
//! The nested-tag depth of the payload is an open-minus-close count of
//! generic tags, not an XML parse, so partial markup in real logs cannot
//! derail the scan.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::content::normalize_body;
use crate::core::fields::{enrich_only, extract, Field};
use crate::core::log_record::{LogLevel, LogRecord};
use crate::util::constants::{
    DATASET_CLOSE, DATASET_OPEN, EXCEPTION_KEYWORD, EXEC_TIME_KEY, LOCATION_TOKENS, PARAMETER_KEY,
    SERVICE_MARKER, SERVICE_SYNC_MARKER, TXN_ID_KEY,
};
use crate::util::time::{normalize_exec_time, normalize_timestamp};

/// `<NewDataSet` followed by attributes.
const DATASET_OPEN_WITH_ATTRS: &str = "<NewDataSet ";

/// Fields a finished service session picks up from its text.
const SERVICE_FIELDS: &[Field] = &[Field::MsgId, Field::ProcId, Field::BarcodeLot];

/// Fields a finished exception session picks up from its text.
const EXCEPTION_FIELDS: &[Field] = &[
    Field::MsgId,
    Field::ProcId,
    Field::BarcodeLot,
    Field::ErrorCode,
    Field::ErrorCodeDesc,
];

/// Which start marker and tail handling a scan uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Service,
    Exception,
}

impl SessionKind {
    /// Whether `line` opens a session of this kind.
    pub fn starts_session(self, line: &str) -> bool {
        match self {
            SessionKind::Service => line.contains(SERVICE_MARKER),
            SessionKind::Exception => {
                line.contains(SERVICE_SYNC_MARKER) && line.contains(EXCEPTION_KEYWORD)
            }
        }
    }

    /// Whether `line` may end an open session (subject to the lookahead).
    fn is_terminator(self, line: &str) -> bool {
        let trimmed = line.trim();
        match self {
            SessionKind::Service => trimmed.is_empty(),
            SessionKind::Exception => trimmed.is_empty() || is_dash_separator(trimmed),
        }
    }

    fn business_name_re(self) -> &'static Regex {
        static SERVICE: OnceLock<Regex> = OnceLock::new();
        static EXCEPTION: OnceLock<Regex> = OnceLock::new();
        match self {
            SessionKind::Service => SERVICE.get_or_init(|| {
                Regex::new(r"\(\):\s*\[\s*([^\]]*?)\s*\]").expect("valid service name regex")
            }),
            SessionKind::Exception => EXCEPTION.get_or_init(|| {
                Regex::new(r"\(\):\s*\[\s*(.*?)\s*\]\s*Exception")
                    .expect("valid exception name regex")
            }),
        }
    }
}

/// Scanner state while a session is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Idle,
    InSession,
    CollectingXml { depth: i64 },
    CollectingErrorText,
}

fn is_dash_separator(trimmed: &str) -> bool {
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-')
}

fn opens_dataset(line: &str) -> bool {
    line.contains(DATASET_OPEN) || line.contains(DATASET_OPEN_WITH_ATTRS)
}

fn open_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[A-Za-z_][^<>]*>").expect("valid open tag regex"))
}

fn close_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</[A-Za-z_][^<>]*>").expect("valid close tag regex"))
}

fn leading_ts_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(\d[^\]]*)\]").expect("valid session timestamp regex"))
}

/// Opening tags minus closing tags on one line. Self-closing tags count
/// as neither.
pub fn tag_balance(line: &str) -> i64 {
    let opens = open_tag_re()
        .find_iter(line)
        .filter(|m| !m.as_str().ends_with("/>"))
        .count();
    let closes = close_tag_re().find_iter(line).count();
    opens as i64 - closes as i64
}

/// Accumulates the free text that follows an exception payload.
#[derive(Debug, Default)]
struct ErrorText {
    primary: String,
    detail: String,
}

impl ErrorText {
    fn push(&mut self, line: &str) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }
        if let Some(message) = trimmed.strip_prefix(':') {
            if self.primary.is_empty() {
                self.primary = message.trim().to_string();
                return;
            }
        }
        if LOCATION_TOKENS.iter().any(|t| trimmed.starts_with(t)) {
            if !self.detail.is_empty() {
                self.detail.push('\n');
            }
        } else if !self.detail.is_empty() {
            self.detail.push(' ');
        }
        self.detail.push_str(trimmed);
    }

    fn finish(self) -> String {
        let detail = self.detail.trim();
        match (self.primary.is_empty(), detail.is_empty()) {
            (true, _) => detail.to_string(),
            (false, true) => self.primary,
            (false, false) => {
                let starts_location = LOCATION_TOKENS.iter().any(|t| detail.starts_with(t));
                let sep = if starts_location { '\n' } else { ' ' };
                format!("{}{sep}{detail}", self.primary)
            }
        }
    }
}

/// Everything collected for the session currently open.
#[derive(Debug)]
struct OpenSession {
    start_line: usize,
    raw_timestamp: String,
    business_name: String,
    exec_time: String,
    txn_id: String,
    body: Vec<String>,
    source: String,
    error: ErrorText,
}

impl OpenSession {
    fn start(kind: SessionKind, line: &str, line_number: usize) -> Self {
        let raw_timestamp = leading_ts_re()
            .captures(line)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        let business_name = kind
            .business_name_re()
            .captures(line)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_default();
        Self {
            start_line: line_number,
            raw_timestamp,
            business_name,
            exec_time: String::new(),
            txn_id: String::new(),
            body: Vec::new(),
            source: line.to_string(),
            error: ErrorText::default(),
        }
    }

    fn remember(&mut self, line: &str) {
        self.source.push('\n');
        self.source.push_str(line);
    }
}

/// Reconstruct the sessions of `lines`, ignoring lines outside sessions.
pub fn reconstruct(lines: &[&str], kind: SessionKind, default_level: LogLevel) -> Vec<LogRecord> {
    reconstruct_with(lines, kind, default_level, |_, _| None)
}

/// Reconstruct the sessions of `lines`. Lines seen while no session is
/// open are handed to `idle` together with their 1-based line number, and
/// whatever it returns is emitted in file order.
///
/// `default_level` is the level of finished service sessions; exception
/// sessions are always [`LogLevel::Exception`].
pub fn reconstruct_with<F>(
    lines: &[&str],
    kind: SessionKind,
    default_level: LogLevel,
    mut idle: F,
) -> Vec<LogRecord>
where
    F: FnMut(&str, usize) -> Option<LogRecord>,
{
    let mut records = Vec::new();
    let mut state = ScanState::Idle;
    let mut open: Option<OpenSession> = None;

    for (idx, &line) in lines.iter().enumerate() {
        let line_number = idx + 1;

        if kind.starts_session(line) {
            if let Some(previous) = open.take() {
                records.push(finalize_session(previous, kind, default_level));
            }
            open = Some(OpenSession::start(kind, line, line_number));
            state = ScanState::InSession;
            continue;
        }

        let Some(session) = open.as_mut() else {
            if let Some(record) = idle(line, line_number) {
                records.push(record);
            }
            continue;
        };

        if kind.is_terminator(line) {
            let ends = lines
                .get(idx + 1)
                .map_or(true, |next| kind.starts_session(next));
            if ends {
                if let Some(finished) = open.take() {
                    records.push(finalize_session(finished, kind, default_level));
                }
                state = ScanState::Idle;
            }
            continue;
        }

        session.remember(line);
        state = match state {
            ScanState::InSession => scan_in_session(session, kind, line),
            ScanState::CollectingXml { depth } => {
                session.body.push(line.trim().to_string());
                collect_xml(kind, line, depth + tag_balance(line))
            }
            ScanState::CollectingErrorText => {
                session.error.push(line);
                ScanState::CollectingErrorText
            }
            ScanState::Idle => ScanState::InSession,
        };
    }

    if let Some(unfinished) = open.take() {
        tracing::debug!(
            "Session at line {} still open at end of input, finalizing",
            unfinished.start_line
        );
        records.push(finalize_session(unfinished, kind, default_level));
    }

    records
}

fn scan_in_session(session: &mut OpenSession, kind: SessionKind, line: &str) -> ScanState {
    if line.contains(PARAMETER_KEY) {
        ScanState::InSession
    } else if opens_dataset(line) {
        // A one-line payload may carry the only transaction id.
        if session.txn_id.is_empty() {
            session.txn_id = extract(Field::TxnId, line);
        }
        session.body.push(line.trim().to_string());
        collect_xml(kind, line, tag_balance(line))
    } else if line.contains(EXEC_TIME_KEY) {
        session.exec_time = match extract(Field::ExecTime, line) {
            value if !value.is_empty() => value,
            _ => line
                .split_whitespace()
                .last()
                .map(normalize_exec_time)
                .unwrap_or_default(),
        };
        ScanState::InSession
    } else if line.contains(TXN_ID_KEY) {
        session.txn_id = extract(Field::TxnId, line);
        ScanState::InSession
    } else {
        // Text before the payload never reaches the error description.
        ScanState::InSession
    }
}

/// State after a payload line whose running depth is `depth`.
fn collect_xml(kind: SessionKind, line: &str, depth: i64) -> ScanState {
    if line.contains(DATASET_CLOSE) && depth <= 0 {
        match kind {
            SessionKind::Service => ScanState::InSession,
            SessionKind::Exception => ScanState::CollectingErrorText,
        }
    } else {
        ScanState::CollectingXml { depth }
    }
}

/// Turn an open session into its record.
fn finalize_session(session: OpenSession, kind: SessionKind, default_level: LogLevel) -> LogRecord {
    let body = session.body.join("\n");
    let content = normalize_body(body.trim());

    let level = match kind {
        SessionKind::Service => default_level,
        SessionKind::Exception => LogLevel::Exception,
    };

    let mut builder = LogRecord::builder(session.start_line, level)
        .timestamp(normalize_timestamp(&session.raw_timestamp))
        .raw_timestamp(session.raw_timestamp)
        .business_name(session.business_name)
        .exec_time(session.exec_time)
        .txn_id(session.txn_id)
        .content(content);

    let fields = match kind {
        SessionKind::Service => SERVICE_FIELDS,
        SessionKind::Exception => {
            builder = builder.error_description(session.error.finish());
            EXCEPTION_FIELDS
        }
    };

    let record = enrich_only(builder, &session.source, fields).build();
    tracing::debug!(
        "Finalized {:?} session at line {} ({})",
        kind,
        record.line_number,
        record.business_name
    );
    record
}
