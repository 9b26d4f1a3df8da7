//! Field extraction pipeline.
//!
//! Every field is described by an ordered table of candidates. A candidate
//! is either a regex whose first capture group is the value, or a small
//! extractor function for shapes a regex cannot express. Candidates are
//! evaluated lazily in table order and the first acceptable value wins, so
//! the priority of each chain is visible in one place and can be tested
//! candidate by candidate.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::log_record::{LogRecord, LogRecordBuilder};
use crate::util::constants::{BARCODE_TAGS, MIN_BUSINESS_NAME_LEN, RESERVED_FIELD_KEYS};
use crate::util::time::normalize_exec_time;

/// Value of a `KEY=VALUE` / `KEY: VALUE` pair: stops at whitespace,
/// separators, brackets and quotes.
const VALUE: &str = r#"([^\s:,;<>{}\[\]"'=]+)"#;

/// Every field the pipeline can extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    BusinessName,
    ExecTime,
    TxnId,
    MsgId,
    ProcId,
    MsgNo,
    BcrId,
    ReturnCode,
    WorkType,
    LineStop,
    LinePass,
    ErrorCode,
    ErrorCodeDesc,
    BarcodeLot,
}

impl Field {
    pub const ALL: [Field; 14] = [
        Field::BusinessName,
        Field::ExecTime,
        Field::TxnId,
        Field::MsgId,
        Field::ProcId,
        Field::MsgNo,
        Field::BcrId,
        Field::ReturnCode,
        Field::WorkType,
        Field::LineStop,
        Field::LinePass,
        Field::ErrorCode,
        Field::ErrorCodeDesc,
        Field::BarcodeLot,
    ];

    /// The record slot this field is written to.
    fn slot(self, record: &mut LogRecord) -> &mut String {
        match self {
            Field::BusinessName => &mut record.business_name,
            Field::ExecTime => &mut record.exec_time,
            Field::TxnId => &mut record.txn_id,
            Field::MsgId => &mut record.msg_id,
            Field::ProcId => &mut record.proc_id,
            Field::MsgNo => &mut record.msg_no,
            Field::BcrId => &mut record.bcr_id,
            Field::ReturnCode => &mut record.return_code,
            Field::WorkType => &mut record.work_type,
            Field::LineStop => &mut record.line_stop,
            Field::LinePass => &mut record.line_pass,
            Field::ErrorCode => &mut record.error_code,
            Field::ErrorCodeDesc => &mut record.error_code_desc,
            Field::BarcodeLot => &mut record.barcode_lot,
        }
    }
}

enum Extract {
    Pattern(Regex),
    Custom(fn(&str) -> Option<String>),
}

/// One entry of a field's priority table.
pub struct Candidate {
    label: &'static str,
    extract: Extract,
}

impl Candidate {
    fn pattern(label: &'static str, pattern: &str) -> Self {
        let regex = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("invalid pattern for candidate {label}: {e}"));
        Self {
            label,
            extract: Extract::Pattern(regex),
        }
    }

    fn custom(label: &'static str, f: fn(&str) -> Option<String>) -> Self {
        Self {
            label,
            extract: Extract::Custom(f),
        }
    }

    /// Short name used in diagnostics and tests.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// First value produced by this candidate that passes `accept`.
    /// Regex candidates try every match in the text, left to right.
    pub fn find(&self, text: &str, accept: fn(&str) -> bool) -> Option<String> {
        match &self.extract {
            Extract::Pattern(regex) => regex
                .captures_iter(text)
                .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim()))
                .find(|value| !value.is_empty() && accept(value))
                .map(String::from),
            Extract::Custom(f) => f(text).filter(|value| !value.is_empty() && accept(value)),
        }
    }
}

/// The ordered candidate table for one field.
pub struct FieldChain {
    field: Field,
    candidates: Vec<Candidate>,
    accept: fn(&str) -> bool,
    finish: fn(&str) -> String,
}

impl FieldChain {
    fn new(field: Field, candidates: Vec<Candidate>) -> Self {
        Self {
            field,
            candidates,
            accept: |_| true,
            finish: str::to_string,
        }
    }

    fn accept(mut self, accept: fn(&str) -> bool) -> Self {
        self.accept = accept;
        self
    }

    fn finish(mut self, finish: fn(&str) -> String) -> Self {
        self.finish = finish;
        self
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Evaluate the table lazily; returns the winning value and the label
    /// of the candidate that produced it.
    pub fn first_match(&self, text: &str) -> Option<(String, &'static str)> {
        self.candidates.iter().find_map(|candidate| {
            candidate
                .find(text, self.accept)
                .map(|value| ((self.finish)(&value), candidate.label()))
        })
    }
}

fn is_business_name(value: &str) -> bool {
    value.chars().count() >= MIN_BUSINESS_NAME_LEN
        && !value.chars().all(|c| c.is_ascii_digit())
        && !RESERVED_FIELD_KEYS.contains(&value)
        && !value.starts_with("ExecuteService")
}

/// `<Tag>...</Tag>` where the same tag closes later in the text; the tag
/// name is the candidate.
fn same_tag_round_trip(text: &str) -> Option<String> {
    static OPEN_TAG: OnceLock<Regex> = OnceLock::new();
    let open = OPEN_TAG.get_or_init(|| {
        Regex::new(r"<([A-Za-z_][\w.\-]*)(?:\s[^<>]*)?>").expect("valid open tag regex")
    });
    open.captures_iter(text).find_map(|caps| {
        let name = caps.get(1)?;
        let whole = caps.get(0)?;
        let tag = name.as_str();
        let closing = format!("</{tag}>");
        let qualifies = tag.len() >= 3
            && !tag.chars().all(|c| c.is_ascii_digit())
            && text[whole.end()..].contains(&closing);
        qualifies.then(|| tag.to_string())
    })
}

/// `ERROR_CODE_DESC=free text`: the value may contain spaces and runs up
/// to a separator or the next `KEY=` / `KEY:` token.
fn error_code_desc(text: &str) -> Option<String> {
    static DESC: OnceLock<Regex> = OnceLock::new();
    static NEXT_KEY: OnceLock<Regex> = OnceLock::new();
    let desc = DESC.get_or_init(|| {
        Regex::new(r"\bERROR_?CODE_?DESC\s*[:=]\s*([^<>,;{}\[\]]+)")
            .expect("valid error description regex")
    });
    let next_key = NEXT_KEY.get_or_init(|| {
        Regex::new(r"\s[A-Za-z][A-Za-z0-9_.]*\s*[:=]").expect("valid next key regex")
    });
    let value = desc.captures(text)?.get(1)?.as_str();
    let end = next_key.find(value).map_or(value.len(), |m| m.start());
    Some(value[..end].trim().to_string())
}

fn key_value(key: &str) -> String {
    format!(r"\b{key}\s*[:=]\s*{VALUE}")
}

fn tag_body(tag: &str) -> String {
    format!(r"<{tag}>\s*([^<]*?)\s*</{tag}>")
}

fn build_chains() -> Vec<FieldChain> {
    vec![
        FieldChain::new(
            Field::BusinessName,
            vec![
                Candidate::pattern(
                    "execute-service-bracket",
                    r"ExecuteService(?:Sync)?\(\)\s*:\s*\[\s*([^\]]*?)\s*\]",
                ),
                Candidate::pattern("br-token", r"\b(BR_[A-Za-z0-9_]+)"),
                Candidate::pattern(
                    "execute-service-call",
                    r#"ExecuteService\w*\(\s*["']?([A-Za-z_][\w.]*)["']?\s*[,)]"#,
                ),
                Candidate::pattern(
                    "execute-service-assign",
                    r#"ExecuteService\w*\s*[:=]\s*["']?([A-Za-z_][\w.]*)"#,
                ),
                Candidate::pattern(
                    "execute-service-word",
                    r"ExecuteService\w*\s+([A-Za-z_][\w.]*)",
                ),
                Candidate::pattern(
                    "key-value",
                    r#"(?i)\b(?:business|service|method|function)(?:\s*name)?\s*[:=]\s*["']?([A-Za-z_][\w.]*)"#,
                ),
                Candidate::pattern(
                    "capitalized-suffix",
                    r"\b([A-Z][A-Za-z0-9]*(?:Business|Service|Method|Function))\b",
                ),
                Candidate::pattern("upper-snake", r"\b([A-Z][A-Z0-9]*(?:_[A-Z0-9]+)+)\b"),
                Candidate::custom("xml-round-trip", same_tag_round_trip),
                Candidate::pattern(
                    "generic-suffix",
                    r"\b([A-Za-z_]\w*(?:EIF|IF|Manager|Handler|Controller))\b",
                ),
            ],
        )
        .accept(is_business_name),
        FieldChain::new(
            Field::ExecTime,
            vec![
                Candidate::pattern("exec-time-dotted", r"exec\.Time\s*[:=]\s*(\S+)"),
                Candidate::pattern("exec-time-camel", r"(?i)\bExecTime\s*[:=]\s*(\d+(?:\.\d+)?)"),
                Candidate::pattern("exec-time-korean", r"실행시간\s*[:=]\s*(\d+(?:\.\d+)?)\s*초"),
            ],
        )
        .finish(normalize_exec_time),
        FieldChain::new(
            Field::TxnId,
            vec![
                Candidate::pattern("txn-id", &key_value("TXN_ID")),
                Candidate::pattern(
                    "transaction-id",
                    &format!(r"(?i)\bTransaction\s*ID\s*[:=]\s*{VALUE}"),
                ),
                Candidate::pattern("txnid", &key_value("TXNID")),
                Candidate::pattern("txn-id-tag", &tag_body("TXN_?ID")),
            ],
        ),
        FieldChain::new(
            Field::MsgId,
            vec![
                Candidate::pattern("msg-id", &key_value("MSG_?ID")),
                Candidate::pattern(
                    "message-id",
                    &format!(r"(?i)\bMessage\s*ID\s*[:=]\s*{VALUE}"),
                ),
                Candidate::pattern("msg-id-json", &format!(r#""MSG_?ID"\s*:\s*"?{VALUE}"#)),
                Candidate::pattern("msg-id-tag", &tag_body("MSG_?ID")),
            ],
        ),
        FieldChain::new(
            Field::ProcId,
            vec![
                Candidate::pattern("proc-id", &key_value("PROC_?ID")),
                Candidate::pattern(
                    "process-id",
                    &format!(r"(?i)\bProcess\s*ID\s*[:=]\s*{VALUE}"),
                ),
                Candidate::pattern("proc-id-json", &format!(r#""PROC_?ID"\s*:\s*"?{VALUE}"#)),
                Candidate::pattern("proc-id-tag", &tag_body("PROC_?ID")),
            ],
        ),
        FieldChain::new(
            Field::MsgNo,
            vec![
                Candidate::pattern("msg-no-tag", &tag_body("MSG_?NO")),
                Candidate::pattern(
                    "msg-no-quoted",
                    r#"\bMSG_?NO(?:\s*[:=]\s*|\s+)["']([^"']+)["']"#,
                ),
                Candidate::pattern("msg-no-paren", r"\bMSG_?NO\s*\(\s*([^)]+?)\s*\)"),
                Candidate::pattern("msg-no-json", r#""MSG_?NO"\s*:\s*"?([^",}\s]+)"#),
                Candidate::pattern("msg-no", &key_value("MSG_?NO")),
            ],
        ),
        FieldChain::new(
            Field::BcrId,
            vec![Candidate::pattern("bcr-id", &key_value("BCR_?ID"))],
        ),
        FieldChain::new(
            Field::ReturnCode,
            vec![Candidate::pattern("return-code", &key_value("RETURN_?CODE"))],
        ),
        FieldChain::new(
            Field::WorkType,
            vec![Candidate::pattern("work-type", &key_value("WORK_?TYPE"))],
        ),
        FieldChain::new(
            Field::LineStop,
            vec![Candidate::pattern("line-stop", &key_value("LINE_?STOP"))],
        ),
        FieldChain::new(
            Field::LinePass,
            vec![Candidate::pattern("line-pass", &key_value("LINE_?PASS"))],
        ),
        FieldChain::new(
            Field::ErrorCode,
            vec![Candidate::pattern("error-code", &key_value("ERROR_?CODE"))],
        ),
        FieldChain::new(
            Field::ErrorCodeDesc,
            vec![Candidate::custom("error-code-desc", error_code_desc)],
        ),
        FieldChain::new(
            Field::BarcodeLot,
            BARCODE_TAGS
                .iter()
                .map(|&tag| Candidate::pattern(tag, &tag_body(tag)))
                .collect(),
        ),
    ]
}

fn chains() -> &'static [FieldChain] {
    static CHAINS: OnceLock<Vec<FieldChain>> = OnceLock::new();
    CHAINS.get_or_init(build_chains)
}

/// The candidate table for `field`.
pub fn chain(field: Field) -> &'static FieldChain {
    chains()
        .iter()
        .find(|c| c.field() == field)
        .unwrap_or_else(|| unreachable!("every field has a chain"))
}

/// Extract one field from `text`; the empty string means "not found".
pub fn extract(field: Field, text: &str) -> String {
    chain(field)
        .first_match(text)
        .map(|(value, _)| value)
        .unwrap_or_default()
}

/// Fill every still-empty field of `builder` from `text`.
///
/// Fields already set by the classifier or the session scanner are left
/// untouched, so their values always take precedence.
pub fn enrich(builder: LogRecordBuilder, text: &str) -> LogRecordBuilder {
    enrich_only(builder, text, &Field::ALL)
}

/// Like [`enrich`], restricted to `fields`.
pub fn enrich_only(mut builder: LogRecordBuilder, text: &str, fields: &[Field]) -> LogRecordBuilder {
    let record = builder.record_mut();
    for &field in fields {
        let slot = field.slot(record);
        if !slot.is_empty() {
            continue;
        }
        if let Some((value, label)) = chain(field).first_match(text) {
            tracing::trace!("{:?} <- {} ({})", field, value, label);
            *slot = value;
        }
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_record::LogLevel;

    fn winner(field: Field, text: &str) -> Option<&'static str> {
        chain(field).first_match(text).map(|(_, label)| label)
    }

    #[test]
    fn test_business_name_bracket_wins() {
        let text = "ExecuteService():[ SVC_B ] BR_OTHER";
        assert_eq!(extract(Field::BusinessName, text), "SVC_B");
        assert_eq!(winner(Field::BusinessName, text), Some("execute-service-bracket"));
    }

    #[test]
    fn test_business_name_br_token() {
        assert_eq!(extract(Field::BusinessName, "call BR_GET_LOT ok"), "BR_GET_LOT");
    }

    #[test]
    fn test_business_name_key_value() {
        assert_eq!(extract(Field::BusinessName, "Method: saveLot done"), "saveLot");
    }

    #[test]
    fn test_business_name_capitalized_suffix() {
        assert_eq!(extract(Field::BusinessName, "calling LotBusiness now"), "LotBusiness");
    }

    #[test]
    fn test_business_name_skips_reserved_keys() {
        assert_eq!(extract(Field::BusinessName, "TXN_ID : 1 PLC_LINE_1"), "PLC_LINE_1");
    }

    #[test]
    fn test_business_name_xml_round_trip() {
        assert_eq!(extract(Field::BusinessName, "<Lot><Qty>1</Qty></Lot>"), "Lot");
    }

    #[test]
    fn test_business_name_generic_suffix() {
        assert_eq!(extract(Field::BusinessName, "via lotManager"), "lotManager");
    }

    #[test]
    fn test_business_name_rejects_digits() {
        assert_eq!(extract(Field::BusinessName, "ExecuteService():[ 12345 ]"), "");
    }

    #[test]
    fn test_exec_time_candidates() {
        assert_eq!(extract(Field::ExecTime, "exec.Time : 00:00:03.125"), "03.125");
        assert_eq!(extract(Field::ExecTime, "ExecTime: 0.75"), "0.75");
        assert_eq!(extract(Field::ExecTime, "실행시간: 2.5초"), "2.5");
    }

    #[test]
    fn test_id_synonyms() {
        assert_eq!(extract(Field::TxnId, "TXN_ID : TXN002 :"), "TXN002");
        assert_eq!(extract(Field::TxnId, "Transaction ID = T-9"), "T-9");
        assert_eq!(extract(Field::MsgId, "<MSGID=M77>"), "M77");
        assert_eq!(extract(Field::ProcId, "Process ID: 4411"), "4411");
        assert_eq!(extract(Field::ProcId, "nothing here"), "");
    }

    #[test]
    fn test_msg_no_candidate_order() {
        assert_eq!(winner(Field::MsgNo, "<MSG_NO>17</MSG_NO> MSG_NO=99"), Some("msg-no-tag"));
        assert_eq!(extract(Field::MsgNo, "MSG_NO = 'A 1'"), "A 1");
        assert_eq!(extract(Field::MsgNo, "MSGNO(42)"), "42");
        assert_eq!(extract(Field::MsgNo, r#"{"MSG_NO": "55"}"#), "55");
        assert_eq!(extract(Field::MsgNo, "MSG_NO=7,"), "7");
        assert_eq!(chain(Field::MsgNo).candidates().len(), 5);
    }

    #[test]
    fn test_event_fields() {
        let text = "<BCR_ID=B1> <RETURN_CODE=0> <WORKTYPE=IN> <LINESTOP=N> \
                    <LINE_PASS=Y> <ERROR_CODE=E12> <ERROR_CODE_DESC=Scanner offline>";
        assert_eq!(extract(Field::BcrId, text), "B1");
        assert_eq!(extract(Field::ReturnCode, text), "0");
        assert_eq!(extract(Field::WorkType, text), "IN");
        assert_eq!(extract(Field::LineStop, text), "N");
        assert_eq!(extract(Field::LinePass, text), "Y");
        assert_eq!(extract(Field::ErrorCode, text), "E12");
        assert_eq!(extract(Field::ErrorCodeDesc, text), "Scanner offline");
    }

    #[test]
    fn test_error_code_desc_stops_at_next_key() {
        let text = "ERROR_CODE=E7 ERROR_CODE_DESC=Scanner offline RETURN_CODE=0";
        assert_eq!(extract(Field::ErrorCodeDesc, text), "Scanner offline");
        assert_eq!(extract(Field::ReturnCode, text), "0");
        assert_eq!(
            extract(Field::ErrorCodeDesc, "ERROR_CODE_DESC: Lot not found"),
            "Lot not found"
        );
    }

    #[test]
    fn test_barcode_priority() {
        let both = "<LOT_ID>L1</LOT_ID><BARCODE_VALUE>V1</BARCODE_VALUE>";
        assert_eq!(extract(Field::BarcodeLot, both), "V1");
        assert_eq!(extract(Field::BarcodeLot, "<LOT_ID>L1</LOT_ID>"), "L1");
        assert_eq!(
            extract(Field::BarcodeLot, "<BARCODE_NO> </BARCODE_NO><LOTID>L2</LOTID>"),
            "L2"
        );
        assert_eq!(extract(Field::BarcodeLot, "<OTHER>x</OTHER>"), "");
    }

    #[test]
    fn test_enrich_keeps_existing_values() {
        let builder = LogRecord::builder(1, LogLevel::Debug).txn_id("KEEP");
        let record = enrich(builder, "TXN_ID=OTHER MSG_ID=M1").build();
        assert_eq!(record.txn_id, "KEEP");
        assert_eq!(record.msg_id, "M1");
    }
}
