//! Line classifier.
//!
//! Decides which record shape a single physical line has and extracts that
//! shape's fields in one pass. Shapes are tried in a fixed order and the
//! first one that matches wins:
//!
//! 1. ELEMENT event: `[ts] 123 [ELEMENT, ELEMENT={... <PROCID=P> ... <MSGID=M> ...}]`
//! 2. SENDDATA event: `[SENDDATA]` together with `DYNAMIC.EVENT.REQUEST`
//! 3. DATA: `[ts] <business> <exectime> <txnid> <rest>`
//! 4. DEBUG: `[ts] <rest>`

use std::sync::OnceLock;

use regex::Regex;

use crate::core::content::{collapse_whitespace, normalize_line};
use crate::core::fields::{extract, Field};
use crate::core::log_record::{LogLevel, LogRecord, LogRecordBuilder};
use crate::util::constants::{DEFAULT_EVENT_NAME, ELEMENT_EVENT_NAME};
use crate::util::time::{normalize_exec_time, normalize_timestamp};

const SENDDATA_TAG: &str = "[SENDDATA]";
const EVENT_REQUEST: &str = "DYNAMIC.EVENT.REQUEST";

fn element_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*\[(?P<ts>\d[^\]]*)\]\s+\d+\s+\[ELEMENT,\s*ELEMENT=\{(?P<body>.*)\}\]")
            .expect("valid element event regex")
    })
}

fn element_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<(?P<key>PROCID|MSGID)=(?P<value>[^>]*)>").expect("valid element tag regex")
    })
}

fn leading_ts_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\[(\d[^\]]*)\]").expect("valid leading timestamp regex"))
}

fn senddata_body_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"DYNAMIC\.EVENT\.REQUEST\s*[:=]?\s*(.*?\})\s*(?:\[|$)")
            .expect("valid senddata body regex")
    })
}

fn item_list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\d+,\d+=\{[^}]*\}\]").expect("valid item list regex"))
}

fn element_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[?ELEMENT,?\s*ELEMENT=\{[^}]*\}\]?|ELEMENT=\{[^}]*\}")
            .expect("valid element block regex")
    })
}

fn data_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*\[(?P<ts>\d[^\]]*)\]\s+(?P<business>\S+)\s+(?P<exec>\d+(?:[.:]\d+)*s?)\s+(?P<txn>\S+)(?:\s+(?P<rest>.*))?$",
        )
        .expect("valid data line regex")
    })
}

fn debug_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*\[(?P<ts>\d[^\]]*)\]\s*(?P<rest>.*)$").expect("valid debug line regex")
    })
}

/// Classify one physical line. Returns `None` when the line has no
/// recognisable shape.
pub fn classify(line: &str, line_number: usize) -> Option<LogRecord> {
    classify_builder(line, line_number).map(LogRecordBuilder::build)
}

/// Like [`classify`], but leaves the record open so callers can enrich it
/// before it is built.
pub fn classify_builder(line: &str, line_number: usize) -> Option<LogRecordBuilder> {
    classify_element(line, line_number)
        .or_else(|| classify_senddata(line, line_number))
        .or_else(|| classify_data(line, line_number))
        .or_else(|| classify_debug(line, line_number))
}

/// Extract a balanced `KEY={...}` section starting at `key`.
fn balanced_section<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let start = text.find(key)?;
    let open = start + key.len() - 1;
    let mut depth = 0usize;
    for (offset, c) in text[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=open + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

fn classify_element(line: &str, line_number: usize) -> Option<LogRecordBuilder> {
    let caps = element_re().captures(line)?;
    let body = caps.name("body")?.as_str();

    let mut proc_id = None;
    let mut msg_id = None;
    for tag in element_tag_re().captures_iter(body) {
        let value = tag["value"].trim().to_string();
        match &tag["key"] {
            "PROCID" if proc_id.is_none() => proc_id = Some(value),
            "MSGID" if msg_id.is_none() => msg_id = Some(value),
            _ => {}
        }
    }
    let (proc_id, msg_id) = (proc_id?, msg_id?);

    let raw_ts = &caps["ts"];
    let content = format!("[ELEMENT, ELEMENT={{<PROCID={proc_id}> <MSGID={msg_id}>}}]");
    Some(
        LogRecord::builder(line_number, LogLevel::Event)
            .timestamp(normalize_timestamp(raw_ts))
            .raw_timestamp(raw_ts)
            .business_name(ELEMENT_EVENT_NAME)
            .proc_id(proc_id)
            .msg_id(msg_id)
            .content(content),
    )
}

fn classify_senddata(line: &str, line_number: usize) -> Option<LogRecordBuilder> {
    if !line.contains(SENDDATA_TAG) || !line.contains(EVENT_REQUEST) {
        return None;
    }

    let body = match senddata_body_re().captures(line) {
        Some(caps) => caps[1].trim().to_string(),
        None => {
            let after = line.find(EVENT_REQUEST).map_or("", |i| &line[i + EVENT_REQUEST.len()..]);
            after.trim().to_string()
        }
    };

    let msg_id = extract(Field::MsgId, &body);
    let proc_id = extract(Field::ProcId, &body);
    let business_name = if proc_id.is_empty() {
        DEFAULT_EVENT_NAME.to_string()
    } else {
        format!("PROC_{proc_id}")
    };

    let content = if let Some(items) = balanced_section(&body, "ITEM={") {
        items.to_string()
    } else {
        let list: Vec<&str> = item_list_re().find_iter(&body).map(|m| m.as_str()).collect();
        if list.is_empty() {
            collapse_whitespace(&element_block_re().replace_all(&body, " "))
        } else {
            list.join(" ")
        }
    };

    let raw_ts = leading_ts_re()
        .captures(line)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    Some(
        LogRecord::builder(line_number, LogLevel::Event)
            .timestamp(normalize_timestamp(&raw_ts))
            .raw_timestamp(raw_ts)
            .business_name(business_name)
            .msg_id(msg_id)
            .proc_id(proc_id)
            .content(content),
    )
}

fn classify_data(line: &str, line_number: usize) -> Option<LogRecordBuilder> {
    let caps = data_re().captures(line)?;
    let raw_ts = &caps["ts"];
    let rest = caps.name("rest").map_or("", |m| m.as_str());
    Some(
        LogRecord::builder(line_number, LogLevel::Data)
            .timestamp(normalize_timestamp(raw_ts))
            .raw_timestamp(raw_ts)
            .business_name(&caps["business"])
            .exec_time(normalize_exec_time(&caps["exec"]))
            .txn_id(&caps["txn"])
            .content(normalize_line(rest)),
    )
}

fn classify_debug(line: &str, line_number: usize) -> Option<LogRecordBuilder> {
    let caps = debug_re().captures(line)?;
    let raw_ts = &caps["ts"];
    Some(
        LogRecord::builder(line_number, LogLevel::Debug)
            .timestamp(normalize_timestamp(raw_ts))
            .raw_timestamp(raw_ts)
            .content(normalize_line(&caps["rest"])),
    )
}
