//! Integration tests for JSON and CSV output.

use gmeslog::core::summary::summarize;
use gmeslog::export::csv_export::{write_csv, write_summary_csv, CSV_HEADERS};
use gmeslog::export::json_export::{write_json, write_summary_json};
use gmeslog::{parse_file, LogKind};

const CONTENT: &str = "[01-06-2024 09:00:00] SVC_A 0.500 TXN001 first\n\
[01-06-2024 09:00:01] SVC_A 1.500 TXN002 second\n\
[01-06-2024 09:00:02] SVC_B 0.250 TXN003 third\n";

#[test]
fn json_array_has_one_object_per_record() {
    let records = parse_file(CONTENT, LogKind::Data);
    let mut out = Vec::new();
    write_json(&records, &mut out).unwrap();

    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let array = value.as_array().expect("top-level array");
    assert_eq!(array.len(), 3);
    assert_eq!(array[2]["business_name"], "SVC_B");
    assert_eq!(array[2]["log_level"], "DATA");
    assert!(out.ends_with(b"\n"));
}

#[test]
fn csv_has_header_and_rows() {
    let records = parse_file(CONTENT, LogKind::Data);
    let mut out = Vec::new();
    write_csv(&records, &mut out).unwrap();

    let mut reader = csv::Reader::from_reader(out.as_slice());
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, CSV_HEADERS);
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[1][5], "TXN002");
}

#[test]
fn csv_empty_input_writes_header_only() {
    let mut out = Vec::new();
    write_csv(&[], &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("Line,Level,Timestamp"));
}

#[test]
fn summary_outputs() {
    let summaries = summarize(&parse_file(CONTENT, LogKind::Data));
    assert_eq!(summaries.len(), 2);

    let mut json = Vec::new();
    write_summary_json(&summaries, &mut json).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(value[0]["business_name"], "SVC_A");
    assert_eq!(value[0]["count"], 2);

    let mut csv_out = Vec::new();
    write_summary_csv(&summaries, &mut csv_out).unwrap();
    let text = String::from_utf8(csv_out).unwrap();
    assert!(
        text.contains("SVC_A,2,0,1.000,1.500,2024-06-01 09:00:00,2024-06-01 09:00:01"),
        "Unexpected summary CSV: {text}"
    );
}
