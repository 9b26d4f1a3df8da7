//! Integration tests for error type construction and display.

use std::error::Error as _;

use gmeslog::util::error::{read_err, GmesLogError};

#[test]
fn read_error_displays_path_and_cause() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
    let err = read_err("/logs/LGE GMES_DATA_20240601.log", io_err);
    let msg = err.to_string();
    assert!(
        msg.contains("LGE GMES_DATA_20240601.log"),
        "Error message should contain the path: {msg}"
    );
    assert!(msg.contains("no such file"), "Should contain cause: {msg}");
    assert!(err.source().is_some(), "I/O cause should be chained");
}

#[test]
fn unknown_kind_preserves_name() {
    let err = GmesLogError::UnknownLogKind("notes.txt".into());
    let msg = err.to_string();
    assert!(msg.contains("notes.txt"), "Should contain detail: {msg}");
}

#[test]
fn export_error_preserves_message() {
    let err = GmesLogError::Export("disk full".into());
    let msg = err.to_string();
    assert!(msg.contains("disk full"), "Should contain detail: {msg}");
}

#[test]
fn io_error_converts() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no access");
    let err: GmesLogError = io_err.into();
    let msg = err.to_string();
    assert!(msg.contains("no access"), "Should preserve IO error: {msg}");
}

#[test]
fn thread_error_displays() {
    let err = GmesLogError::Thread("worker panicked".into());
    assert!(err.to_string().contains("worker panicked"));
}
