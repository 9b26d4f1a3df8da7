//! Integration tests for detecting the log kind from a file name.

use std::path::Path;
use std::str::FromStr;

use gmeslog::core::log_kind::LogFileName;
use gmeslog::LogKind;

#[test]
fn detects_every_kind_from_name() {
    for kind in LogKind::ALL {
        let name = format!("LGE GMES_{}_20240601.log", kind.as_str());
        assert_eq!(LogKind::from_path(Path::new(&name)), Some(kind), "{name}");
    }
}

#[test]
fn detects_kind_inside_directories() {
    let path = Path::new("/var/gmes/2024/LGE GMES_EXCEPTION_20240601.log");
    assert_eq!(LogKind::from_path(path), Some(LogKind::Exception));
}

#[test]
fn rejects_foreign_names() {
    assert_eq!(LogKind::from_path(Path::new("server.log")), None);
    assert_eq!(LogKind::from_path(Path::new("LGE GMES_AUDIT_20240601.log")), None);
}

#[test]
fn file_name_keeps_date_part() {
    let parsed = LogFileName::parse("LGE GMES_DATA_20240601.log").unwrap();
    assert_eq!(parsed.kind, LogKind::Data);
    assert_eq!(parsed.date, "20240601");
}

#[test]
fn kind_from_str_errors_name_the_input() {
    let err = LogKind::from_str("trace").unwrap_err();
    assert!(err.to_string().contains("trace"));
}
