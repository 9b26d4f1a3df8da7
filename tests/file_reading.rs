//! Integration tests for reading log files from disk.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use gmeslog::core::file_reader::{read_and_parse, spawn_reader_thread, ReadRequest, ReaderMessage};
use gmeslog::LogKind;

/// Write `content` to a uniquely named file in the temp dir.
fn temp_log(name: &str, content: &[u8]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gmeslog_test_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn invalid_utf8_is_replaced_not_rejected() {
    let mut bytes = b"[01-06-2024 09:00:00] SVC_A 0.1 T1 bad ".to_vec();
    bytes.extend_from_slice(&[0xFF, 0xFE]);
    bytes.extend_from_slice(b" byte\n");
    let path = temp_log("LGE GMES_DATA_utf8.log", &bytes);

    let records = read_and_parse(&path, LogKind::Data).unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].content.contains('\u{FFFD}'));
}

#[test]
fn reader_parses_several_files() {
    let data = temp_log(
        "LGE GMES_DATA_reader.log",
        b"[01-06-2024 09:00:00] SVC_A 0.1 T1 ok\n[01-06-2024 09:00:01] SVC_B 0.2 T2 ok\n",
    );
    let debug = temp_log("LGE GMES_DEBUG_reader.log", b"[01-06-2024 09:00:00] hello\n");
    let missing = PathBuf::from("/definitely/not/LGE GMES_EVENT_x.log");

    let requests = vec![
        ReadRequest { path: data.clone(), kind: LogKind::Data },
        ReadRequest { path: debug.clone(), kind: LogKind::Debug },
        ReadRequest { path: missing.clone(), kind: LogKind::Event },
    ];
    let (tx, rx) = crossbeam_channel::unbounded();
    let handle = spawn_reader_thread(requests, tx, Arc::new(AtomicBool::new(false))).unwrap();
    handle.join().unwrap();

    let mut parsed = Vec::new();
    let mut errors = Vec::new();
    let mut complete = None;
    for message in rx.try_iter() {
        match message {
            ReaderMessage::Parsed { path, records, .. } => parsed.push((path, records.len())),
            ReaderMessage::Error { path, .. } => errors.push(path),
            ReaderMessage::Complete { files, total, .. } => complete = Some((files, total)),
        }
    }

    parsed.sort();
    let mut expected = vec![(data, 2), (debug, 1)];
    expected.sort();
    assert_eq!(parsed, expected);
    assert_eq!(errors, vec![missing]);
    assert_eq!(complete, Some((3, 3)));
}

#[test]
fn cancelled_reader_still_completes() {
    let path = temp_log("LGE GMES_DEBUG_cancel.log", b"[01-06-2024 09:00:00] hello\n");
    let (tx, rx) = crossbeam_channel::unbounded();
    let cancel = Arc::new(AtomicBool::new(true));
    let requests = vec![ReadRequest { path, kind: LogKind::Debug }];
    spawn_reader_thread(requests, tx, cancel).unwrap().join().unwrap();

    let messages: Vec<ReaderMessage> = rx.try_iter().collect();
    assert_eq!(messages.len(), 1);
    assert!(matches!(messages[0], ReaderMessage::Complete { total: 0, .. }));
}
