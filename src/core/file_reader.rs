//! Background log file reader.
//!
//! Reads and parses GMES log files on worker threads, one thread per file.
//! Parsed files are sent back through a [`crossbeam_channel`] sender as
//! [`ReaderMessage`]s; the caller drains the receiving end. Parses share
//! no state, so the threads never coordinate beyond the channel.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Sender;

use crate::core::log_kind::LogKind;
use crate::core::log_record::LogRecord;
use crate::core::parser::parse_file;
use crate::util::error::{read_err, GmesLogError, Result};
use crate::util::time::format_duration;

/// One file to parse and the kind to parse it as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub path: PathBuf,
    pub kind: LogKind,
}

/// Messages sent from the worker threads to the caller.
#[derive(Debug)]
pub enum ReaderMessage {
    /// A file was read and parsed.
    Parsed {
        path: PathBuf,
        kind: LogKind,
        records: Vec<LogRecord>,
    },
    /// A file could not be read. Non-fatal: other files continue.
    Error { path: PathBuf, error: String },
    /// All workers have finished.
    Complete {
        files: usize,
        total: usize,
        elapsed: std::time::Duration,
    },
}

/// Read a file as UTF-8 (invalid sequences replaced) and parse it.
pub fn read_and_parse(path: &Path, kind: LogKind) -> Result<Vec<LogRecord>> {
    let bytes = std::fs::read(path).map_err(|e| read_err(path, e))?;
    let content = String::from_utf8_lossy(&bytes);
    Ok(parse_file(&content, kind))
}

/// Spawn a coordinator thread that parses every request on its own worker
/// thread and reports through `sender`.
///
/// Set `cancel` to `true` to stop before files that have not started yet.
/// A [`ReaderMessage::Complete`] is always sent last.
pub fn spawn_reader_thread(
    requests: Vec<ReadRequest>,
    sender: Sender<ReaderMessage>,
    cancel: Arc<AtomicBool>,
) -> Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("log-reader".into())
        .spawn(move || reader_thread_main(requests, sender, cancel))
        .map_err(|e| GmesLogError::Thread(format!("Failed to spawn reader thread: {e}")))
}

fn reader_thread_main(
    requests: Vec<ReadRequest>,
    sender: Sender<ReaderMessage>,
    cancel: Arc<AtomicBool>,
) {
    let start = Instant::now();
    let files = requests.len();

    let total: usize = std::thread::scope(|scope| {
        let mut workers = Vec::with_capacity(files);
        for request in &requests {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            let spawned = std::thread::Builder::new()
                .name(format!("parse-{}", request.kind))
                .spawn_scoped(scope, {
                    let sender = sender.clone();
                    move || parse_one(request, &sender)
                });
            match spawned {
                Ok(handle) => workers.push((request, handle)),
                Err(e) => {
                    tracing::warn!("Could not spawn parser for {}: {}", request.path.display(), e);
                    let _ = sender.send(ReaderMessage::Error {
                        path: request.path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        workers
            .into_iter()
            .map(|(request, handle)| match handle.join() {
                Ok(count) => count,
                Err(_) => {
                    tracing::error!("Parser thread for {} panicked", request.path.display());
                    let _ = sender.send(ReaderMessage::Error {
                        path: request.path.clone(),
                        error: "parser thread panicked".into(),
                    });
                    0
                }
            })
            .sum()
    });

    let elapsed = start.elapsed();
    tracing::info!(
        "Reader complete: {} records from {} files in {}",
        total,
        files,
        format_duration(elapsed)
    );
    let _ = sender.send(ReaderMessage::Complete {
        files,
        total,
        elapsed,
    });
}

/// Parse one file and report it. Returns the number of records.
fn parse_one(request: &ReadRequest, sender: &Sender<ReaderMessage>) -> usize {
    let started = Instant::now();
    match read_and_parse(&request.path, request.kind) {
        Ok(records) => {
            let count = records.len();
            tracing::info!(
                "Parsed {} as {}: {} records in {}",
                request.path.display(),
                request.kind,
                count,
                format_duration(started.elapsed())
            );
            let _ = sender.send(ReaderMessage::Parsed {
                path: request.path.clone(),
                kind: request.kind,
                records,
            });
            count
        }
        Err(e) => {
            tracing::warn!("{}", e);
            let _ = sender.send(ReaderMessage::Error {
                path: request.path.clone(),
                error: e.to_string(),
            });
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_missing_file_is_an_error() {
        let err = read_and_parse(Path::new("/definitely/not/here.log"), LogKind::Debug).unwrap_err();
        assert!(err.to_string().contains("here.log"));
    }

    #[test]
    fn test_reader_reports_missing_files_and_completes() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let cancel = Arc::new(AtomicBool::new(false));
        let requests = vec![ReadRequest {
            path: PathBuf::from("/definitely/not/here.log"),
            kind: LogKind::Event,
        }];
        let handle = spawn_reader_thread(requests, tx, cancel).unwrap();
        handle.join().unwrap();

        let messages: Vec<ReaderMessage> = rx.try_iter().collect();
        assert!(matches!(messages.first(), Some(ReaderMessage::Error { .. })));
        assert!(matches!(
            messages.last(),
            Some(ReaderMessage::Complete { files: 1, total: 0, .. })
        ));
    }
}
