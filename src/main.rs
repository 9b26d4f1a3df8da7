//! GmesLog: reconstruct GMES plant-floor log files into structured records.
//!
//! Entry point: parses command-line arguments, initialises structured
//! logging, parses every file on background threads and writes the
//! records to stdout.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing_subscriber::Layer as _;

use gmeslog::core::file_reader::{spawn_reader_thread, ReadRequest, ReaderMessage};
use gmeslog::core::log_kind::LogKind;
use gmeslog::core::log_record::LogRecord;
use gmeslog::core::summary::summarize;
use gmeslog::export::{csv_export, json_export};
use gmeslog::util::constants;
use gmeslog::util::error::GmesLogError;

/// Output format of the records written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

/// Log kind accepted by `--kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Data,
    Event,
    Debug,
    Exception,
}

impl From<KindArg> for LogKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Data => LogKind::Data,
            KindArg::Event => LogKind::Event,
            KindArg::Debug => LogKind::Debug,
            KindArg::Exception => LogKind::Exception,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "gmeslog", version, about = "Reconstruct GMES log files into structured records")]
struct Cli {
    /// Log files named `LGE GMES_<TYPE>_<date>.log`.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Parse every file as this kind instead of detecting it from the name.
    #[arg(long, value_enum)]
    kind: Option<KindArg>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Write a per-business-name summary instead of the records.
    #[arg(long)]
    summary: bool,

    /// Also write debug-level diagnostics to this file (or to
    /// `gmeslog.log` inside it when it is a directory).
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref());

    tracing::info!("{} v{} starting", constants::APP_NAME, constants::APP_VERSION);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Resolve kinds, parse all files and write the output.
fn run(cli: &Cli) -> Result<(), GmesLogError> {
    let requests = cli
        .files
        .iter()
        .map(|path| {
            let kind = match cli.kind {
                Some(kind) => Some(kind.into()),
                None => LogKind::from_path(path),
            };
            kind.map(|kind| ReadRequest {
                path: path.clone(),
                kind,
            })
            .ok_or_else(|| GmesLogError::UnknownLogKind(path.display().to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let records = collect_records(&requests)?;

    let stdout = std::io::stdout().lock();
    match (cli.summary, cli.format) {
        (false, OutputFormat::Json) => json_export::write_json(&records, stdout),
        (false, OutputFormat::Csv) => csv_export::write_csv(&records, stdout),
        (true, OutputFormat::Json) => json_export::write_summary_json(&summarize(&records), stdout),
        (true, OutputFormat::Csv) => csv_export::write_summary_csv(&summarize(&records), stdout),
    }
}

/// Parse every request on the background reader and gather the records in
/// the order the files were given.
fn collect_records(requests: &[ReadRequest]) -> Result<Vec<LogRecord>, GmesLogError> {
    let (sender, receiver) = crossbeam_channel::unbounded();
    let cancel = Arc::new(AtomicBool::new(false));
    let handle = spawn_reader_thread(requests.to_vec(), sender, cancel)?;

    let mut parsed: Vec<(PathBuf, Vec<LogRecord>)> = Vec::with_capacity(requests.len());
    let mut failures = 0usize;
    for message in receiver.iter() {
        match message {
            ReaderMessage::Parsed { path, records, .. } => parsed.push((path, records)),
            ReaderMessage::Error { path, error } => {
                failures += 1;
                eprintln!("warning: {}: {error}", path.display());
            }
            ReaderMessage::Complete { .. } => break,
        }
    }

    handle
        .join()
        .map_err(|_| GmesLogError::Thread("reader thread panicked".into()))?;

    if failures > 0 && parsed.is_empty() {
        return Err(GmesLogError::Thread(format!(
            "none of the {failures} file(s) could be read"
        )));
    }

    let mut records = Vec::new();
    for request in requests {
        if let Some(pos) = parsed.iter().position(|(path, _)| *path == request.path) {
            let (_, file_records) = parsed.swap_remove(pos);
            records.extend(file_records);
        }
    }
    Ok(records)
}

/// Resolve `--log-file` to a file path and rotate it if it has grown past
/// the size limit.
fn resolve_log_file(path: &Path) -> PathBuf {
    let log_path = if path.is_dir() {
        path.join(constants::LOG_FILE_NAME)
    } else {
        path.to_path_buf()
    };

    if let Ok(meta) = std::fs::metadata(&log_path) {
        if meta.len() > constants::MAX_LOG_FILE_SIZE {
            let backup = log_path.with_extension("log.old");
            let _ = std::fs::rename(&log_path, &backup);
        }
    }
    log_path
}

/// Initialise the tracing subscriber.
///
/// - **stderr layer**: filtered by `RUST_LOG` env var (default: `warn`).
/// - **file layer** (if `log_file` is `Some`): always writes at `debug`
///   level for post-mortem diagnostics.
fn init_logging(log_file: Option<&Path>) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    if let Some(path) = log_file {
        let log_path = resolve_log_file(path);
        if let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
        {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .with_filter(tracing_subscriber::EnvFilter::new("debug"));

            tracing_subscriber::registry()
                .with(stderr_layer.with_filter(env_filter))
                .with(file_layer)
                .init();
            return;
        }
    }

    // Fallback: stderr only
    tracing_subscriber::registry()
        .with(stderr_layer.with_filter(env_filter))
        .init();
}
