//! GmesLog library crate.
//!
//! Reconstructs free-form GMES plant-floor log files into structured
//! records. The binary entry point is in `main.rs`.

pub mod core;
pub mod export;
pub mod util;

pub use crate::core::log_kind::LogKind;
pub use crate::core::log_record::{LogLevel, LogRecord};
pub use crate::core::parser::{parse_file, parse_lines};
