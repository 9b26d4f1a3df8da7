//! Core domain modules for GmesLog.
//!
//! Contains the record model, the line classifier, the session
//! reconstructor, the field extraction pipeline, content normalisation,
//! the parser entry points and the background file reader.

pub mod classifier;
pub mod content;
pub mod fields;
pub mod file_reader;
pub mod log_kind;
pub mod log_record;
pub mod parser;
pub mod session;
pub mod summary;
