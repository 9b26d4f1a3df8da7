//! Record output for the command-line tool.
//!
//! Both writers target any `io::Write` so records can go to stdout or a file.

pub mod csv_export;
pub mod json_export;
