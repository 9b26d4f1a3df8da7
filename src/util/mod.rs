//! Shared helpers: constants, error types and time normalisation.

pub mod constants;
pub mod error;
pub mod time;
