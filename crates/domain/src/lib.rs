//! Shared types for the cadence workspace: the error taxonomy, configuration
//! structs, and structured trace events.

pub mod config;
pub mod error;
pub mod trace;

pub use error::{DurationError, Error, Result};
