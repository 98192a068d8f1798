//! EOD/SOD duration calculus: parse `S`/`E` notation and evaluate it
//! against a reference instant in any timezone.

pub mod calc;
pub mod calendar;
pub mod helpers;
pub mod model;
pub mod parse;

pub use calc::calculate_end_date;
pub use model::{EndOfDuration, ReferencePoint};
pub use parse::{is_valid, parse_duration, MAX_MAGNITUDE};
