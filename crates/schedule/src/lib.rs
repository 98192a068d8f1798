//! Extended cron parsing, occurrence search and the unified expression
//! façade.

pub mod engine;
pub mod field;
pub mod model;
pub mod parser;
pub mod unified;
pub mod validation;

pub use engine::{end_of, is_match, next, next_n, prev, Engine};
pub use model::{Schedule, Special};
pub use parser::{parse_cron_only, parse_extended, parse_hybrid, ParsedExtensions};
pub use unified::{compute_next, end_of_expression, is_time_match, parse_expression, Expression};
pub use validation::validate_timezone;
