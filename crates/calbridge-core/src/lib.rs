//! Core types: JSON envelope, error kinds, input times, tracing

pub mod envelope;
pub mod text;
pub mod time;
pub mod tracing;

pub use envelope::{ErrorEnvelope, ErrorKind, Status, Step, Success, render_line, render_pretty};
pub use text::truncate_chars;
pub use time::{InputTime, TimeParseError, to_query_bound};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
