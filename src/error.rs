//! Errors raised while building the transform.

use thiserror::Error;

/// Failure to turn the replacement tables into expressions.
#[derive(Debug, Error)]
pub enum UngapError {
    /// A replacement table entry that does not parse as an expression. This is a
    /// bug in the tables, never bad user input.
    #[error("replacement for `{module}` is not a valid expression: `{text}`")]
    MalformedReplacement { module: String, text: String },
}

pub type Result<T, E = UngapError> = std::result::Result<T, E>;
