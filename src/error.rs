//! Error types for the rikai pattern pipeline.
//!
//! One flat enum covering every error kind the pipeline can raise, with a
//! hand-written `Display`/`Error` impl rather than a derive macro, so each
//! variant controls exactly how it renders.

use std::fmt;

/// Errors raised while loading, parsing, or matching behavior patterns.
#[derive(Debug, Clone)]
pub enum RikaiError {
    /// The rule file's YAML envelope is missing a required field.
    MalformedRule(String),
    /// The rule-language text did not match the grammar.
    ParseError {
        message: String,
        line: usize,
        column: usize,
    },
    /// A token in operand position was neither a valid integer, string,
    /// enum name, nor identifier.
    MalformedLiteral(String),
    /// A matcher asked for a database that does not exist.
    UnknownDatabase(String),
    /// The external ingest tool exited non-zero.
    IngestFailed { exit_code: Option<i32>, stderr: String },
    /// The database rejected the generated query.
    QueryExecutionError(String),
}

impl fmt::Display for RikaiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RikaiError::MalformedRule(s) => write!(f, "malformed rule: {s}"),
            RikaiError::ParseError {
                message,
                line,
                column,
            } => write!(f, "parse error at {line}:{column}: {message}"),
            RikaiError::MalformedLiteral(s) => write!(f, "malformed literal: {s}"),
            RikaiError::UnknownDatabase(name) => write!(f, "database '{name}' does not exist"),
            RikaiError::IngestFailed { exit_code, stderr } => write!(
                f,
                "ingest failed (exit {}): {}",
                exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
                stderr
            ),
            RikaiError::QueryExecutionError(s) => write!(f, "query execution error: {s}"),
        }
    }
}

impl std::error::Error for RikaiError {}

impl From<serde_yaml::Error> for RikaiError {
    fn from(e: serde_yaml::Error) -> Self {
        RikaiError::MalformedRule(e.to_string())
    }
}

