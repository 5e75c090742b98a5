//! Domain-specific errors.

use thiserror::Error;

/// Failures raised while splitting tags, parsing selectors, or resolving lines.
///
/// Every variant is an authoring mistake in a doc comment; messages are meant to be shown to the
/// author verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("{context} must be positive or negative, not zero")]
    ZeroLineNumber { context: &'static str },

    #[error("invalid {context}: '{token}'")]
    InvalidLineNumber {
        context: &'static str,
        token: String,
    },

    #[error("invalid range '{start}:{end}': start must not be greater than end")]
    InvalidRangeOrder { start: usize, end: usize },

    #[error(
        "BREAKING CHANGE: the dash syntax '{literal}' is no longer supported in v3.0.0+; \
         use colon syntax instead: '{suggestion}'"
    )]
    LegacyDashSyntax { literal: String, suggestion: String },

    #[error(
        "BREAKING CHANGE: the colon syntax '{tag}' is no longer supported in v3.0.0+; \
         use bracket syntax instead: '{suggestion}'"
    )]
    LegacyColonSyntax { tag: String, suggestion: String },

    #[error("line {line} is out of range (file has {total} lines)")]
    OutOfRange { line: i64, total: usize },

    #[error("malformed bracket syntax in '{tag}'")]
    MalformedSelector { tag: String },

    #[error("empty line selector in '{tag}'")]
    EmptySelector { tag: String },
}
