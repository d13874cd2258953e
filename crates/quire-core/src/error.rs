//! Error types for HTML conversion.
//!
//! Only two conditions surface to callers: input the tokenizer cannot read at
//! all, and requests to close a span kind that has no open/close lifecycle.
//! Malformed markup such as stray end tags or unparseable colors is recovered
//! from silently and only shows up in `debug` logs.

use miette::Diagnostic;

/// Main error type for conversion operations.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum ConvertError {
    /// The tokenizer could not read the input.
    #[error("failed to tokenize html: {0}")]
    #[diagnostic(
        code(quire::parse),
        help("conversion is deterministic, reject or log the input instead of retrying")
    )]
    Parse(String),

    /// A close was requested for a kind that is never opened by tag events.
    #[error("span kind `{kind}` has no open/close lifecycle")]
    #[diagnostic(code(quire::unsupported_style))]
    UnsupportedStyle { kind: &'static str },
}

impl From<std::io::Error> for ConvertError {
    fn from(err: std::io::Error) -> Self {
        ConvertError::Parse(err.to_string())
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
