//! Errors that can occur while running a parse.

use std::fmt;

/// The input does not match the grammar.
///
/// Fatal to the parse that raised it. Running out of input is not a parse
/// error: it suspends the parse instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Stream offset where matching failed.
    pub position: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at offset {}: {}", self.position, self.message)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    #[error("parse error {0}")]
    Parse(#[from] ParseError),

    /// Execution fuel exhausted (too many instructions in one resume).
    #[error("runtime execution limit exceeded")]
    ExecFuelExhausted,

    /// Too many nested routine calls.
    #[error("runtime recursion limit exceeded")]
    RecursionLimitExceeded,

    #[error("unknown parser `{0}`")]
    UnknownParser(String),

    #[error("parser `{parser}` takes {expected} arguments, {given} given")]
    ArgumentCount {
        parser: String,
        expected: usize,
        given: usize,
    },

    #[error("program calls unregistered hook `{0}`")]
    UnknownHook(String),

    #[error("program calls unregistered filter `{0}`")]
    UnknownFilter(String),

    #[error("hook `{name}` failed: {message}")]
    Hook { name: String, message: String },

    #[error("filter `{name}` failed: {message}")]
    Filter { name: String, message: String },

    /// An expression was applied to a value of the wrong type.
    #[error("type error: {0}")]
    Type(String),

    #[error("invalid token table `{name}`: {message}")]
    TokenTable { name: String, message: String },
}

impl RuntimeError {
    /// The parse error, when the input itself was rejected.
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}
