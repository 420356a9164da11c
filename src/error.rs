//! Error types for stream operations and command evaluation.
//!
//! Display strings are the client-facing reply text.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by ID parsing, stream mutation and command evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Text could not be parsed as a stream ID.
    #[error("Invalid stream ID specified as stream command argument")]
    MalformedId,

    /// Explicit ID is not strictly greater than the stream's last ID.
    #[error("The ID specified in XADD is equal or smaller than the target stream top item")]
    NonMonotonicId,

    /// Explicit ID of 0-0.
    #[error("The ID specified in XADD must be greater than 0-0")]
    ZeroId,

    /// The stream's last ID is the maximum ID; nothing can follow it.
    #[error("The stream has exhausted the last possible ID,unable to add more items")]
    Exhausted,

    /// Incrementing the maximum ID.
    #[error("streamID overflow")]
    Overflow,

    /// Decrementing the minimum ID.
    #[error("streamID underflow")]
    Underflow,

    /// The key holds a value of another type.
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    /// Malformed or conflicting command options.
    #[error("{0}")]
    Syntax(String),

    /// Wrong number of arguments for the named command.
    #[error("wrong number of arguments for '{0}' command")]
    ArgumentCount(&'static str),

    /// The stream does not exist and creation was not allowed.
    #[error("stream does not exist")]
    NoSuchStream,

    /// An exclusive range bound cannot be stepped past the edge of the ID space.
    #[error("invalid {0} ID for the interval")]
    InvalidInterval(&'static str),

    /// MAXLEN threshold is not a non-negative integer.
    #[error("The MAXLEN argument must be >= 0.")]
    InvalidMaxLen,
}

impl Error {
    /// Plain `syntax error`.
    pub fn syntax() -> Self {
        Error::Syntax("syntax error".to_owned())
    }
}
