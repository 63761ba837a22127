//! Error types for Simsh
//!
//! Display strings are the Unix-style reason text only (`No such file or
//! directory`, `File exists`, ...). Handlers prefix them with the command
//! name and the operand the user typed, so the same error renders as
//! `cat: notes.txt: No such file or directory` or
//! `rm: cannot remove 'notes.txt': No such file or directory`.

use crate::limits::LimitExceeded;
use thiserror::Error;

/// Result type alias using Simsh's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Simsh error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Referenced path does not exist.
    #[error("No such file or directory")]
    NotFound(String),

    /// Expected a file, found a directory.
    #[error("Is a directory")]
    IsADirectory(String),

    /// Expected a directory, found a file.
    #[error("Not a directory")]
    NotADirectory(String),

    /// Creation target is already occupied.
    #[error("File exists")]
    AlreadyExists(String),

    /// Required argument(s) absent.
    #[error("missing {0}")]
    MissingOperand(&'static str),

    /// Unknown command, subcommand, option or protocol.
    #[error("{0}")]
    Unsupported(String),

    /// Simulated remote endpoint refused the connection.
    #[error("connect to host {host} port {port}: Connection refused")]
    ConnectionRefused { host: String, port: u16 },

    /// Store limit exceeded.
    #[error("{0}")]
    LimitExceeded(#[from] LimitExceeded),

    /// Session id is not known to the shell.
    #[error("session {0} not found")]
    SessionNotFound(u64),

    /// Internal error for unexpected failures.
    ///
    /// Recovered handler panics end up here. The message never carries the
    /// panic payload.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure taxonomy shared by every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    NotFound,
    WrongType,
    AlreadyExists,
    MissingOperand,
    UnsupportedOperation,
    SimulatedNetworkFailure,
    ResourceLimit,
    Internal,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::NotFound(_) | Error::SessionNotFound(_) => FailureKind::NotFound,
            Error::IsADirectory(_) | Error::NotADirectory(_) => FailureKind::WrongType,
            Error::AlreadyExists(_) => FailureKind::AlreadyExists,
            Error::MissingOperand(_) => FailureKind::MissingOperand,
            Error::Unsupported(_) => FailureKind::UnsupportedOperation,
            Error::ConnectionRefused { .. } => FailureKind::SimulatedNetworkFailure,
            Error::LimitExceeded(_) => FailureKind::ResourceLimit,
            Error::Internal(_) => FailureKind::Internal,
        }
    }

    /// The path this error refers to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::NotFound(p)
            | Error::IsADirectory(p)
            | Error::NotADirectory(p)
            | Error::AlreadyExists(p) => Some(p),
            _ => None,
        }
    }
}
