//! Crate-level error type.
//!
//! Data-dependent problems never surface here: the parser reports them as
//! [`Diagnostic`](crate::parser::Diagnostic)s and the resolvers fall back to
//! the original text. This type only covers I/O, environment files, and
//! caller contract violations.

use thiserror::Error;

/// Errors raised by the file-level entry points of the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading a request file, environment file, or response body failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An environment file is not valid JSON.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An environment file is valid JSON but not a map of environments.
    #[error("invalid environment file: {0}")]
    InvalidEnvironment(String),

    /// The requested environment does not exist in the environment file.
    #[error("environment '{0}' not found")]
    EnvironmentNotFound(String),

    /// A file path argument was empty.
    #[error("file path must not be empty")]
    EmptyFilePath,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
