//! Error types for unquiz library.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for unquiz operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while parsing question banks.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is neither a DOCX container nor readable text.
    #[error("Unknown file format: not a DOCX document")]
    UnknownFormat,

    /// The input is a recognized but unsupported container (e.g. legacy .doc).
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// The ZIP container could not be read.
    #[error("Archive error: {0}")]
    Archive(String),

    /// A required part is missing from the container.
    #[error("Missing document part: {0}")]
    MissingPart(String),

    /// Malformed XML in a document part.
    #[error("XML error in {part}: {message}")]
    Xml { part: String, message: String },

    /// An external collaborator (rasterizer, table renderer, media store) failed.
    #[error("{collaborator} failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    /// An external collaborator did not finish in time.
    #[error("{collaborator} timed out after {timeout:?}")]
    Timeout {
        collaborator: &'static str,
        timeout: Duration,
    },

    /// The parse was cancelled by the caller.
    #[error("Parse cancelled")]
    Cancelled,

    /// Error during rendering (JSON, report).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a collaborator failure.
    pub fn collaborator(collaborator: &'static str, message: impl Into<String>) -> Self {
        Error::Collaborator {
            collaborator,
            message: message.into(),
        }
    }

    /// Build an XML error for the named part.
    pub fn xml(part: impl Into<String>, message: impl ToString) -> Self {
        Error::Xml {
            part: part.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error only concerns a single media item.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Collaborator { .. } | Error::Timeout { .. })
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            zip::result::ZipError::FileNotFound => Error::MissingPart("archive entry".into()),
            _ => Error::Archive(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(format!("JSON serialization error: {}", err))
    }
}
