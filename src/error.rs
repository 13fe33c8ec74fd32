//! Error types shared by every quickeda component.
//!
//! Everything that can go wrong during a session is user-facing and
//! non-fatal: a failed command leaves the session exactly as it was, and the
//! error's `Display` text is what the interface shows.
//!
//! ```
//! use quickeda::error::QuickEdaError;
//!
//! fn describe(err: &QuickEdaError) -> &'static str {
//!     match err {
//!         QuickEdaError::MissingPrerequisite(_) => "upload a file first",
//!         QuickEdaError::Precondition(_) | QuickEdaError::UnknownColumns(_) => "check the selection",
//!         _ => "something went wrong",
//!     }
//! }
//! ```

use std::fmt;

/// Main error type for quickeda operations.
#[derive(Debug)]
pub enum QuickEdaError {
    /// I/O errors (reading uploads, writing downloads)
    Io(std::io::Error),

    /// Data processing errors (Polars, spreadsheet parsing, etc.)
    DataProcessing(String),

    /// A transformation cannot run on the selected data
    Precondition(String),

    /// A request names columns that are not in the dataset
    UnknownColumns(Vec<String>),

    /// An operation was attempted before the state it needs exists
    MissingPrerequisite(String),

    /// Profiling or report rendering failed
    Report(String),

    /// Serializing a download failed
    Export(String),

    /// Configuration errors
    Config(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for QuickEdaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Precondition(msg) => write!(f, "Cannot apply transformation: {msg}"),
            Self::UnknownColumns(names) => {
                write!(f, "Unknown column(s): {}", names.join(", "))
            }
            Self::MissingPrerequisite(msg) => write!(f, "{msg}"),
            Self::Report(msg) => write!(f, "Report generation failed: {msg}"),
            Self::Export(msg) => write!(f, "Export failed: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for QuickEdaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for QuickEdaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for QuickEdaError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for QuickEdaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for QuickEdaError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl From<calamine::Error> for QuickEdaError {
    fn from(err: calamine::Error) -> Self {
        Self::DataProcessing(format!("spreadsheet: {err}"))
    }
}

impl From<rust_xlsxwriter::XlsxError> for QuickEdaError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Export(err.to_string())
    }
}

// Interface layers display errors as plain strings
impl From<QuickEdaError> for String {
    fn from(err: QuickEdaError) -> Self {
        err.to_string()
    }
}

/// Result type alias for quickeda operations.
pub type Result<T> = std::result::Result<T, QuickEdaError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<QuickEdaError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: QuickEdaError = e.into();
            QuickEdaError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: QuickEdaError = e.into();
            QuickEdaError::Other(format!("{}: {}", f(), err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QuickEdaError::Precondition("no columns selected".to_owned());
        assert_eq!(
            err.to_string(),
            "Cannot apply transformation: no columns selected"
        );

        let err = QuickEdaError::UnknownColumns(vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(err.to_string(), "Unknown column(s): a, b");
    }

    #[test]
    fn test_error_conversion_to_string() {
        let err = QuickEdaError::MissingPrerequisite("Upload a dataset first".to_owned());
        let s: String = err.into();
        assert_eq!(s, "Upload a dataset first");
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file.txt",
        ));

        let result: Result<()> = result.context("Failed to read upload");
        let message = result.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(message.contains("Failed to read upload"));
        assert!(message.contains("file.txt"));
    }
}
