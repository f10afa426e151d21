//! Global error handling for code2md
//!
//! Fatal errors (`Config`, `Write`) abort a run before or while the document
//! is produced. The remaining variants describe failures that the scanner,
//! the matcher and the writer recover from locally; they are still typed so
//! they can be rendered consistently in the run log.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Global error type for code2md operations
#[derive(Error, Debug)]
pub enum Code2MdError {
    /// No usable project root, unreadable settings or an invalid selection
    #[error("Configuration error: {0}")]
    Config(String),

    /// A directory could not be listed
    #[error("Error reading directory {}: {source}", path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A selected file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The output document could not be written or closed
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An ignore pattern could not be parsed
    #[error("Invalid ignore pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// Nothing matched the selection
    #[error("No matching files found")]
    NoMatchingFiles,

    /// The finished document could not be handed to the clipboard
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Settings file errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regular expression errors
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// Specialized Result type for code2md operations
pub type Result<T> = std::result::Result<T, Code2MdError>;

/// Creates a Code2MdError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::Code2MdError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

impl Code2MdError {
    /// Attach the output path to an I/O failure while producing the document
    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Whether this error ends the run (as opposed to being recovered locally)
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::DirectoryRead { .. } | Self::FileRead { .. } | Self::Pattern { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_mentions_path() {
        let err = Code2MdError::write(
            "/tmp/codereview/out.md",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("/tmp/codereview/out.md"));
        assert!(message.contains("denied"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_recoverable_errors() {
        let err = Code2MdError::Pattern {
            pattern: "[".to_string(),
            message: "unclosed class".to_string(),
        };
        assert!(!err.is_fatal());
        assert!(Code2MdError::NoMatchingFiles.is_fatal());
    }

    fn check_root(exists: bool) -> Result<()> {
        ensure!(exists, Config, "Project root not found: {}", "/nowhere");
        Ok(())
    }

    #[test]
    fn test_ensure_macro() {
        assert!(check_root(true).is_ok());
        match check_root(false) {
            Err(Code2MdError::Config(msg)) => assert!(msg.contains("/nowhere")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
