/*!
 * Core types and data structures for code2md
 */

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use strum::{Display, EnumString};

use crate::utils::{extension_of, relative_display_path};

/// One selected input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Lowercased extension without the leading dot (empty if none)
    pub extension: String,
    /// Forward-slash path relative to the project root, used for display and anchors
    pub relative: String,
}

impl FileDescriptor {
    /// Describe `path` relative to `project_root`.
    ///
    /// Paths outside the project root are displayed by their file name only.
    pub fn new(path: impl Into<PathBuf>, project_root: &Path) -> Self {
        let path = path.into();
        Self {
            extension: extension_of(&path),
            relative: relative_display_path(&path, project_root),
            path,
        }
    }
}

/// Outcome of a directory scan
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Selected files in lexicographic depth-first order
    pub files: Vec<FileDescriptor>,
    /// Relative paths that were excluded by the ignore rules
    pub excluded: Vec<String>,
}

impl ScanResult {
    /// Append another result, keeping order
    pub fn extend(&mut self, other: ScanResult) {
        self.files.extend(other.files);
        self.excluded.extend(other.excluded);
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Severity of a run log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// A single timestamped diagnostic record
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
}

impl LogRecord {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            message: message.into(),
        }
    }

    /// Render as `[<ISO-8601>] [<LEVEL>] <message>`
    pub fn to_line(&self) -> String {
        format!(
            "[{}] [{}] {}",
            self.timestamp
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            self.severity,
            self.message
        )
    }
}

/// How code fences are chosen for file content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FenceStyle {
    /// Always three backticks. Content containing ``` will break the block.
    #[default]
    Plain,
    /// One backtick longer than the longest backtick run in the content
    Adaptive,
}

/// Per-file result of writing the document
#[derive(Debug, Clone)]
pub enum FileOutcome {
    /// Content was written into the body
    Written { lines: usize, bytes: usize },
    /// The file could not be read; a failure note was written instead
    Failed { reason: String },
}
