/*!
 * code2md - Bundle source files into a single Markdown document
 *
 * This library selects files from a project (respecting ignore rules),
 * then streams them into one Markdown document with a table of contents
 * and one fenced code block per file, ready for code review.
 */

pub mod error;

pub mod bundle;
pub mod config;
pub mod ignore_rules;
pub mod namer;
pub mod present;
pub mod report;
pub mod run_log;
pub mod scanner;
pub mod types;
pub mod utils;
pub mod writer;


// Re-export main components for easier access
pub use bundle::run_bundle;
pub use config::{Args, Config};
pub use error::{Code2MdError, Result};
pub use ignore_rules::IgnoreMatcher;
pub use present::{ClipboardPresenter, PathPresenter, Presenter};
pub use report::{BundleReport, FileReportInfo, ReportFormat, Reporter};
pub use run_log::RunLog;
pub use scanner::Scanner;
pub use types::{FenceStyle, FileDescriptor, FileOutcome, LogRecord, ScanResult, Severity};
pub use utils::format_file_size;
pub use writer::MarkdownWriter;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
