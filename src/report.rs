/*!
 * Reporting functionality for code2md
 *
 * Renders the outcome of a bundle run as console tables using the tabled
 * library.
 */

use std::time::Duration;

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::types::FileOutcome;
use crate::utils::format_file_size;

/// Files listed individually before the table is cut short
const MAX_LISTED_FILES: usize = 15;

/// Information about a file in the report
#[derive(Debug, Clone)]
pub struct FileReportInfo {
    /// Path relative to the project root
    pub path: String,
    /// What happened to the file
    pub outcome: FileOutcome,
}

/// Statistics for a bundle run
#[derive(Debug, Clone)]
pub struct BundleReport {
    /// Absolute output document path
    pub output_file: String,
    /// Absolute run log path, if the log could be written
    pub log_file: Option<String>,
    /// Time taken for scan and write
    pub duration: Duration,
    /// Number of selected files
    pub total_files: usize,
    /// Files whose content made it into the document
    pub files_written: usize,
    /// Files that could not be read
    pub files_failed: usize,
    /// Paths skipped by the ignore rules
    pub excluded: usize,
    /// Total lines written
    pub total_lines: usize,
    /// Total bytes of file content written
    pub total_bytes: usize,
    /// Details for each file, in document order
    pub file_details: Vec<FileReportInfo>,
}

impl BundleReport {
    /// "Processed N of M files"
    pub fn summary_line(&self) -> String {
        format!(
            "Processed {} of {} files",
            self.files_written, self.total_files
        )
    }
}

/// Format of the report output
pub enum ReportFormat {
    /// Console table output
    ConsoleTable,
    // Other formats could be added in the future
}

/// Report generator for bundle results
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Generate a report string
    pub fn generate_report(&self, report: &BundleReport) -> String {
        match self.format {
            ReportFormat::ConsoleTable => self.generate_console_report(report),
        }
    }

    /// Print the report to stdout
    pub fn print_report(&self, report: &BundleReport) {
        println!("\n{}", self.generate_report(report));
    }

    fn create_summary_table(&self, report: &BundleReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let mut rows = vec![
            SummaryRow {
                key: "Output File".to_string(),
                value: report.output_file.clone(),
            },
            SummaryRow {
                key: "Log File".to_string(),
                value: report
                    .log_file
                    .clone()
                    .unwrap_or_else(|| "(not written)".to_string()),
            },
            SummaryRow {
                key: "Process Time".to_string(),
                value: format!("{:.4?}", report.duration),
            },
            SummaryRow {
                key: "Files".to_string(),
                value: report.summary_line(),
            },
            SummaryRow {
                key: "Total Lines".to_string(),
                value: report.total_lines.to_string(),
            },
            SummaryRow {
                key: "Total Size".to_string(),
                value: format_file_size(report.total_bytes as u64),
            },
            SummaryRow {
                key: "Ignored Paths".to_string(),
                value: report.excluded.to_string(),
            },
        ];

        if report.files_failed > 0 {
            rows.push(SummaryRow {
                key: "Unreadable Files".to_string(),
                value: report.files_failed.to_string(),
            });
        }

        style(Table::new(rows))
    }

    fn create_files_table(&self, report: &BundleReport) -> String {
        #[derive(Tabled)]
        struct FileRow {
            #[tabled(rename = "File Path")]
            path: String,

            #[tabled(rename = "Lines")]
            lines: String,

            #[tabled(rename = "Size")]
            size: String,
        }

        let rows: Vec<FileRow> = report
            .file_details
            .iter()
            .take(MAX_LISTED_FILES)
            .map(|info| match &info.outcome {
                FileOutcome::Written { lines, bytes } => FileRow {
                    path: info.path.clone(),
                    lines: lines.to_string(),
                    size: format_file_size(*bytes as u64),
                },
                FileOutcome::Failed { reason } => FileRow {
                    path: info.path.clone(),
                    lines: "-".to_string(),
                    size: format!("unreadable: {}", reason),
                },
            })
            .collect();

        style(Table::new(rows))
    }

    fn generate_console_report(&self, report: &BundleReport) -> String {
        let files_table = self.create_files_table(report);
        let summary_table = self.create_summary_table(report);

        let files_title = if report.file_details.len() > MAX_LISTED_FILES {
            format!(
                "BUNDLED FILES (first {} of {})",
                MAX_LISTED_FILES,
                report.file_details.len()
            )
        } else {
            "BUNDLED FILES".to_string()
        };

        format!(
            "{}\n{}\n\n{}\n{}",
            files_title, files_table, "BUNDLE COMPLETE", summary_table
        )
    }
}

fn style(mut table: Table) -> String {
    table
        .with(Style::rounded())
        .with(Padding::new(1, 1, 0, 0))
        .with(Modify::new(Columns::new(..)).with(Alignment::left()));
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(files: usize) -> BundleReport {
        let file_details: Vec<_> = (0..files)
            .map(|i| FileReportInfo {
                path: format!("src/file_{}.rs", i),
                outcome: FileOutcome::Written {
                    lines: 10,
                    bytes: 200,
                },
            })
            .collect();

        BundleReport {
            output_file: "/work/proj/codereview/2024-01-01_0900AM_proj_v01.md".to_string(),
            log_file: Some("/work/proj/codereview/2024-01-01_0900AM_proj_v01.log".to_string()),
            duration: Duration::from_millis(12),
            total_files: files,
            files_written: files,
            files_failed: 0,
            excluded: 2,
            total_lines: files * 10,
            total_bytes: files * 200,
            file_details,
        }
    }

    #[test]
    fn test_summary_line() {
        let mut r = report(3);
        r.files_written = 2;
        r.files_failed = 1;
        assert_eq!(r.summary_line(), "Processed 2 of 3 files");
    }

    #[test]
    fn test_console_report_contents() {
        let mut r = report(2);
        r.file_details.push(FileReportInfo {
            path: "src/locked.rs".to_string(),
            outcome: FileOutcome::Failed {
                reason: "permission denied".to_string(),
            },
        });
        r.total_files = 3;
        r.files_failed = 1;

        let text = Reporter::new(ReportFormat::ConsoleTable).generate_report(&r);
        assert!(text.contains("BUNDLED FILES"));
        assert!(text.contains("src/file_1.rs"));
        assert!(text.contains("unreadable: permission denied"));
        assert!(text.contains("Processed 2 of 3 files"));
        assert!(text.contains("Unreadable Files"));
        assert!(text.contains("_proj_v01.log"));
    }

    #[test]
    fn test_long_listing_is_truncated() {
        let text = Reporter::new(ReportFormat::ConsoleTable).generate_report(&report(20));
        assert!(text.contains("first 15 of 20"));
        assert!(text.contains("src/file_14.rs"));
        assert!(!text.contains("src/file_15.rs"));
    }
}
