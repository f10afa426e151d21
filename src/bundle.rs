/*!
 * One bundle run: scan, write the document, flush the run log
 */

use std::sync::Arc;
use std::time::Instant;

use indicatif::ProgressBar;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::{Code2MdError, Result};
use crate::report::{BundleReport, FileReportInfo};
use crate::run_log::RunLog;
use crate::scanner::Scanner;
use crate::types::{FileOutcome, ScanResult};
use crate::writer::MarkdownWriter;

/// Run the whole pipeline for `config`.
///
/// The run log is flushed whatever the outcome, so a failed run still
/// leaves its diagnostics behind.
pub async fn run_bundle(config: &Config, progress: Arc<ProgressBar>) -> Result<BundleReport> {
    let mut log = RunLog::new(&config.project_root, &config.project_name);

    let result = bundle(config, progress, &mut log).await;
    match &result {
        Ok(_) => {}
        Err(Code2MdError::NoMatchingFiles) => {
            log.warn("No matching files found to convert.").await
        }
        Err(e) => log.error(format!("Run failed: {}", e)).await,
    }

    let log_file = match log.flush().await {
        Ok(path) => Some(path.display().to_string()),
        Err(e) => {
            error!("Failed to write run log: {}", e);
            None
        }
    };

    result.map(|mut report| {
        report.log_file = log_file;
        report
    })
}

/// Select the files for `config`
pub async fn select_files(config: &Config, log: &mut RunLog) -> ScanResult {
    let matcher = config.matcher();
    for rejected in matcher.rejected_patterns() {
        log.warn(rejected.to_string()).await;
    }
    log.info(format!("Ignore rules: {}", matcher.describe())).await;

    let scanner = Scanner::new(&config.project_root, &config.extensions, matcher)
        .skip_dir(config.output_dir());

    if config.selection.is_empty() {
        scanner.scan(&config.project_root, log).await
    } else {
        scanner.collect(&config.selection, log).await
    }
}

async fn bundle(
    config: &Config,
    progress: Arc<ProgressBar>,
    log: &mut RunLog,
) -> Result<BundleReport> {
    let start_time = Instant::now();

    let selected = select_files(config, log).await;
    log.log_excluded(&selected.excluded).await;
    log.info(format!("Files to process: {}", selected.files.len()))
        .await;
    debug!(
        files = selected.files.len(),
        excluded = selected.excluded.len(),
        "Selection complete"
    );

    if selected.is_empty() {
        return Err(Code2MdError::NoMatchingFiles);
    }

    let writer = MarkdownWriter::new(&config.project_root, &config.project_name, progress)
        .with_languages(config.languages.clone())
        .with_fence_style(config.fence_style);
    let outcome = writer.write(&selected.files, log).await?;

    let mut total_lines = 0;
    let mut total_bytes = 0;
    for o in &outcome.outcomes {
        if let FileOutcome::Written { lines, bytes } = o {
            total_lines += lines;
            total_bytes += bytes;
        }
    }

    let file_details = selected
        .files
        .iter()
        .zip(&outcome.outcomes)
        .map(|(file, o)| FileReportInfo {
            path: file.relative.clone(),
            outcome: o.clone(),
        })
        .collect();

    Ok(BundleReport {
        output_file: outcome.output_path.display().to_string(),
        log_file: None,
        duration: start_time.elapsed(),
        total_files: selected.files.len(),
        files_written: outcome.written(),
        files_failed: outcome.failed(),
        excluded: selected.excluded.len(),
        total_lines,
        total_bytes,
        file_details,
    })
}
