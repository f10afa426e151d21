/*!
 * Run log: buffered diagnostic records persisted next to the document
 *
 * Every record is mirrored to `tracing` as soon as it is made, so a
 * subscriber sees the run live. Persistence is batched: records collect in
 * memory and are appended to a dated `.log` file on [`RunLog::flush`], or
 * automatically once [`FLUSH_THRESHOLD`] records are pending.
 */

use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use crate::error::{Code2MdError, Result};
use crate::namer;
use crate::types::{LogRecord, Severity};

/// Pending records that trigger an automatic flush
pub const FLUSH_THRESHOLD: usize = 100;

/// Buffered log for a single run
#[derive(Debug)]
pub struct RunLog {
    base_dir: PathBuf,
    project_name: String,
    records: Vec<LogRecord>,
    path: Option<PathBuf>,
    banner_written: bool,
    threshold: usize,
}

impl RunLog {
    /// Create a log whose file will live under `<base_dir>/codereview`
    pub fn new(base_dir: impl Into<PathBuf>, project_name: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            project_name: project_name.into(),
            records: Vec::new(),
            path: None,
            banner_written: false,
            threshold: FLUSH_THRESHOLD,
        }
    }

    /// Override the automatic flush threshold
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold.max(1);
        self
    }

    /// Records not yet persisted
    pub fn pending(&self) -> &[LogRecord] {
        &self.records
    }

    /// Log file path, once the first flush has reserved it
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append a record, mirror it to tracing and flush when the buffer is full.
    ///
    /// A failed automatic flush is reported through tracing; the records stay
    /// buffered for the next flush.
    pub async fn record(&mut self, severity: Severity, message: impl Into<String>) {
        let record = LogRecord::new(severity, message);

        match record.severity {
            Severity::Info => info!(target: "code2md::run", "{}", record.message),
            Severity::Warn => warn!(target: "code2md::run", "{}", record.message),
            Severity::Error => error!(target: "code2md::run", "{}", record.message),
        }

        self.records.push(record);

        if self.records.len() >= self.threshold {
            if let Err(e) = self.flush().await {
                error!("Failed to auto-flush run log: {}", e);
            }
        }
    }

    pub async fn info(&mut self, message: impl Into<String>) {
        self.record(Severity::Info, message).await
    }

    pub async fn warn(&mut self, message: impl Into<String>) {
        self.record(Severity::Warn, message).await
    }

    pub async fn error(&mut self, message: impl Into<String>) {
        self.record(Severity::Error, message).await
    }

    /// Record the paths skipped by the ignore rules
    pub async fn log_excluded(&mut self, excluded: &[String]) {
        if excluded.is_empty() {
            self.info("No files or folders were ignored based on the ignore settings.")
                .await;
            return;
        }

        let listing = excluded
            .iter()
            .map(|p| format!("- {}", p))
            .collect::<Vec<_>>()
            .join("\n");
        self.info(format!(
            "Ignored files/folders based on ignore settings:\n{}",
            listing
        ))
        .await;
    }

    /// Persist pending records and clear the buffer.
    ///
    /// The first flush reserves the log path; the start banner goes out
    /// with the first successful write. On failure nothing is cleared and
    /// the reserved path is kept for the retry.
    pub async fn flush(&mut self) -> Result<PathBuf> {
        let path = self.reserve().await?;

        let mut text = String::new();
        if !self.banner_written {
            text.push_str(&format!(
                "[code2md] Log Start - {}\n\n",
                Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
            ));
        }
        for record in &self.records {
            text.push_str(&record.to_line());
            text.push('\n');
        }

        if text.is_empty() {
            return Ok(path);
        }

        append(&path, &text).await?;
        self.banner_written = true;
        self.records.clear();

        Ok(path)
    }

    async fn reserve(&mut self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }

        let now = Local::now().naive_local();
        let path =
            namer::next_output_path(&self.base_dir, &self.project_name, &now, "log").await?;
        self.path = Some(path.clone());
        Ok(path)
    }
}

async fn append(path: &Path, text: &str) -> Result<()> {
    let write = async {
        let mut file = OpenOptions::new().append(true).create(true).open(path).await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await
    };

    write.await.map_err(|e| Code2MdError::write(path, e))
}
