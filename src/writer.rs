/*!
 * Markdown writer implementation for code2md
 *
 * The document is streamed: the header and table of contents first, then
 * one section per file in selection order. Every write is awaited, so a
 * sink whose buffer is full suspends the writer until it drains.
 *
 * Known limitation: with [`FenceStyle::Plain`] content is written verbatim
 * and a file containing ``` ends its code block early. Use
 * [`FenceStyle::Adaptive`] to pick a fence longer than any backtick run in
 * the content.
 */

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use indicatif::ProgressBar;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::error::{Code2MdError, Result};
use crate::namer;
use crate::run_log::RunLog;
use crate::types::{FenceStyle, FileDescriptor, FileOutcome};
use crate::utils::{anchor, document_title, relative_display_path, LANGUAGE_MAP};

/// Files processed between progress updates
pub const BATCH_SIZE: usize = 10;

/// Result of writing a document
#[derive(Debug, Clone)]
pub struct AssembleOutcome {
    /// Path of the finished document
    pub output_path: PathBuf,
    /// One outcome per input descriptor, in the same order
    pub outcomes: Vec<FileOutcome>,
}

impl AssembleOutcome {
    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Written { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.written()
    }
}

/// Markdown writer for a set of files
pub struct MarkdownWriter {
    /// Root the output directory is created under
    project_root: PathBuf,
    /// Name used in the document title and file name
    project_name: String,
    /// Extension to code fence language
    languages: HashMap<String, String>,
    /// Fence selection
    fence_style: FenceStyle,
    /// Progress bar advanced once per batch
    progress: Arc<ProgressBar>,
}

impl MarkdownWriter {
    /// Create a new Markdown writer with the default language map
    pub fn new(
        project_root: impl Into<PathBuf>,
        project_name: impl Into<String>,
        progress: Arc<ProgressBar>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            project_name: project_name.into(),
            languages: LANGUAGE_MAP
                .iter()
                .map(|(ext, lang)| (ext.to_string(), lang.to_string()))
                .collect(),
            fence_style: FenceStyle::default(),
            progress,
        }
    }

    /// Replace the extension to language map
    pub fn with_languages(mut self, languages: HashMap<String, String>) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_fence_style(mut self, fence_style: FenceStyle) -> Self {
        self.fence_style = fence_style;
        self
    }

    /// Fence language for an extension, if known
    pub fn language_for(&self, extension: &str) -> Option<&str> {
        self.languages
            .get(&extension.to_lowercase())
            .map(String::as_str)
    }

    /// Write `files` into a newly reserved document and return its path.
    ///
    /// Unreadable files are logged and noted in the document; the run goes
    /// on. Failing to write or close the document is fatal.
    pub async fn write(
        &self,
        files: &[FileDescriptor],
        log: &mut RunLog,
    ) -> Result<AssembleOutcome> {
        if files.is_empty() {
            return Err(Code2MdError::NoMatchingFiles);
        }

        let now = Local::now().naive_local();
        let output_path =
            namer::next_output_path(&self.project_root, &self.project_name, &now, "md").await?;
        let write_error = |e: io::Error| Code2MdError::write(&output_path, e);

        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&output_path)
            .await
            .map_err(write_error)?;
        let mut sink = BufWriter::new(file);

        let outcomes = self
            .write_document(&mut sink, files, log)
            .await
            .map_err(write_error)?;

        // Flush the buffer, then wait until the bytes are on disk
        sink.shutdown().await.map_err(write_error)?;
        sink.into_inner().sync_all().await.map_err(write_error)?;

        log.info(format!(
            "Markdown generated at: {}",
            relative_display_path(&output_path, &self.project_root)
        ))
        .await;

        Ok(AssembleOutcome {
            output_path,
            outcomes,
        })
    }

    /// Stream the whole document into `sink`.
    ///
    /// Returns one outcome per descriptor. Only sink failures are errors.
    pub async fn write_document<W>(
        &self,
        sink: &mut W,
        files: &[FileDescriptor],
        log: &mut RunLog,
    ) -> io::Result<Vec<FileOutcome>>
    where
        W: AsyncWrite + Unpin,
    {
        let total = files.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut processed = 0;

        self.progress.set_length(total as u64);
        sink.write_all(self.header(files).as_bytes()).await?;

        for batch in files.chunks(BATCH_SIZE) {
            for file in batch {
                let outcome = self.write_file(sink, file, log).await?;
                outcomes.push(outcome);
            }

            processed += batch.len();
            self.progress.inc(batch.len() as u64);
            self.progress
                .set_message(format!("Processed {}/{} files", processed, total));
        }

        sink.flush().await?;
        Ok(outcomes)
    }

    /// Document title and table of contents
    pub fn header(&self, files: &[FileDescriptor]) -> String {
        let toc = files
            .iter()
            .map(|f| format!("- [{}](#file-{})", f.relative, anchor(&f.relative)))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "# Project: {}\n\n## Table of Contents\n\n{}\n\n",
            document_title(&self.project_name),
            toc
        )
    }

    async fn write_file<W>(
        &self,
        sink: &mut W,
        file: &FileDescriptor,
        log: &mut RunLog,
    ) -> io::Result<FileOutcome>
    where
        W: AsyncWrite + Unpin,
    {
        let heading = format!(
            "## File: {} <a id=\"file-{}\"></a>\n\n",
            file.relative,
            anchor(&file.relative)
        );

        let bytes = match fs::read(&file.path).await {
            Ok(bytes) => bytes,
            Err(source) => {
                let reason = source.to_string();
                let err = Code2MdError::FileRead {
                    path: file.path.clone(),
                    source,
                };
                log.error(err.to_string()).await;

                let note = format!("> **Unable to read file:** {}\n\n", reason);
                sink.write_all(heading.as_bytes()).await?;
                sink.write_all(note.as_bytes()).await?;
                return Ok(FileOutcome::Failed { reason });
            }
        };

        let content = String::from_utf8_lossy(&bytes);
        let fence = self.fence_for(&content);
        let language = self.language_for(&file.extension).unwrap_or("");

        sink.write_all(heading.as_bytes()).await?;
        sink.write_all(format!("{}{}\n", fence, language).as_bytes()).await?;
        sink.write_all(content.as_bytes()).await?;
        sink.write_all(format!("\n{}\n\n", fence).as_bytes()).await?;

        log.info(format!("Processed: {}", file.relative)).await;

        Ok(FileOutcome::Written {
            lines: content.lines().count(),
            bytes: bytes.len(),
        })
    }

    fn fence_for(&self, content: &str) -> String {
        match self.fence_style {
            FenceStyle::Plain => "```".to_string(),
            FenceStyle::Adaptive => "`".repeat(longest_backtick_run(content).max(2) + 1),
        }
    }
}

fn longest_backtick_run(content: &str) -> usize {
    content
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0)
}
