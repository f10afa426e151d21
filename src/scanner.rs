/*!
 * Directory and file scanning functionality
 *
 * The walk is depth-first and sorts every directory listing by file name
 * before descending, so the resulting order does not depend on how the
 * platform enumerates directories.
 */

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::FileType;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::Code2MdError;
use crate::ignore_rules::IgnoreMatcher;
use crate::run_log::RunLog;
use crate::types::{FileDescriptor, ScanResult};
use crate::utils::{extension_of, relative_display_path, to_forward_slashes};

/// A directory entry waiting to be classified
#[derive(Debug)]
struct Listed {
    name: OsString,
    path: PathBuf,
    file_type: FileType,
}

/// Pending work for the depth-first walk
enum Work {
    /// List and expand this directory
    Dir(PathBuf),
    /// Classify this entry
    Entry(Listed),
}

/// Scanner for directory contents
#[derive(Debug, Clone)]
pub struct Scanner {
    /// Project root; relative paths are computed against it
    root: PathBuf,
    /// Lowercased extensions to include
    extensions: HashSet<String>,
    /// Ignore rules applied to every entry
    matcher: IgnoreMatcher,
    /// Absolute directories that are never entered
    skip_dirs: Vec<PathBuf>,
}

impl Scanner {
    /// Create a new scanner
    pub fn new<I, S>(root: impl Into<PathBuf>, extensions: I, matcher: IgnoreMatcher) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root: root.into(),
            extensions: extensions.into_iter().map(Into::into).collect(),
            matcher,
            skip_dirs: Vec::new(),
        }
    }

    /// Never descend into `dir` (used for the output directory)
    pub fn skip_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.skip_dirs.push(dir.into());
        self
    }

    pub fn matcher(&self) -> &IgnoreMatcher {
        &self.matcher
    }

    /// Resolve an explicit selection in the order given.
    ///
    /// Selected files are taken whatever their extension; selected
    /// directories are scanned. Paths that cannot be inspected are logged
    /// and skipped.
    pub async fn collect(&self, selection: &[PathBuf], log: &mut RunLog) -> ScanResult {
        let mut result = ScanResult::default();

        for path in selection {
            match fs::metadata(path).await {
                Ok(meta) if meta.is_dir() => {
                    result.extend(self.scan(path, log).await);
                }
                Ok(meta) if meta.is_file() => {
                    result.files.push(FileDescriptor::new(path, &self.root));
                }
                Ok(_) => {
                    log.warn(format!(
                        "Skipping {}: not a regular file or directory",
                        path.display()
                    ))
                    .await;
                }
                Err(e) => {
                    log.error(format!(
                        "Error processing selected item {}: {}",
                        path.display(),
                        e
                    ))
                    .await;
                }
            }
        }

        result
    }

    /// Scan `dir` recursively and return matching files in lexicographic
    /// depth-first order.
    ///
    /// Unreadable directories are logged as warnings and treated as empty.
    /// Denylist rules apply below `dir` only, so scanning a hidden or
    /// denylisted folder on purpose still yields its files.
    pub async fn scan(&self, dir: &Path, log: &mut RunLog) -> ScanResult {
        let mut result = ScanResult::default();
        // Paths outside the project root are matched relative to the scanned folder
        let base = if dir.starts_with(&self.root) {
            self.root.clone()
        } else {
            dir.to_path_buf()
        };
        let origin_depth = dir
            .strip_prefix(&base)
            .map(|rel| rel.components().count())
            .unwrap_or(0);

        log.info(format!(
            "Scanning folder: {}",
            relative_display_path(dir, &self.root)
        ))
        .await;

        let mut stack = vec![Work::Dir(dir.to_path_buf())];

        while let Some(work) = stack.pop() {
            match work {
                Work::Dir(path) => match list_sorted(&path).await {
                    // Reverse so the smallest name is popped first
                    Ok(entries) => stack.extend(entries.into_iter().rev().map(Work::Entry)),
                    Err(e) => log.warn(e.to_string()).await,
                },
                Work::Entry(entry) => {
                    let descend = self
                        .classify(entry, &base, origin_depth, &mut result, log)
                        .await;
                    if let Some(dir) = descend {
                        stack.push(Work::Dir(dir));
                    }
                }
            }
        }

        debug!(
            files = result.files.len(),
            excluded = result.excluded.len(),
            dir = %dir.display(),
            "Scan complete"
        );

        result
    }

    /// Apply the ignore rules and extension filter to one entry. Returns the
    /// path to descend into when the entry is a directory to walk.
    async fn classify(
        &self,
        entry: Listed,
        base: &Path,
        origin_depth: usize,
        result: &mut ScanResult,
        log: &mut RunLog,
    ) -> Option<PathBuf> {
        let rel = entry
            .path
            .strip_prefix(base)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(&entry.name));

        let (is_dir, is_file) = if entry.file_type.is_symlink() {
            match fs::metadata(&entry.path).await {
                Ok(meta) if meta.is_dir() => {
                    log.info(format!(
                        "Not following directory link: {}",
                        to_forward_slashes(&rel)
                    ))
                    .await;
                    return None;
                }
                Ok(meta) => (false, meta.is_file()),
                Err(e) => {
                    log.warn(format!(
                        "Skipping broken link {}: {}",
                        to_forward_slashes(&rel),
                        e
                    ))
                    .await;
                    return None;
                }
            }
        } else {
            (entry.file_type.is_dir(), entry.file_type.is_file())
        };

        if is_dir {
            if self.skip_dirs.iter().any(|skip| skip == &entry.path)
                || self.matcher.is_excluded_below(&rel, origin_depth, true)
            {
                result.excluded.push(to_forward_slashes(&rel));
                return None;
            }
            return Some(entry.path);
        }

        if !is_file {
            return None;
        }

        if self.matcher.is_excluded_below(&rel, origin_depth, false) {
            result.excluded.push(to_forward_slashes(&rel));
            return None;
        }

        if self.extensions.contains(&extension_of(&entry.path)) {
            result.files.push(FileDescriptor::new(entry.path, &self.root));
        }

        None
    }
}

/// List a directory sorted by file name
async fn list_sorted(dir: &Path) -> Result<Vec<Listed>, Code2MdError> {
    let read_error = |source| Code2MdError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    };

    let mut reader = fs::read_dir(dir).await.map_err(read_error)?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await.map_err(read_error)? {
        let file_type = entry.file_type().await.map_err(read_error)?;
        entries.push(Listed {
            name: entry.file_name(),
            path: entry.path(),
            file_type,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
